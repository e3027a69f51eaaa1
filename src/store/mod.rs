pub mod appointments;
pub mod pins;

pub use appointments::AppointmentStore;
pub use pins::{PinKey, PinRecord, PinRegistry, SqlitePinRegistry};
