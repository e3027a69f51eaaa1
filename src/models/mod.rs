pub mod appointment;
pub mod catalog;
pub mod conversation;
pub mod slot;

pub use appointment::Appointment;
pub use catalog::{Catalog, Master, Rating, Salon, Service};
pub use conversation::ConversationState;
pub use slot::{SlotGenerator, SlotParseError};
