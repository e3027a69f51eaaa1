// Библиотечная часть бинарника, чтобы интеграционные тесты видели ядро.
pub mod bot_state;
pub mod broadcaster;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod machine;
pub mod models;
pub mod store;
pub mod summary;
pub mod texts;
pub mod transport;

pub use bot_state::BotState;
pub use broadcaster::PinnedSummaryBroadcaster;
pub use machine::ConversationStateMachine;
