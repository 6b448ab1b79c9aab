pub mod config_io;
pub mod journal_io;
pub mod recovery;
pub mod score_store;
pub mod timer_state;

pub use journal_io::{JournalError, JournalStore};
