pub mod config;
pub mod day;
pub mod score;
pub mod task;

pub use config::*;
pub use day::*;
pub use score::*;
pub use task::*;
