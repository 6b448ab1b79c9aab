pub mod date_nav;
pub mod hierarchy;
pub mod scoring;
pub mod sorter;
pub mod task_ops;
pub mod time_tracker;

pub use scoring::ScoringSystem;
pub use task_ops::TaskError;
pub use time_tracker::TimeTracker;
