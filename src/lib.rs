//! Daily task journal: one markdown file per day, nested tasks encoded by
//! indentation, a single global timer and a point score for estimation.

pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod session;

pub use session::Journal;
