pub mod day_parser;
pub mod day_serializer;
pub mod duration;

pub use day_parser::{parse_day, parse_line};
pub use day_serializer::{serialize_day, serialize_entries};
pub use duration::{format_duration, parse_duration, parse_duration_delta, parse_stored_duration};
