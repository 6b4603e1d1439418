pub mod measurement;
pub mod point;
pub mod row;
pub mod tidy_datetime;
pub mod value;

pub use measurement::{LastEntry, Measurement, TimeRange};
pub use point::Point;
pub use row::{Row, TIME_COLUMN};
pub use tidy_datetime::{TidyDateTime, TidyDateTimeExt};
pub use value::Value;
