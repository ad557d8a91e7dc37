pub mod clock;
pub mod serde;
pub mod telemetry;
pub mod timestamp;

pub use self::clock::*;
pub use self::serde::*;
pub use self::telemetry::*;
pub use self::timestamp::{CreatedAt, ParsedTimestamp};
