//! Input schema for motor assessment sessions
//!
//! Tapping and wearable records are read as a JSON array or NDJSON, one
//! record per subject. Structural validation happens here; numerical
//! problems are left to the feature derivers.

mod reader;
mod record;
mod timeslots;

pub use reader::*;
pub use record::*;
pub use timeslots::*;
