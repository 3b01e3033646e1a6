pub mod error;
pub mod parse;
pub mod raw;

pub use error::StateError;
pub use parse::{parse_state, ParsedInstance, ParsedState};
pub use raw::{RawResource, RawResourceInstance, RawState};
