pub mod constants;
pub mod error;
pub mod event;
pub mod stage;
pub mod types;

pub use constants::*;
pub use error::EngineError;
pub use event::EngineEvent;
pub use stage::{stage_for_timestamp, validate_neighbours, validate_schedule, Stage};
pub use types::*;
