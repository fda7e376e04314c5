pub mod aliases;
pub mod config;
pub mod error;
pub mod event;
pub mod state;
pub mod traits;
pub mod trip;
pub mod types;

pub use aliases::DestinationAliases;
pub use config::AppConfig;
pub use error::{Result, WayfarerError};
pub use event::{EventBus, WorkflowEvent};
pub use state::{StateUpdate, WorkflowState, MAX_RETRIES};
pub use trip::*;
pub use types::*;
