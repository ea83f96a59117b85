//! Typed payloads of the keyturner commands.

mod authorization;
mod config;
mod keyturner;
mod log_entry;
mod requests;
mod status;

pub use authorization::{AuthorizationData, AuthorizationIdConfirmation, AuthorizationIdResponse};
pub use config::Config;
pub use keyturner::KeyturnerState;
pub use log_entry::{LogEntry, LogEntryDetails};
pub use requests::{ConfigRequest, LockActionRequest, LogEntriesRequest};
pub use status::ErrorReport;
