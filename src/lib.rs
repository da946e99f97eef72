//! Host utilities: a named configuration store and an async call-loop guard.
//!
//! The binary entry point is src/main.rs.

pub mod access;
pub mod config_store;
pub mod error;
pub mod guard;
pub mod logger;
pub mod settings;

pub use config_store::{ConfigStore, Properties, DEFAULT_NAMESPACE};
pub use error::AppError;
pub use guard::{CallContext, CallGuard, FailurePolicy, GuardedFn};
