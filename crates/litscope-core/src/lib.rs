pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, UnmappedPolicy};
pub use error::{ExitCode, LitscopeError, Result};
pub use models::*;

pub use storage::{CoalescedRow, write_atomic, write_coalesced};
