//! Error types for the session host.

use pmm_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The submitted configuration was refused; the session is unchanged.
    #[error("Configuration rejected: {0}")]
    Config(#[from] ConfigError),

    /// The heartbeat task has stopped and no longer accepts commands.
    #[error("Session heartbeat has shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SessionError>;
