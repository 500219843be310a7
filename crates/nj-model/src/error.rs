use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("job command is empty")]
    EmptyCommand,
    #[error("invalid failure policy: {0} (expected: abort|ignore)")]
    InvalidPolicy(String),
}
