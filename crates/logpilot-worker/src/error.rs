use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("`{0}` is not a logpilot dashboard URL (expected http://host:port?token)")]
    InvalidUrl(String),
}
