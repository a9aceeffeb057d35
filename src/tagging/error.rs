use thiserror::Error;

pub type Result<T> = std::result::Result<T, TagError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("resume_listeners called without a matching pause_listeners")]
    UnbalancedResume,
}
