mod engine;
mod error;

#[cfg(test)]
mod tests;

pub use engine::{TagChangedEvent, TagEngine, TagListener};
pub use error::{Result, TagError};
