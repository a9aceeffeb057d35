mod builder;
mod channel;


pub use builder::LutBuilder;
pub use channel::{LutChannel, Rgba};
