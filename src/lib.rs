pub mod display;
pub mod model;
pub mod runtime;
pub mod select;
pub mod split;
pub mod tagging;
