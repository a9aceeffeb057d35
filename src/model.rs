mod error;
mod label;
mod mapping;
mod region;


pub use error::{ModelError, Result};
pub use label::{Label, LabelComparator, Tag, natural_order};
pub use mapping::LabelMapping;
pub use region::Region;
