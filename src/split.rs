mod error;
mod filters;
mod minima;
mod splitter;
mod util;
mod watershed;


pub use error::{Result, SplitError};
pub use filters::{gaussian_smooth, invert};
pub use minima::local_minima;
pub use splitter::{
    CancelToken, ScalarSource, SplitConfig, SplitOutcome, SplitPlan, SplitStage, extract_region,
    plan_split, split_label,
};
pub use watershed::watershed;
