use thiserror::Error;

use crate::model::{Label, ModelError};

pub type Result<T> = std::result::Result<T, SplitError>;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("label {0:?} is not present in the mapping")]
    LabelNotFound(Label),

    #[error("no scalar data available for the region of label {0:?}")]
    MissingData(Label),

    #[error("scalar crop shape {actual:?} does not match the region extent {expected:?}")]
    CropShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("no seed minima found; retry with a different smoothing sigma")]
    NoSeeds,

    #[error("watershed left {unlabeled} masked voxel(s) unlabeled")]
    Incomplete { unlabeled: usize },

    #[error("split cancelled")]
    Cancelled,

    #[error("mapping error during commit: {0}")]
    Model(#[from] ModelError),
}
