use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("fragment id {fragment} out of range for {num_sets} label sets")]
    FragmentOutOfRange { fragment: u32, num_sets: usize },

    #[error("fragment 0 must be the empty label set")]
    NonEmptyBaseFragment,

    #[error("position {position:?} is outside the labeled domain")]
    PositionOutOfBounds { position: Vec<usize> },
}
