use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of one segmented object. Labels minted by a split are offset
/// past the current maximum id, so they can never collide with existing ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Label(u64);

impl Label {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Semantic/UI state attached to a label. Tags carry no payload; meaning
/// (such as a display color) is attached externally.
///
/// The derived order, built-ins first and custom ids ascending, is the
/// canonical compositing order used by the LUT builder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tag {
    Selected,
    MouseOver,
    Custom(u32),
}

/// Total order used by the selection navigator to pick "first", "next" and
/// "previous" among overlapping labels.
pub type LabelComparator = Arc<dyn Fn(&Label, &Label) -> Ordering + Send + Sync>;

/// The default comparator: ascending numeric label id.
pub fn natural_order() -> LabelComparator {
    Arc::new(|left, right| left.id().cmp(&right.id()))
}
