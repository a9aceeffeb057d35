use ndarray::{ArrayD, IxDyn};

use super::Label;

/// The full set of positions occupied by one label, with its bounding box
/// and a zero-based local frame used for cropping during a split.
#[derive(Debug, Clone)]
pub struct Region {
    label: Label,
    positions: Vec<Vec<usize>>,
    min: Vec<usize>,
    max: Vec<usize>,
}

impl Region {
    pub(crate) fn new(label: Label, positions: Vec<Vec<usize>>) -> Self {
        debug_assert!(!positions.is_empty());
        let ndim = positions[0].len();
        let mut min = positions[0].clone();
        let mut max = positions[0].clone();
        for position in &positions[1..] {
            for axis in 0..ndim {
                min[axis] = min[axis].min(position[axis]);
                max[axis] = max[axis].max(position[axis]);
            }
        }
        Self {
            label,
            positions,
            min,
            max,
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn positions(&self) -> &[Vec<usize>] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Lower corner of the bounding box, inclusive.
    pub fn min(&self) -> &[usize] {
        &self.min
    }

    /// Upper corner of the bounding box, inclusive.
    pub fn max(&self) -> &[usize] {
        &self.max
    }

    pub fn extent(&self) -> Vec<usize> {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(lo, hi)| hi - lo + 1)
            .collect()
    }

    /// Translates a global position into the zero-based local frame.
    pub fn to_local(&self, position: &[usize]) -> Vec<usize> {
        position
            .iter()
            .zip(&self.min)
            .map(|(coordinate, offset)| coordinate - offset)
            .collect()
    }

    /// `true` where the region occupies a voxel, in the zero-based frame.
    pub fn local_mask(&self) -> ArrayD<bool> {
        let mut mask = ArrayD::from_elem(IxDyn(&self.extent()), false);
        for position in &self.positions {
            let local = self.to_local(position);
            mask[IxDyn(&local)] = true;
        }
        mask
    }
}
