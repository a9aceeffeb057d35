use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ndarray::{ArrayD, IxDyn};

use super::util::neighborhood_offsets;
use super::{CancelToken, Result, SplitError};

/// Mask-constrained watershed flood. Seeds are numbered by slice position;
/// the flood expands through the full diagonal-inclusive neighborhood,
/// lowest front first, with insertion order as the deterministic tie-break.
///
/// Every masked voxel must end up labeled; masked areas unreachable from
/// any seed are reported as [`SplitError::Incomplete`].
pub fn watershed(
    input: &ArrayD<f32>,
    seeds: &[Vec<usize>],
    mask: &ArrayD<bool>,
    cancel: &CancelToken,
) -> Result<ArrayD<i32>> {
    let shape = input.shape().to_vec();
    let offsets = neighborhood_offsets(shape.len(), 1);
    let mut regions = ArrayD::from_elem(IxDyn(&shape), -1_i32);
    let mut heap = BinaryHeap::new();
    let mut order = 0_u64;

    for (id, seed) in seeds.iter().enumerate() {
        regions[IxDyn(seed)] = id as i32;
        heap.push(Reverse(FloodFront {
            height: input[IxDyn(seed)],
            order,
            label: id as i32,
            position: seed.clone(),
        }));
        order += 1;
    }

    while let Some(Reverse(front)) = heap.pop() {
        if cancel.is_cancelled() {
            return Err(SplitError::Cancelled);
        }
        for offset in &offsets {
            let mut neighbor = Vec::with_capacity(front.position.len());
            let mut out_of_bounds = false;
            for (axis, delta) in offset.iter().enumerate() {
                let candidate = front.position[axis] as isize + delta;
                if candidate < 0 || candidate >= shape[axis] as isize {
                    out_of_bounds = true;
                    break;
                }
                neighbor.push(candidate as usize);
            }
            if out_of_bounds {
                continue;
            }
            let index = IxDyn(&neighbor);
            if !mask[index.clone()] || regions[index.clone()] != -1 {
                continue;
            }
            regions[index.clone()] = front.label;
            heap.push(Reverse(FloodFront {
                height: input[index],
                order,
                label: front.label,
                position: neighbor,
            }));
            order += 1;
        }
    }

    let unlabeled = mask
        .iter()
        .zip(regions.iter())
        .filter(|(masked, region)| **masked && **region == -1)
        .count();
    if unlabeled > 0 {
        return Err(SplitError::Incomplete { unlabeled });
    }
    Ok(regions)
}

struct FloodFront {
    height: f32,
    order: u64,
    label: i32,
    position: Vec<usize>,
}

impl PartialEq for FloodFront {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodFront {}

impl PartialOrd for FloodFront {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodFront {
    fn cmp(&self, other: &Self) -> Ordering {
        self.height
            .total_cmp(&other.height)
            .then_with(|| self.order.cmp(&other.order))
    }
}
