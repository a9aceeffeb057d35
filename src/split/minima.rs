use ndarray::{ArrayD, IxDyn};

use super::util::neighborhood_offsets;

/// Strict local minima of `source` restricted to `mask`, over the full
/// diagonal-inclusive unit neighborhood. The search domain is eroded by one
/// voxel per axis, so border cells are never candidates, and a candidate
/// with any equal neighbor is disqualified. Returned in scan order, which
/// doubles as the seed numbering.
pub fn local_minima(source: &ArrayD<f32>, mask: &ArrayD<bool>) -> Vec<Vec<usize>> {
    let shape = source.shape();
    let ndim = shape.len();
    if ndim == 0 || shape.iter().any(|size| *size < 3) {
        // no 1-voxel-eroded interior on some axis
        return Vec::new();
    }
    let offsets = neighborhood_offsets(ndim, 1);
    let mut seeds = Vec::new();
    let mut position: Vec<usize> = vec![1; ndim];
    loop {
        if mask[IxDyn(&position)] {
            let center = source[IxDyn(&position)];
            let is_minimum = offsets.iter().all(|offset| {
                let neighbor: Vec<usize> = position
                    .iter()
                    .zip(offset)
                    .map(|(coordinate, delta)| (*coordinate as isize + delta) as usize)
                    .collect();
                center < source[IxDyn(&neighbor)]
            });
            if is_minimum {
                seeds.push(position.clone());
            }
        }
        let mut axis = ndim;
        loop {
            if axis == 0 {
                return seeds;
            }
            axis -= 1;
            if position[axis] + 2 < shape[axis] {
                position[axis] += 1;
                break;
            }
            position[axis] = 1;
        }
    }
}
