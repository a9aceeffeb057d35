use std::f32::consts::PI;

use ndarray::ArrayD;

pub(crate) fn min_max(values: &ArrayD<f32>) -> (f32, f32) {
    let mut iter = values.iter().copied();
    let first = iter.next().unwrap_or(0.0);
    let mut min = first;
    let mut max = first;
    for value in iter {
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}

pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let mut kernel = Vec::with_capacity((radius * 2 + 1) as usize);
    let mut sum = 0.0_f32;
    for offset in -radius..=radius {
        let distance = offset as f32;
        let value =
            (-(distance * distance) / (2.0 * sigma * sigma)).exp() / (sigma * (2.0 * PI).sqrt());
        kernel.push(value);
        sum += value;
    }
    kernel
        .iter_mut()
        .for_each(|value| *value /= sum.max(f32::EPSILON));
    kernel
}

/// Every offset of the diagonal-inclusive unit-radius neighborhood, origin
/// excluded, in row-major scan order.
pub(crate) fn neighborhood_offsets(rank: usize, radius: usize) -> Vec<Vec<isize>> {
    let radius = radius as isize;
    let mut offsets = Vec::new();
    let mut current = vec![-radius; rank];
    loop {
        if current.iter().any(|offset| *offset != 0) {
            offsets.push(current.clone());
        }
        let mut axis = rank;
        loop {
            if axis == 0 {
                return offsets;
            }
            axis -= 1;
            if current[axis] < radius {
                current[axis] += 1;
                break;
            }
            current[axis] = -radius;
        }
    }
}
