use ndarray::{Array, ArrayD, IxDyn};
use rayon::prelude::*;

use super::util::{gaussian_kernel, min_max};

/// Separable Gaussian blur over every axis with clamped borders.
/// `sigma <= 0` returns the input unchanged.
pub fn gaussian_smooth(source: &ArrayD<f32>, sigma: f32) -> ArrayD<f32> {
    if sigma <= f32::EPSILON {
        return source.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let shape = source.shape().to_vec();
    let strides = row_major_strides(&shape);
    let mut current = source.iter().copied().collect::<Vec<_>>();

    for axis in 0..shape.len() {
        if shape[axis] <= 1 {
            continue;
        }
        current = blur_axis(&current, &shape, &strides, axis, &kernel, radius);
    }

    Array::from_shape_vec(IxDyn(&shape), current).expect("shape is unchanged and valid")
}

/// Value inversion around the data range, `v ↦ min + max − v`; turns the
/// bright cores of a region into the basins the watershed floods from.
pub fn invert(source: &ArrayD<f32>) -> ArrayD<f32> {
    let (min, max) = min_max(source);
    source.mapv(|value| min + max - value)
}

fn blur_axis(
    input: &[f32],
    shape: &[usize],
    strides: &[usize],
    axis: usize,
    kernel: &[f32],
    radius: isize,
) -> Vec<f32> {
    let axis_len = shape[axis];
    let axis_stride = strides[axis];
    let lane_count = input.len() / axis_len;
    let lane_bases = (0..lane_count)
        .map(|lane| lane_base_offset(lane, axis, shape, strides))
        .collect::<Vec<_>>();

    let lane_results = lane_bases
        .par_iter()
        .map(|base| {
            let mut lane_output = vec![0.0_f32; axis_len];
            for (coordinate, output) in lane_output.iter_mut().enumerate() {
                let mut sum = 0.0_f32;
                for (kernel_index, weight) in kernel.iter().enumerate() {
                    let offset = kernel_index as isize - radius;
                    let candidate = coordinate as isize + offset;
                    let clamped = candidate.clamp(0, axis_len as isize - 1) as usize;
                    sum += input[*base + clamped * axis_stride] * *weight;
                }
                *output = sum;
            }
            lane_output
        })
        .collect::<Vec<_>>();

    let mut output = vec![0.0_f32; input.len()];
    for (lane, lane_output) in lane_results.into_iter().enumerate() {
        let base = lane_bases[lane];
        for (coordinate, value) in lane_output.into_iter().enumerate() {
            output[base + coordinate * axis_stride] = value;
        }
    }

    output
}

fn lane_base_offset(lane_index: usize, axis: usize, shape: &[usize], strides: &[usize]) -> usize {
    let mut remainder = lane_index;
    let mut base = 0_usize;
    for dimension in 0..shape.len() {
        if dimension == axis {
            continue;
        }
        let size = shape[dimension];
        base += (remainder % size) * strides[dimension];
        remainder /= size;
    }
    base
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1_usize; shape.len()];
    for index in (0..shape.len().saturating_sub(1)).rev() {
        strides[index] = strides[index + 1] * shape[index + 1];
    }
    strides
}
