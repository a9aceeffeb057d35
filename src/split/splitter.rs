use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use ndarray::{ArrayD, IxDyn, Slice};

use crate::model::{Label, LabelMapping, Region};

use super::{Result, SplitError, filters, minima};

/// Supplies crops of the underlying intensity image. `None` means the
/// requested interval is not available.
pub trait ScalarSource: Send + Sync {
    /// Crop over the inclusive interval `min..=max`, in global coordinates.
    fn scalar_region(&self, min: &[usize], max: &[usize]) -> Option<ArrayD<f32>>;
}

impl ScalarSource for ArrayD<f32> {
    fn scalar_region(&self, min: &[usize], max: &[usize]) -> Option<ArrayD<f32>> {
        if min.len() != self.ndim() || max.len() != self.ndim() {
            return None;
        }
        if min.iter().zip(max).any(|(lo, hi)| lo > hi) {
            return None;
        }
        if max.iter().zip(self.shape()).any(|(hi, size)| hi >= size) {
            return None;
        }
        let view = self.slice_each_axis(|descr| {
            let axis = descr.axis.index();
            Slice::from(min[axis]..=max[axis])
        });
        Some(view.to_owned())
    }
}

/// Cooperative cancellation for the watershed stage, the only potentially
/// long-running step of a split.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SplitConfig {
    /// Standard deviation of the smoothing applied before seeding.
    pub sigma: f32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

/// Stages of one split; terminal on commit or on any stage's failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStage {
    Idle,
    RegionExtracted,
    SeedsComputed,
    Watershedded,
    Committed,
}

/// Everything computed by the read-only stages of a split, ready to be
/// committed. Watershed ids are local; the final label ids are minted at
/// commit time from the then-current maximum, so a plan stays
/// collision-free even when other splits commit in between.
#[derive(Debug, Clone)]
pub struct SplitPlan {
    original: Label,
    assignments: Vec<(Vec<usize>, i32)>,
    seed_count: usize,
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub new_labels: BTreeSet<Label>,
    pub seed_count: usize,
}

/// Stage 1: the region currently holding `label`.
pub fn extract_region(mapping: &LabelMapping, label: Label) -> Result<Region> {
    let region = mapping
        .region_of(label)
        .ok_or(SplitError::LabelNotFound(label))?;
    debug!(
        "split of {:?}: {:?}, {} voxel(s)",
        label,
        SplitStage::RegionExtracted,
        region.len()
    );
    Ok(region)
}

/// Stages 2 and 3: crop, smooth, invert, seed and flood, entirely on
/// private copies. Does not touch the mapping.
pub fn plan_split(
    region: &Region,
    data: &dyn ScalarSource,
    config: SplitConfig,
    cancel: &CancelToken,
) -> Result<SplitPlan> {
    let label = region.label();
    let mask = region.local_mask();
    let crop = data
        .scalar_region(region.min(), region.max())
        .ok_or(SplitError::MissingData(label))?;
    if crop.shape() != mask.shape() {
        return Err(SplitError::CropShapeMismatch {
            expected: mask.shape().to_vec(),
            actual: crop.shape().to_vec(),
        });
    }

    let relief = filters::invert(&filters::gaussian_smooth(&crop, config.sigma));
    let seeds = minima::local_minima(&relief, &mask);
    if seeds.is_empty() {
        return Err(SplitError::NoSeeds);
    }
    debug!(
        "split of {:?}: {:?}, {} seed(s)",
        label,
        SplitStage::SeedsComputed,
        seeds.len()
    );

    let regions = super::watershed::watershed(&relief, &seeds, &mask, cancel)?;
    debug!("split of {:?}: {:?}", label, SplitStage::Watershedded);

    let assignments = region
        .positions()
        .iter()
        .map(|position| {
            let local = region.to_local(position);
            (position.clone(), regions[IxDyn(&local)])
        })
        .collect();
    Ok(SplitPlan {
        original: label,
        assignments,
        seed_count: seeds.len(),
    })
}

impl SplitPlan {
    pub fn original(&self) -> Label {
        self.original
    }

    pub fn seed_count(&self) -> usize {
        self.seed_count
    }

    /// Stage 4: mints the new label ids past the current maximum and
    /// applies the whole split as one atomic mapping mutation. Fails
    /// without mutating when the original label vanished in the meantime.
    pub fn commit(&self, mapping: &mut LabelMapping) -> Result<SplitOutcome> {
        if !mapping.labels().contains(&self.original) {
            return Err(SplitError::LabelNotFound(self.original));
        }
        let offset = mapping.max_label_id().map_or(0, |id| id + 1);
        let assignments: Vec<(Vec<usize>, Label)> = self
            .assignments
            .iter()
            .map(|(position, id)| (position.clone(), Label::new(offset + *id as u64)))
            .collect();
        mapping.commit_split(self.original, &assignments)?;
        let new_labels: BTreeSet<Label> = assignments.iter().map(|(_, label)| *label).collect();
        debug!(
            "split of {:?}: {:?}, {} new label(s)",
            self.original,
            SplitStage::Committed,
            new_labels.len()
        );
        Ok(SplitOutcome {
            new_labels,
            seed_count: self.seed_count,
        })
    }
}

/// Runs all four stages back to back on one mapping.
pub fn split_label(
    mapping: &mut LabelMapping,
    data: &dyn ScalarSource,
    label: Label,
    config: SplitConfig,
    cancel: &CancelToken,
) -> Result<SplitOutcome> {
    let region = extract_region(mapping, label)?;
    let split_plan = plan_split(&region, data, config, cancel)?;
    split_plan.commit(mapping)
}
