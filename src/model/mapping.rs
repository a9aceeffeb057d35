use std::collections::{BTreeSet, HashMap};

use ndarray::{ArrayD, Dimension, IxDyn};

use super::{Label, ModelError, Region, Result};

/// Index space of the labeling: an index image of fragment ids plus one
/// label set per distinct fragment. Positions sharing an identical label
/// set share a fragment, which is what keeps the LUT small for images with
/// many pixels but few labels.
///
/// The mapping is created once per editing session from an external
/// segmentation and mutated only by split commits and deletes.
#[derive(Debug, Clone)]
pub struct LabelMapping {
    index_img: ArrayD<u32>,
    fragments: Vec<BTreeSet<Label>>,
    identities: HashMap<BTreeSet<Label>, u32>,
}

impl LabelMapping {
    /// An all-background mapping over `shape`; fragment 0 is the empty set.
    pub fn empty(shape: &[usize]) -> Self {
        let mut identities = HashMap::new();
        identities.insert(BTreeSet::new(), 0);
        Self {
            index_img: ArrayD::zeros(IxDyn(shape)),
            fragments: vec![BTreeSet::new()],
            identities,
        }
    }

    /// Builds a mapping from a plain segmentation image: value 0 is
    /// background, every other value a singleton label.
    pub fn from_index_image(segmentation: &ArrayD<u32>) -> Self {
        let mut mapping = Self::empty(segmentation.shape());
        for (index, value) in segmentation.indexed_iter() {
            if *value == 0 {
                continue;
            }
            let set = BTreeSet::from([Label::new(u64::from(*value))]);
            let fragment = mapping.intern(set);
            mapping.index_img[index] = fragment;
        }
        mapping
    }

    /// Builds a mapping from an explicit fragment image and label sets.
    /// Fragment 0 must be the empty set and every image value must name an
    /// existing fragment.
    pub fn from_fragments(
        index_img: ArrayD<u32>,
        fragments: Vec<BTreeSet<Label>>,
    ) -> Result<Self> {
        if fragments.first().is_none_or(|set| !set.is_empty()) {
            return Err(ModelError::NonEmptyBaseFragment);
        }
        let num_sets = fragments.len();
        for value in index_img.iter() {
            if *value as usize >= num_sets {
                return Err(ModelError::FragmentOutOfRange {
                    fragment: *value,
                    num_sets,
                });
            }
        }
        let mut identities = HashMap::new();
        for (id, set) in fragments.iter().enumerate() {
            identities.entry(set.clone()).or_insert(id as u32);
        }
        Ok(Self {
            index_img,
            fragments,
            identities,
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.index_img.shape()
    }

    pub fn ndim(&self) -> usize {
        self.index_img.ndim()
    }

    /// Number of distinct label-set identities; the LUT has one entry each.
    pub fn num_sets(&self) -> usize {
        self.fragments.len()
    }

    /// Label set of one fragment; unknown fragments read as empty.
    pub fn labels_at_index(&self, fragment: u32) -> &BTreeSet<Label> {
        self.fragments
            .get(fragment as usize)
            .unwrap_or(&self.fragments[0])
    }

    pub fn fragment_at_position(&self, position: &[usize]) -> Option<u32> {
        if !self.in_bounds(position) {
            return None;
        }
        Some(self.index_img[IxDyn(position)])
    }

    /// Labels at a position; out-of-bounds queries return the empty set.
    pub fn labels_at_position(&self, position: &[usize]) -> &BTreeSet<Label> {
        match self.fragment_at_position(position) {
            Some(fragment) => self.labels_at_index(fragment),
            None => &self.fragments[0],
        }
    }

    /// Every label currently occupying at least one position.
    pub fn labels(&self) -> BTreeSet<Label> {
        let mut used = vec![false; self.fragments.len()];
        for value in self.index_img.iter() {
            used[*value as usize] = true;
        }
        let mut labels = BTreeSet::new();
        for (fragment, set) in self.fragments.iter().enumerate() {
            if used[fragment] {
                labels.extend(set.iter().copied());
            }
        }
        labels
    }

    pub fn max_label_id(&self) -> Option<u64> {
        self.labels().into_iter().next_back().map(|label| label.id())
    }

    /// All positions occupied by `label`, or `None` if it occurs nowhere.
    pub fn region_of(&self, label: Label) -> Option<Region> {
        let carrying: Vec<bool> = self
            .fragments
            .iter()
            .map(|set| set.contains(&label))
            .collect();
        let mut positions = Vec::new();
        for (index, value) in self.index_img.indexed_iter() {
            if carrying[*value as usize] {
                positions.push(index.slice().to_vec());
            }
        }
        if positions.is_empty() {
            None
        } else {
            Some(Region::new(label, positions))
        }
    }

    fn in_bounds(&self, position: &[usize]) -> bool {
        position.len() == self.ndim()
            && position
                .iter()
                .zip(self.shape())
                .all(|(coordinate, size)| coordinate < size)
    }

    fn intern(&mut self, set: BTreeSet<Label>) -> u32 {
        if let Some(id) = self.identities.get(&set) {
            return *id;
        }
        let id = self.fragments.len() as u32;
        self.fragments.push(set.clone());
        self.identities.insert(set, id);
        id
    }

    /// Adds `label` to the set at `position`.
    pub fn add_label_at(&mut self, label: Label, position: &[usize]) -> Result<()> {
        let fragment = self.fragment_at_position(position).ok_or_else(|| {
            ModelError::PositionOutOfBounds {
                position: position.to_vec(),
            }
        })?;
        let mut set = self.fragments[fragment as usize].clone();
        if set.insert(label) {
            let target = self.intern(set);
            self.index_img[IxDyn(position)] = target;
        }
        Ok(())
    }

    /// Removes `label` from every position carrying it.
    pub fn remove_label(&mut self, label: Label) {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        for fragment in 0..self.fragments.len() as u32 {
            if self.fragments[fragment as usize].contains(&label) {
                let mut set = self.fragments[fragment as usize].clone();
                set.remove(&label);
                let target = self.intern(set);
                remap.insert(fragment, target);
            }
        }
        if remap.is_empty() {
            return;
        }
        for value in self.index_img.iter_mut() {
            if let Some(target) = remap.get(value) {
                *value = *target;
            }
        }
    }

    /// Applies a committed split as one atomic mutation: every `(position,
    /// new_label)` assignment is added, then `original` is removed
    /// everywhere. Validated up front, so a failure mutates nothing.
    pub fn commit_split(
        &mut self,
        original: Label,
        assignments: &[(Vec<usize>, Label)],
    ) -> Result<()> {
        for (position, _) in assignments {
            if !self.in_bounds(position) {
                return Err(ModelError::PositionOutOfBounds {
                    position: position.clone(),
                });
            }
        }
        for (position, label) in assignments {
            self.add_label_at(*label, position)?;
        }
        self.remove_label(original);
        Ok(())
    }
}
