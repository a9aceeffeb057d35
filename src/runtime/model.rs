use std::collections::BTreeSet;

use crate::display::{LutBuilder, Rgba};
use crate::model::{Label, LabelMapping};
use crate::tagging::TagEngine;

/// Notification seam to the rendering layer; fire-and-forget.
pub trait ViewNotifier: Send + Sync {
    fn request_repaint(&self);
}

/// The per-session editing state: the label mapping, the tag engine that
/// exclusively owns the label→tags relation, and the current LUT.
#[derive(Debug)]
pub struct EditorModel {
    mapping: LabelMapping,
    tagging: TagEngine,
    lut_builder: LutBuilder,
    lut: Vec<Rgba>,
}

impl EditorModel {
    pub fn new(mapping: LabelMapping) -> Self {
        let tagging = TagEngine::new();
        let lut_builder = LutBuilder::new();
        let lut = lut_builder.build(&mapping, &tagging);
        Self {
            mapping,
            tagging,
            lut_builder,
            lut,
        }
    }

    pub fn mapping(&self) -> &LabelMapping {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut LabelMapping {
        &mut self.mapping
    }

    pub fn tagging(&self) -> &TagEngine {
        &self.tagging
    }

    pub fn tagging_mut(&mut self) -> &mut TagEngine {
        &mut self.tagging
    }

    pub fn lut_builder_mut(&mut self) -> &mut LutBuilder {
        &mut self.lut_builder
    }

    /// The current display lookup table, one color per fragment.
    pub fn lut(&self) -> &[Rgba] {
        &self.lut
    }

    /// Labels under a data coordinate; out of bounds means "no labels".
    pub fn find_labels_at_position(&self, position: &[usize]) -> BTreeSet<Label> {
        self.mapping.labels_at_position(position).clone()
    }

    pub(crate) fn parts_mut(&mut self) -> (&LabelMapping, &mut TagEngine) {
        (&self.mapping, &mut self.tagging)
    }

    pub fn rebuild_lut(&mut self) {
        self.lut = self.lut_builder.build(&self.mapping, &self.tagging);
    }
}
