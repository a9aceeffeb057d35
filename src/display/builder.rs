use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::model::{LabelMapping, Tag};
use crate::tagging::TagEngine;

use super::{LutChannel, Rgba};

/// Builds the display lookup table: one composited color per distinct
/// label-set identity of the mapping. Channels composite with the standard
/// "over" operator in ascending `Tag` order; the operator only commutes for
/// equal alphas, so the fixed order is what makes repeated builds
/// reproducible.
#[derive(Debug, Clone)]
pub struct LutBuilder {
    channels: BTreeMap<Tag, LutChannel>,
}

impl Default for LutBuilder {
    fn default() -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(Tag::Selected, LutChannel::new(Rgba::new(255, 50, 50, 100)));
        channels.insert(Tag::MouseOver, LutChannel::new(Rgba::new(50, 50, 50, 100)));
        Self { channels }
    }
}

impl LutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the channel color for `tag`. The LUT is not
    /// rebuilt automatically; callers rebuild when ready.
    pub fn set_color(&mut self, tag: Tag, color: Rgba) {
        self.channels.insert(tag, LutChannel::new(color));
    }

    pub fn remove_color(&mut self, tag: Tag) {
        self.channels.remove(&tag);
    }

    pub fn channels(&self) -> impl Iterator<Item = (&Tag, &LutChannel)> {
        self.channels.iter()
    }

    /// One color per fragment. Fragments are independent, so the rebuild
    /// parallelizes over them.
    pub fn build(&self, mapping: &LabelMapping, tagging: &TagEngine) -> Vec<Rgba> {
        (0..mapping.num_sets() as u32)
            .into_par_iter()
            .map(|fragment| {
                let labels = mapping.labels_at_index(fragment);
                if labels.is_empty() {
                    return Rgba::TRANSPARENT;
                }
                let mut tags = BTreeSet::new();
                for label in labels {
                    tags.extend(tagging.get_tags(label));
                }
                self.mix_colors(&tags)
            })
            .collect()
    }

    // https://en.wikipedia.org/wiki/Alpha_compositing
    fn mix_colors(&self, tags: &BTreeSet<Tag>) -> Rgba {
        let mut red = 0.0_f32;
        let mut green = 0.0_f32;
        let mut blue = 0.0_f32;
        let mut alpha = 0.0_f32;
        for tag in tags {
            let Some(channel) = self.channels.get(tag) else {
                continue;
            };
            let color = channel.color();
            let new_alpha = f32::from(color.a) / 255.0;
            let out_alpha = alpha + new_alpha * (1.0 - alpha);
            if out_alpha == 0.0 {
                red = 0.0;
                green = 0.0;
                blue = 0.0;
            } else {
                red = (red * alpha + f32::from(color.r) * new_alpha * (1.0 - alpha)) / out_alpha;
                green =
                    (green * alpha + f32::from(color.g) * new_alpha * (1.0 - alpha)) / out_alpha;
                blue = (blue * alpha + f32::from(color.b) * new_alpha * (1.0 - alpha)) / out_alpha;
            }
            alpha = out_alpha;
        }
        Rgba::new(
            red.round() as u8,
            green.round() as u8,
            blue.round() as u8,
            (alpha * 255.0).round() as u8,
        )
    }
}
