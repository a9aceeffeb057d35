use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::model::{Label, Tag};

use super::{Result, TagError};

/// One flush of tag changes, carrying every label whose tag set changed
/// since the previous flush.
#[derive(Debug, Clone)]
pub struct TagChangedEvent {
    pub labels: BTreeSet<Label>,
}

pub type TagListener = Box<dyn Fn(&TagChangedEvent) + Send + Sync>;

/// Owns the label→tags relation. Mutations are idempotent and permissive:
/// a label without an entry behaves exactly like one with an empty tag set.
///
/// Change notification can be paused; pause/resume pairs nest, and only the
/// outermost resume flushes, delivering one event with the consolidated set
/// of changed labels. Reads always reflect mutations immediately; only
/// notification is deferred.
pub struct TagEngine {
    tags: HashMap<Label, BTreeSet<Tag>>,
    listeners: Vec<TagListener>,
    pause_depth: usize,
    pending: BTreeSet<Label>,
}

impl std::fmt::Debug for TagEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TagEngine")
            .field("labels", &self.tags.len())
            .field("listeners", &self.listeners.len())
            .field("pause_depth", &self.pause_depth)
            .finish()
    }
}

impl Default for TagEngine {
    fn default() -> Self {
        Self {
            tags: HashMap::new(),
            listeners: Vec::new(),
            pause_depth: 0,
            pending: BTreeSet::new(),
        }
    }
}

impl TagEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: TagListener) {
        self.listeners.push(listener);
    }

    pub fn add_tag(&mut self, tag: Tag, label: Label) {
        if self.tags.entry(label).or_default().insert(tag) {
            self.mark_changed(label);
        }
    }

    pub fn remove_tag(&mut self, tag: Tag, label: Label) {
        if let Some(set) = self.tags.get_mut(&label) {
            if set.remove(&tag) {
                self.mark_changed(label);
            }
        }
    }

    /// Removes `tag` from every label carrying it, as one consolidated
    /// change.
    pub fn remove_tag_everywhere(&mut self, tag: Tag) {
        let affected: Vec<Label> = self
            .tags
            .iter()
            .filter(|(_, set)| set.contains(&tag))
            .map(|(label, _)| *label)
            .collect();
        self.batch(|engine| {
            for label in affected {
                engine.remove_tag(tag, label);
            }
        });
    }

    pub fn toggle_tag(&mut self, tag: Tag, label: Label) {
        if self.has_tag(tag, label) {
            self.remove_tag(tag, label);
        } else {
            self.add_tag(tag, label);
        }
    }

    pub fn has_tag(&self, tag: Tag, label: Label) -> bool {
        self.tags.get(&label).is_some_and(|set| set.contains(&tag))
    }

    /// Current tag set of `label`; never fails, unknown labels are empty.
    pub fn get_tags(&self, label: &Label) -> BTreeSet<Tag> {
        self.tags.get(label).cloned().unwrap_or_default()
    }

    /// Every label currently carrying `tag`.
    pub fn get_labels(&self, tag: Tag) -> BTreeSet<Label> {
        self.tags
            .iter()
            .filter(|(_, set)| set.contains(&tag))
            .map(|(label, _)| *label)
            .collect()
    }

    pub fn pause_listeners(&mut self) {
        self.pause_depth += 1;
    }

    /// Balances one `pause_listeners`; the outermost resume flushes the
    /// consolidated changes. More resumes than pauses is a caller bug and
    /// is reported rather than clamped.
    pub fn resume_listeners(&mut self) -> Result<()> {
        if self.pause_depth == 0 {
            return Err(TagError::UnbalancedResume);
        }
        self.pause_depth -= 1;
        if self.pause_depth == 0 {
            self.flush();
        }
        Ok(())
    }

    /// Runs `f` inside one pause/resume scope.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.pause_listeners();
        let result = f(self);
        // the pause above guarantees this resume is balanced
        let _ = self.resume_listeners();
        result
    }

    fn mark_changed(&mut self, label: Label) {
        self.pending.insert(label);
        if self.pause_depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let event = TagChangedEvent {
            labels: std::mem::take(&mut self.pending),
        };
        debug!("tag flush for {} label(s)", event.labels.len());
        for listener in &self.listeners {
            listener(&event);
        }
    }
}
