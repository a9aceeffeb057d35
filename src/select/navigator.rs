use std::collections::BTreeSet;

use crate::model::{Label, LabelComparator, Tag, natural_order};
use crate::tagging::TagEngine;

/// Selection-state transitions over the reserved `Selected` and `MouseOver`
/// tags. Stateless apart from the injected label order; every operation
/// brackets its engine calls in one batch, so intermediate states never
/// reach a listener and each gesture causes at most one repaint.
pub struct SelectionNavigator {
    comparator: LabelComparator,
}

impl std::fmt::Debug for SelectionNavigator {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("SelectionNavigator").finish()
    }
}

impl Default for SelectionNavigator {
    fn default() -> Self {
        Self::new(natural_order())
    }
}

impl SelectionNavigator {
    pub fn new(comparator: LabelComparator) -> Self {
        Self { comparator }
    }

    fn ordered(&self, labels: &BTreeSet<Label>) -> Vec<Label> {
        let mut ordered: Vec<Label> = labels.iter().copied().collect();
        ordered.sort_by(|left, right| (self.comparator)(left, right));
        ordered
    }

    /// Tags the labels under the pointer with `MouseOver`.
    pub fn focus(&self, tagging: &mut TagEngine, labels: &BTreeSet<Label>) {
        tagging.batch(|engine| {
            for label in labels {
                engine.add_tag(Tag::MouseOver, *label);
            }
        });
    }

    pub fn defocus_all(&self, tagging: &mut TagEngine) {
        tagging.remove_tag_everywhere(Tag::MouseOver);
    }

    /// Pointer movement across a label boundary: clear the previous
    /// `MouseOver` set, then tag the new one, as a single flush.
    pub fn hover(&self, tagging: &mut TagEngine, labels: &BTreeSet<Label>) {
        tagging.batch(|engine| {
            engine.remove_tag_everywhere(Tag::MouseOver);
            for label in labels {
                engine.add_tag(Tag::MouseOver, *label);
            }
        });
    }

    /// Selects the first label in comparator order, clearing any previous
    /// selection. Keeps the current selection when the first label already
    /// carries it, so repeated clicks on the same spot do not flicker.
    pub fn select_first(&self, tagging: &mut TagEngine, labels: &BTreeSet<Label>) {
        let Some(first) = self.ordered(labels).first().copied() else {
            return;
        };
        if tagging.has_tag(Tag::Selected, first) {
            return;
        }
        tagging.batch(|engine| {
            engine.remove_tag_everywhere(Tag::Selected);
            engine.add_tag(Tag::Selected, first);
        });
    }

    /// Adds the first label to the selection without clearing the rest.
    pub fn add_first_to_selection(&self, tagging: &mut TagEngine, labels: &BTreeSet<Label>) {
        let Some(first) = self.ordered(labels).first().copied() else {
            return;
        };
        if tagging.has_tag(Tag::Selected, first) {
            return;
        }
        tagging.batch(|engine| engine.add_tag(Tag::Selected, first));
    }

    pub fn toggle_selection_of_first(&self, tagging: &mut TagEngine, labels: &BTreeSet<Label>) {
        let Some(first) = self.ordered(labels).first().copied() else {
            return;
        };
        tagging.batch(|engine| engine.toggle_tag(Tag::Selected, first));
    }

    pub fn any_selected(&self, tagging: &TagEngine, labels: &BTreeSet<Label>) -> bool {
        labels
            .iter()
            .any(|label| tagging.has_tag(Tag::Selected, *label))
    }

    /// Cycles the selection forward through the labels under the cursor.
    /// With nothing in the group selected the scan selects nothing; callers
    /// start the cycle with `select_first`.
    pub fn select_next(&self, tagging: &mut TagEngine, labels: &BTreeSet<Label>) {
        let ordered = self.ordered(labels);
        self.cycle(tagging, &ordered);
    }

    /// `select_next` over the reversed sequence.
    pub fn select_previous(&self, tagging: &mut TagEngine, labels: &BTreeSet<Label>) {
        let mut ordered = self.ordered(labels);
        ordered.reverse();
        self.cycle(tagging, &ordered);
    }

    fn cycle(&self, tagging: &mut TagEngine, ordered: &[Label]) {
        tagging.batch(|engine| {
            let mut found_selected = false;
            for (index, label) in ordered.iter().enumerate() {
                if engine.has_tag(Tag::Selected, *label) {
                    found_selected = true;
                    // the last scanned label stays selected rather than
                    // ending the cycle with nothing selected
                    if index + 1 < ordered.len() {
                        engine.remove_tag(Tag::Selected, *label);
                    }
                } else if found_selected {
                    engine.add_tag(Tag::Selected, *label);
                    return;
                }
            }
        });
    }

    pub fn select_all(&self, tagging: &mut TagEngine, universe: &BTreeSet<Label>) {
        tagging.batch(|engine| {
            for label in universe {
                engine.add_tag(Tag::Selected, *label);
            }
        });
    }

    pub fn deselect_all(&self, tagging: &mut TagEngine) {
        tagging.remove_tag_everywhere(Tag::Selected);
    }

    /// New selection = universe − old selection, computed from a snapshot
    /// taken before any mutation.
    pub fn invert_selection(&self, tagging: &mut TagEngine, universe: &BTreeSet<Label>) {
        let selected = tagging.get_labels(Tag::Selected);
        tagging.batch(|engine| {
            for label in universe.difference(&selected) {
                engine.add_tag(Tag::Selected, *label);
            }
            for label in &selected {
                engine.remove_tag(Tag::Selected, *label);
            }
        });
    }
}
