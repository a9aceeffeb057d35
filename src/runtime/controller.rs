use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::display::Rgba;
use crate::model::{Label, LabelComparator, Tag, natural_order};
use crate::select::SelectionNavigator;
use crate::split::{self, CancelToken, ScalarSource, SplitConfig, SplitOutcome};

use super::{EditorModel, HoverService, ViewNotifier};

/// Emitted after a committed split or delete; consumers caching a view of
/// the label mapping should refresh.
#[derive(Debug, Clone, Copy)]
pub struct LabelingChangedEvent;

pub type LabelingListener = Box<dyn Fn(&LabelingChangedEvent) + Send + Sync>;

/// Gesture-level operations over one shared editing session.
///
/// Selection mutations run synchronously on the calling thread to keep
/// feedback tight; hover updates are offloaded to the single hover worker.
/// Every flush of tag changes rebuilds the LUT and asks the view to
/// repaint exactly once.
pub struct EditorController {
    model: Arc<Mutex<EditorModel>>,
    navigator: Arc<SelectionNavigator>,
    view: Arc<dyn ViewNotifier>,
    dirty: Arc<AtomicBool>,
    hover: HoverService,
    labeling_listeners: Mutex<Vec<LabelingListener>>,
}

impl EditorController {
    pub fn new(model: EditorModel, view: Arc<dyn ViewNotifier>) -> Self {
        Self::with_comparator(model, view, natural_order())
    }

    pub fn with_comparator(
        mut model: EditorModel,
        view: Arc<dyn ViewNotifier>,
        comparator: LabelComparator,
    ) -> Self {
        let dirty = Arc::new(AtomicBool::new(false));
        let flush_dirty = Arc::clone(&dirty);
        model
            .tagging_mut()
            .add_listener(Box::new(move |_| flush_dirty.store(true, Ordering::SeqCst)));

        let model = Arc::new(Mutex::new(model));
        let navigator = Arc::new(SelectionNavigator::new(comparator));
        let hover = {
            let model = Arc::clone(&model);
            let navigator = Arc::clone(&navigator);
            let view = Arc::clone(&view);
            let dirty = Arc::clone(&dirty);
            let last_fragment: Mutex<Option<Option<u32>>> = Mutex::new(None);
            HoverService::new(move |position| {
                let mut guard = lock(&model);
                let fragment = guard.mapping().fragment_at_position(&position);
                {
                    let mut last = last_fragment
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    // same label set under the pointer, nothing to update
                    if *last == Some(fragment) {
                        return;
                    }
                    *last = Some(fragment);
                }
                let labels = guard.find_labels_at_position(&position);
                let (_, tagging) = guard.parts_mut();
                navigator.hover(tagging, &labels);
                refresh(&mut guard, &dirty, view.as_ref());
            })
        };

        Self {
            model,
            navigator,
            view,
            dirty,
            hover,
            labeling_listeners: Mutex::new(Vec::new()),
        }
    }

    /// Shared handle to the session state, for consumers that need direct
    /// read access (tooltips, inspectors).
    pub fn model(&self) -> Arc<Mutex<EditorModel>> {
        Arc::clone(&self.model)
    }

    pub fn add_labeling_listener(&self, listener: LabelingListener) {
        self.labeling_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn lut(&self) -> Vec<Rgba> {
        lock(&self.model).lut().to_vec()
    }

    pub fn find_labels_at_position(&self, position: &[usize]) -> BTreeSet<Label> {
        lock(&self.model).find_labels_at_position(position)
    }

    pub fn selected_labels(&self) -> BTreeSet<Label> {
        lock(&self.model).tagging().get_labels(Tag::Selected)
    }

    pub fn hovered_labels(&self) -> BTreeSet<Label> {
        lock(&self.model).tagging().get_labels(Tag::MouseOver)
    }

    /// Primary click: select the first label under the pointer, or clear
    /// the selection when the position holds none.
    pub fn select_first_at(&self, position: &[usize]) {
        let mut model = lock(&self.model);
        let labels = model.find_labels_at_position(position);
        let (_, tagging) = model.parts_mut();
        if labels.is_empty() {
            self.navigator.deselect_all(tagging);
        } else {
            self.navigator.select_first(tagging, &labels);
        }
        self.refresh_locked(&mut model);
    }

    /// Modifier click: add the first label under the pointer to the
    /// selection without clearing it.
    pub fn add_first_to_selection_at(&self, position: &[usize]) {
        let mut model = lock(&self.model);
        let labels = model.find_labels_at_position(position);
        if !labels.is_empty() {
            let (_, tagging) = model.parts_mut();
            self.navigator.add_first_to_selection(tagging, &labels);
        }
        self.refresh_locked(&mut model);
    }

    /// Wheel gesture: the first tick with no selection in the group selects
    /// the first label; further ticks cycle forward or backward.
    pub fn cycle_selection_at(&self, position: &[usize], forward: bool) {
        let mut model = lock(&self.model);
        let labels = model.find_labels_at_position(position);
        if labels.is_empty() {
            return;
        }
        let (_, tagging) = model.parts_mut();
        if !self.navigator.any_selected(tagging, &labels) {
            self.navigator.select_first(tagging, &labels);
        } else if forward {
            self.navigator.select_next(tagging, &labels);
        } else {
            self.navigator.select_previous(tagging, &labels);
        }
        self.refresh_locked(&mut model);
    }

    pub fn select_all(&self) {
        let mut model = lock(&self.model);
        let (mapping, tagging) = model.parts_mut();
        let universe = mapping.labels();
        self.navigator.select_all(tagging, &universe);
        self.refresh_locked(&mut model);
    }

    pub fn deselect_all(&self) {
        let mut model = lock(&self.model);
        let (_, tagging) = model.parts_mut();
        self.navigator.deselect_all(tagging);
        self.refresh_locked(&mut model);
    }

    pub fn invert_selection(&self) {
        let mut model = lock(&self.model);
        let (mapping, tagging) = model.parts_mut();
        let universe = mapping.labels();
        self.navigator.invert_selection(tagging, &universe);
        self.refresh_locked(&mut model);
    }

    /// Schedules an asynchronous hover update for `position`; the latest
    /// scheduled position wins.
    pub fn hover_at(&self, position: &[usize]) {
        self.hover.submit(position.to_vec());
    }

    /// Registers or replaces a tag's display color and refreshes the view.
    pub fn set_tag_color(&self, tag: Tag, color: Rgba) {
        let mut model = lock(&self.model);
        model.lut_builder_mut().set_color(tag, color);
        model.rebuild_lut();
        self.view.request_repaint();
    }

    pub fn remove_tag_color(&self, tag: Tag) {
        let mut model = lock(&self.model);
        model.lut_builder_mut().remove_color(tag);
        model.rebuild_lut();
        self.view.request_repaint();
    }

    /// Splits one label. The seed and watershed stages run outside the
    /// model lock on private copies; the commit re-locks and re-validates,
    /// so it is serialized against every other mapping mutation.
    pub fn split_label(
        &self,
        data: &dyn ScalarSource,
        label: Label,
        config: SplitConfig,
        cancel: &CancelToken,
    ) -> split::Result<SplitOutcome> {
        let region = {
            let model = lock(&self.model);
            split::extract_region(model.mapping(), label)?
        };
        let split_plan = split::plan_split(&region, data, config, cancel)?;
        let outcome = {
            let mut model = lock(&self.model);
            let outcome = split_plan.commit(model.mapping_mut())?;
            model.rebuild_lut();
            outcome
        };
        self.notify_labeling_changed();
        self.view.request_repaint();
        Ok(outcome)
    }

    /// Splits every selected label. Failures are reported per label and
    /// leave that label untouched.
    pub fn split_selected(
        &self,
        data: &dyn ScalarSource,
        config: SplitConfig,
        cancel: &CancelToken,
    ) -> Vec<(Label, split::Result<SplitOutcome>)> {
        self.selected_labels()
            .into_iter()
            .map(|label| {
                let result = self.split_label(data, label, config, cancel);
                if let Err(error) = &result {
                    warn!("split of {label:?} failed: {error}");
                }
                (label, result)
            })
            .collect()
    }

    /// Removes a label from every position and drops its tags.
    pub fn delete_label(&self, label: Label) {
        {
            let mut model = lock(&self.model);
            model.mapping_mut().remove_label(label);
            let (_, tagging) = model.parts_mut();
            let tags = tagging.get_tags(&label);
            tagging.batch(|engine| {
                for tag in tags {
                    engine.remove_tag(tag, label);
                }
            });
            // one rebuild covers both the mapping change and the tag cleanup
            self.dirty.swap(false, Ordering::SeqCst);
            model.rebuild_lut();
        }
        self.notify_labeling_changed();
        self.view.request_repaint();
    }

    pub fn delete_selected(&self) {
        for label in self.selected_labels() {
            self.delete_label(label);
        }
    }

    fn refresh_locked(&self, model: &mut EditorModel) {
        refresh(model, &self.dirty, self.view.as_ref());
    }

    fn notify_labeling_changed(&self) {
        let event = LabelingChangedEvent;
        for listener in self
            .labeling_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            listener(&event);
        }
    }
}

fn refresh(model: &mut EditorModel, dirty: &AtomicBool, view: &dyn ViewNotifier) {
    if dirty.swap(false, Ordering::SeqCst) {
        model.rebuild_lut();
        view.request_repaint();
    }
}

fn lock(mutex: &Mutex<EditorModel>) -> MutexGuard<'_, EditorModel> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
