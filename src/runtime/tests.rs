use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ndarray::{ArrayD, IxDyn};

use crate::display::Rgba;
use crate::model::{Label, LabelMapping, Tag};
use crate::split::{CancelToken, SplitConfig};

use super::{EditorController, EditorModel, HoverService, ViewNotifier};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Default)]
struct CountingView {
    repaints: AtomicUsize,
}

impl ViewNotifier for CountingView {
    fn request_repaint(&self) {
        self.repaints.fetch_add(1, Ordering::SeqCst);
    }
}

impl CountingView {
    fn repaints(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }
}

fn label(id: u64) -> Label {
    Label::new(id)
}

fn labels<const N: usize>(ids: [u64; N]) -> BTreeSet<Label> {
    ids.into_iter().map(Label::new).collect()
}

/// 2x2 mapping: label 1 on the top row, label 2 bottom-left, background
/// bottom-right.
fn small_mapping() -> LabelMapping {
    let img = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1_u32, 1, 2, 0]).expect("shape");
    LabelMapping::from_index_image(&img)
}

fn controller(mapping: LabelMapping) -> (EditorController, Arc<CountingView>) {
    let view = Arc::new(CountingView::default());
    let model = EditorModel::new(mapping);
    let controller = EditorController::new(model, Arc::clone(&view) as Arc<dyn ViewNotifier>);
    (controller, view)
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn a_click_selects_and_repaints_once() {
    init_logging();
    let (controller, view) = controller(small_mapping());
    controller.select_first_at(&[0, 0]);
    assert_eq!(controller.selected_labels(), labels([1]));
    assert_eq!(view.repaints(), 1);

    // the same click again changes nothing, so no further repaint
    controller.select_first_at(&[0, 1]);
    assert_eq!(view.repaints(), 1);
}

#[test]
fn clicking_the_background_clears_the_selection() {
    let (controller, view) = controller(small_mapping());
    controller.select_first_at(&[1, 0]);
    assert_eq!(controller.selected_labels(), labels([2]));
    controller.select_first_at(&[1, 1]);
    assert!(controller.selected_labels().is_empty());
    assert_eq!(view.repaints(), 2);
}

#[test]
fn modifier_clicks_accumulate_a_selection() {
    let (controller, _view) = controller(small_mapping());
    controller.add_first_to_selection_at(&[0, 0]);
    controller.add_first_to_selection_at(&[1, 0]);
    assert_eq!(controller.selected_labels(), labels([1, 2]));
}

#[test]
fn wheel_ticks_cycle_through_overlapping_labels() {
    let mut mapping = small_mapping();
    mapping.add_label_at(label(2), &[0, 0]).expect("in bounds");
    mapping.add_label_at(label(3), &[0, 0]).expect("in bounds");
    let (controller, _view) = controller(mapping);

    // first tick starts the cycle at the first label
    controller.cycle_selection_at(&[0, 0], true);
    assert_eq!(controller.selected_labels(), labels([1]));
    controller.cycle_selection_at(&[0, 0], true);
    assert_eq!(controller.selected_labels(), labels([2]));
    controller.cycle_selection_at(&[0, 0], false);
    assert_eq!(controller.selected_labels(), labels([1]));
    // ticks over the background are ignored
    controller.cycle_selection_at(&[1, 1], true);
    assert_eq!(controller.selected_labels(), labels([1]));
}

#[test]
fn whole_universe_selection_operations() {
    let (controller, _view) = controller(small_mapping());
    controller.select_all();
    assert_eq!(controller.selected_labels(), labels([1, 2]));
    controller.invert_selection();
    assert!(controller.selected_labels().is_empty());
    controller.select_first_at(&[0, 0]);
    controller.invert_selection();
    assert_eq!(controller.selected_labels(), labels([2]));
    controller.deselect_all();
    assert!(controller.selected_labels().is_empty());
}

#[test]
fn changing_a_tag_color_repaints() {
    let (controller, view) = controller(small_mapping());
    controller.set_tag_color(Tag::Custom(0), Rgba::new(0, 255, 0, 200));
    assert_eq!(view.repaints(), 1);
    controller.remove_tag_color(Tag::Custom(0));
    assert_eq!(view.repaints(), 2);
}

#[test]
fn deleting_a_label_drops_its_tags_and_notifies() {
    let (controller, view) = controller(small_mapping());
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    controller.add_labeling_listener(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    controller.select_first_at(&[0, 0]);
    let before = view.repaints();
    controller.delete_label(label(1));

    assert!(controller.selected_labels().is_empty());
    assert!(controller.find_labels_at_position(&[0, 0]).is_empty());
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert_eq!(view.repaints(), before + 1);
}

#[test]
fn splitting_the_selection_replaces_it_with_fresh_labels() {
    init_logging();
    let img = ArrayD::from_elem(IxDyn(&[5, 5]), 7_u32);
    let mapping = LabelMapping::from_index_image(&img);
    let mut data = ArrayD::from_elem(IxDyn(&[5, 5]), 0.0_f32);
    data[IxDyn(&[1, 1])] = 9.0;
    data[IxDyn(&[3, 3])] = 9.0;
    let (controller, _view) = controller(mapping);
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    controller.add_labeling_listener(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    controller.select_all();
    let results = controller.split_selected(
        &data,
        SplitConfig { sigma: 0.0 },
        &CancelToken::new(),
    );
    assert_eq!(results.len(), 1);
    let (original, outcome) = &results[0];
    assert_eq!(*original, label(7));
    let outcome = outcome.as_ref().expect("split succeeds");
    assert_eq!(outcome.new_labels, labels([8, 9]));
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    let model = controller.model();
    let guard = model.lock().expect("model");
    assert_eq!(guard.mapping().labels(), labels([8, 9]));
    assert!(guard.mapping().region_of(label(7)).is_none());
}

#[test]
fn splitting_without_cores_reports_the_failure_per_label() {
    let (controller, _view) = controller(small_mapping());
    controller.select_all();
    let data = ArrayD::from_elem(IxDyn(&[2, 2]), 1.0_f32);
    let results = controller.split_selected(
        &data,
        SplitConfig { sigma: 0.0 },
        &CancelToken::new(),
    );
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, result)| result.is_err()));
    assert_eq!(
        controller.find_labels_at_position(&[0, 0]),
        labels([1])
    );
}

#[test]
fn hovering_tags_the_labels_under_the_pointer() {
    let (controller, view) = controller(small_mapping());
    controller.hover_at(&[0, 1]);
    assert!(wait_until(Duration::from_secs(2), || view.repaints() >= 1));
    assert_eq!(controller.hovered_labels(), labels([1]));
    assert_eq!(view.repaints(), 1);
}

#[test]
fn hovering_across_a_boundary_moves_the_tag() {
    let (controller, view) = controller(small_mapping());
    controller.hover_at(&[0, 0]);
    assert!(wait_until(Duration::from_secs(2), || view.repaints() >= 1));
    controller.hover_at(&[1, 0]);
    assert!(wait_until(Duration::from_secs(2), || {
        controller.hovered_labels() == labels([2])
    }));
    assert_eq!(controller.hovered_labels(), labels([2]));
}

#[test]
fn a_newer_hover_supersedes_a_pending_one() {
    let started = Arc::new((Mutex::new(0_usize), Condvar::new()));
    let gate = Arc::new((Mutex::new(false), Condvar::new()));
    let processed = Arc::new(Mutex::new(Vec::new()));

    let service = {
        let started = Arc::clone(&started);
        let gate = Arc::clone(&gate);
        let processed = Arc::clone(&processed);
        HoverService::new(move |position| {
            {
                let (count, signal) = &*started;
                *count.lock().expect("started") += 1;
                signal.notify_all();
            }
            let (open, signal) = &*gate;
            let mut open = open.lock().expect("gate");
            while !*open {
                open = signal.wait(open).expect("gate");
            }
            drop(open);
            processed.lock().expect("processed").push(position);
        })
    };

    service.submit(vec![0]);
    {
        // wait for the worker to block on the gate with [0] in flight
        let (count, signal) = &*started;
        let mut count = count.lock().expect("started");
        while *count < 1 {
            count = signal.wait(count).expect("started");
        }
    }
    service.submit(vec![1]);
    service.submit(vec![2]);

    {
        let (open, signal) = &*gate;
        *open.lock().expect("gate") = true;
        signal.notify_all();
    }
    // dropping joins the worker, which drains the one surviving update
    drop(service);

    assert_eq!(*processed.lock().expect("processed"), vec![vec![0], vec![2]]);
    assert_eq!(*started.0.lock().expect("started"), 2);
}
