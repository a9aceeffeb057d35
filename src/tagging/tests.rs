use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::model::{Label, Tag};

use super::{TagEngine, TagError};

fn label(id: u64) -> Label {
    Label::new(id)
}

fn recording_engine() -> (TagEngine, Arc<Mutex<Vec<BTreeSet<Label>>>>) {
    let mut engine = TagEngine::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.add_listener(Box::new(move |event| {
        sink.lock().expect("events").push(event.labels.clone());
    }));
    (engine, events)
}

#[test]
fn add_tag_is_idempotent() {
    let (mut engine, events) = recording_engine();
    engine.add_tag(Tag::Selected, label(1));
    engine.add_tag(Tag::Selected, label(1));
    assert_eq!(engine.get_tags(&label(1)), BTreeSet::from([Tag::Selected]));
    assert_eq!(events.lock().expect("events").len(), 1);
}

#[test]
fn remove_tag_is_idempotent() {
    let (mut engine, events) = recording_engine();
    engine.add_tag(Tag::Selected, label(1));
    engine.remove_tag(Tag::Selected, label(1));
    engine.remove_tag(Tag::Selected, label(1));
    assert!(engine.get_tags(&label(1)).is_empty());
    assert_eq!(events.lock().expect("events").len(), 2);
}

#[test]
fn unknown_labels_read_as_empty_sets() {
    let engine = TagEngine::new();
    assert!(engine.get_tags(&label(99)).is_empty());
    assert!(engine.get_labels(Tag::Selected).is_empty());
    assert!(!engine.has_tag(Tag::Selected, label(99)));
}

#[test]
fn unpaused_mutations_flush_one_event_each() {
    let (mut engine, events) = recording_engine();
    engine.add_tag(Tag::Selected, label(1));
    engine.add_tag(Tag::MouseOver, label(2));
    let events = events.lock().expect("events");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], BTreeSet::from([label(1)]));
    assert_eq!(events[1], BTreeSet::from([label(2)]));
}

#[test]
fn paused_mutations_flush_once_consolidated() {
    let (mut engine, events) = recording_engine();
    engine.pause_listeners();
    engine.add_tag(Tag::Selected, label(1));
    engine.add_tag(Tag::Selected, label(2));
    engine.remove_tag(Tag::Selected, label(1));
    // reads reflect mutations immediately, only notification is deferred
    assert!(engine.get_tags(&label(1)).is_empty());
    assert_eq!(engine.get_labels(Tag::Selected), BTreeSet::from([label(2)]));
    assert!(events.lock().expect("events").is_empty());
    engine.resume_listeners().expect("balanced");
    let events = events.lock().expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], BTreeSet::from([label(1), label(2)]));
}

#[test]
fn nested_pause_flushes_at_outermost_resume() {
    let (mut engine, events) = recording_engine();
    engine.pause_listeners();
    engine.add_tag(Tag::Selected, label(1));
    engine.pause_listeners();
    engine.add_tag(Tag::Selected, label(2));
    engine.resume_listeners().expect("balanced");
    assert!(events.lock().expect("events").is_empty());
    engine.resume_listeners().expect("balanced");
    assert_eq!(events.lock().expect("events").len(), 1);
}

#[test]
fn unbalanced_resume_is_an_error() {
    let mut engine = TagEngine::new();
    assert_eq!(engine.resume_listeners(), Err(TagError::UnbalancedResume));
    engine.pause_listeners();
    engine.resume_listeners().expect("balanced");
    assert_eq!(engine.resume_listeners(), Err(TagError::UnbalancedResume));
}

#[test]
fn batch_scope_flushes_once() {
    let (mut engine, events) = recording_engine();
    engine.batch(|engine| {
        engine.add_tag(Tag::Selected, label(1));
        engine.add_tag(Tag::MouseOver, label(1));
        engine.add_tag(Tag::Selected, label(2));
    });
    let events = events.lock().expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], BTreeSet::from([label(1), label(2)]));
}

#[test]
fn no_event_when_nothing_changed() {
    let (mut engine, events) = recording_engine();
    engine.add_tag(Tag::Selected, label(1));
    events.lock().expect("events").clear();
    engine.batch(|engine| {
        engine.add_tag(Tag::Selected, label(1));
        engine.remove_tag(Tag::MouseOver, label(1));
    });
    assert!(events.lock().expect("events").is_empty());
}

#[test]
fn toggle_tag_flips_membership() {
    let mut engine = TagEngine::new();
    engine.toggle_tag(Tag::Selected, label(1));
    assert!(engine.has_tag(Tag::Selected, label(1)));
    engine.toggle_tag(Tag::Selected, label(1));
    assert!(!engine.has_tag(Tag::Selected, label(1)));
}

#[test]
fn remove_tag_everywhere_sweeps_all_labels() {
    let (mut engine, events) = recording_engine();
    engine.add_tag(Tag::Selected, label(1));
    engine.add_tag(Tag::Selected, label(2));
    engine.add_tag(Tag::Selected, label(3));
    engine.add_tag(Tag::MouseOver, label(2));
    events.lock().expect("events").clear();

    engine.remove_tag_everywhere(Tag::Selected);
    assert!(engine.get_labels(Tag::Selected).is_empty());
    assert_eq!(engine.get_labels(Tag::MouseOver), BTreeSet::from([label(2)]));
    let events = events.lock().expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], BTreeSet::from([label(1), label(2), label(3)]));
}

#[test]
fn batched_and_unbatched_runs_agree_on_final_state() {
    let mutations = |engine: &mut TagEngine| {
        engine.add_tag(Tag::Selected, label(1));
        engine.add_tag(Tag::MouseOver, label(1));
        engine.toggle_tag(Tag::Selected, label(2));
        engine.remove_tag(Tag::Selected, label(1));
        engine.add_tag(Tag::Custom(5), label(3));
    };

    let mut unbatched = TagEngine::new();
    mutations(&mut unbatched);

    let mut batched = TagEngine::new();
    batched.batch(|engine| mutations(engine));

    for id in 1..=3 {
        assert_eq!(unbatched.get_tags(&label(id)), batched.get_tags(&label(id)));
    }
}
