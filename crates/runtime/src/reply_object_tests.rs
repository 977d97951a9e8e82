// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::reaper::DestroyPolicy;
use scopes_core::CategoryRenderer;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Category(String),
    Result(String),
    Annotation(usize),
    Filters(usize),
    Finished(FinishedReason, String),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl SearchReceiver for Recorder {
    fn push_category(&self, category: Arc<Category>) {
        self.events.lock().push(Event::Category(category.id().to_string()));
    }

    fn push_result(&self, result: CategorisedResult) {
        self.events.lock().push(Event::Result(result.uri().to_string()));
    }

    fn push_annotation(&self, annotation: Annotation) {
        self.events.lock().push(Event::Annotation(annotation.links().len()));
    }

    fn push_filters(&self, filters: Vec<Variant>, _filter_state: VariantMap) {
        self.events.lock().push(Event::Filters(filters.len()));
    }

    fn finished(&self, reason: FinishedReason, message: &str) {
        self.events.lock().push(Event::Finished(reason, message.to_string()));
    }
}

fn category_payload(id: &str) -> VariantMap {
    let cat = Category::new(id, "T", "", CategoryRenderer::default());
    let mut payload = VariantMap::new();
    payload.insert("category".into(), Variant::Map(cat.serialize()));
    payload
}

fn result_payload(uri: &str, cat_id: &str) -> VariantMap {
    let mut result = VariantMap::new();
    result.insert("uri".into(), Variant::from(uri));
    result.insert("cat_id".into(), Variant::from(cat_id));
    let mut payload = VariantMap::new();
    payload.insert("result".into(), Variant::Map(result));
    payload
}

#[test]
fn pushes_demultiplex_in_order() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();

    assert!(reply.push(category_payload("c")));
    assert!(reply.push(result_payload("u", "c")));
    reply.finished(FinishedReason::Finished, "");

    assert_eq!(
        recorder.events(),
        vec![
            Event::Category("c".into()),
            Event::Result("u".into()),
            Event::Finished(FinishedReason::Finished, String::new()),
        ]
    );
}

#[test]
fn duplicate_category_finishes_with_error() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();

    assert!(reply.push(category_payload("c")));
    assert!(!reply.push(category_payload("c")));

    assert_eq!(
        recorder.events(),
        vec![
            Event::Category("c".into()),
            Event::Finished(FinishedReason::Error, "category c already registered".into()),
        ]
    );
}

#[test]
fn result_for_unknown_category_finishes_with_error() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();

    assert!(!reply.push(result_payload("u", "missing")));

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], Event::Finished(FinishedReason::Error, m)
        if m.contains("unknown category")));
}

#[test]
fn pushes_after_finished_are_dropped() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();

    reply.finished(FinishedReason::Finished, "");
    assert!(!reply.push(category_payload("c")));
    assert!(reply.is_finished());

    assert_eq!(
        recorder.events(),
        vec![Event::Finished(FinishedReason::Finished, String::new())]
    );
}

#[test]
fn exactly_one_terminal_callback() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();

    reply.finished(FinishedReason::Cancelled, "");
    reply.finished(FinishedReason::Finished, "");
    drop(reply);

    assert_eq!(
        recorder.events(),
        vec![Event::Finished(FinishedReason::Cancelled, String::new())]
    );
}

#[test]
fn drop_synthesises_finished() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();
    assert!(reply.push(category_payload("c")));
    drop(reply);

    assert_eq!(
        recorder.events(),
        vec![
            Event::Category("c".into()),
            Event::Finished(FinishedReason::Finished, String::new()),
        ]
    );
}

#[test]
fn annotation_and_filters_payloads_dispatch() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();

    let mut annotation = Annotation::new(scopes_core::AnnotationType::Link);
    annotation.add_link("more", scopes_core::CannedQuery::new("s"));
    let annotation_variant: Variant =
        serde_json::from_value(serde_json::to_value(&annotation).unwrap()).unwrap();
    let mut payload = VariantMap::new();
    payload.insert("annotation".into(), annotation_variant);
    assert!(reply.push(payload));

    let mut filters = VariantMap::new();
    filters.insert("filters".into(), Variant::Array(vec![Variant::from("f1")]));
    assert!(reply.push(filters));

    assert_eq!(recorder.events(), vec![Event::Annotation(1), Event::Filters(1)]);
}

#[test]
fn malformed_payload_finishes_with_error() {
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, None).unwrap();

    let mut payload = VariantMap::new();
    payload.insert("mystery".into(), Variant::Null);
    assert!(!reply.push(payload));

    let events = recorder.events();
    assert!(matches!(&events[0], Event::Finished(FinishedReason::Error, _)));
}

#[test]
fn idle_reply_is_reaped_with_push_interval_error() {
    let reaper = Reaper::create(
        Duration::from_millis(50),
        Duration::from_millis(50),
        DestroyPolicy::NoCallbackOnDestroy,
    )
    .unwrap();
    let recorder = Arc::new(Recorder::default());
    let reply = ReplyObject::new(Arc::clone(&recorder) as Arc<dyn SearchReceiver>, Some(&reaper)).unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(3);
    while recorder.events().is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(
        recorder.events(),
        vec![Event::Finished(FinishedReason::Error, PUSH_INTERVAL_EXCEEDED.into())]
    );
    // Subsequent pushes are refused.
    assert!(!reply.push(category_payload("c")));
}

struct PanickyReceiver {
    saw_finish: Mutex<Option<FinishedReason>>,
}

impl SearchReceiver for PanickyReceiver {
    fn push_category(&self, _category: Arc<Category>) {
        panic!("receiver bug");
    }

    fn finished(&self, reason: FinishedReason, _message: &str) {
        *self.saw_finish.lock() = Some(reason);
    }
}

#[test]
fn panicking_receiver_does_not_poison_the_stream() {
    let receiver = Arc::new(PanickyReceiver { saw_finish: Mutex::new(None) });
    let reply = ReplyObject::new(Arc::clone(&receiver) as Arc<dyn SearchReceiver>, None).unwrap();

    // The panic is swallowed; the stream stays usable.
    assert!(reply.push(category_payload("c")));
    reply.finished(FinishedReason::Finished, "");
    assert_eq!(*receiver.saw_finish.lock(), Some(FinishedReason::Finished));
}
