//! Integration tests for the speech queue
//!
//! Tests ordering, shutdown policies and back-pressure against sinks that
//! block like a real voice does.

use formfit::core::{AnalysisEngine, DrainPolicy, SpeechQueue, SpeechSink};
use formfit::types::AngleSet;
use formfit::Result;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Condvar, Mutex};
use tokio::sync::mpsc;

/// Records every utterance; blocks each one until the gate opens
struct GatedSink {
    said: Mutex<Vec<String>>,
    open: Mutex<bool>,
    cv: Condvar,
    started: mpsc::UnboundedSender<String>,
}

impl GatedSink {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(Self {
            said: Mutex::new(Vec::new()),
            open: Mutex::new(false),
            cv: Condvar::new(),
            started: tx,
        });
        (sink, rx)
    }

    fn release(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    fn said(&self) -> Vec<String> {
        self.said.lock().unwrap().clone()
    }
}

impl SpeechSink for GatedSink {
    fn speak(&self, text: &str) -> Result<()> {
        let _ = self.started.send(text.to_string());
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
        self.said.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Discard lets the current utterance finish and drops the rest
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_discard_finishes_current_only() {
    let (sink, mut started) = GatedSink::new();
    let queue = SpeechQueue::spawn(sink.clone(), 8);
    for text in ["One!", "2", "3"] {
        assert!(queue.enqueue(text).unwrap());
    }
    assert_eq!(started.recv().await.as_deref(), Some("One!"));

    // join! polls shutdown first, so the discard flag is set before release
    let (stats, _) = tokio::join!(queue.shutdown(DrainPolicy::Discard), async {
        sink.release();
    });

    assert_eq!(stats.spoken, 1);
    assert_eq!(stats.discarded, 2);
    assert_eq!(sink.said(), vec!["One!".to_string()]);
}

/// Drain speaks everything already queued
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drain_after_blocking_playback() {
    let (sink, mut started) = GatedSink::new();
    let queue = SpeechQueue::spawn(sink.clone(), 8);
    for text in ["Chest up!", "Good rep", "One!"] {
        queue.enqueue(text).unwrap();
    }
    started.recv().await;
    sink.release();

    let stats = queue.shutdown(DrainPolicy::Drain).await;
    assert_eq!(stats.spoken, 3);
    assert_eq!(stats.discarded, 0);
    assert_eq!(sink.said(), vec!["Chest up!", "Good rep", "One!"]);
}

/// A full queue drops the newest utterance without blocking the producer
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_queue_drops_newest() {
    let (sink, mut started) = GatedSink::new();
    let queue = SpeechQueue::spawn(sink.clone(), 1);

    assert!(queue.enqueue("a").unwrap());
    assert_eq!(started.recv().await.as_deref(), Some("a"));
    assert!(queue.enqueue("b").unwrap());
    assert!(!queue.enqueue("c").unwrap());

    sink.release();
    let stats = queue.shutdown(DrainPolicy::Drain).await;
    assert_eq!(stats.spoken, 2);
    assert_eq!(stats.dropped, 1);
    assert_eq!(sink.said(), vec!["a", "b"]);
}

/// Engine events feed the queue in the order they were produced
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_engine_utterances_reach_sink_in_order() {
    let (sink, _started) = GatedSink::new();
    sink.release();
    let queue = SpeechQueue::spawn(sink.clone(), 16);

    let mut engine = AnalysisEngine::default();
    queue.enqueue_events(&engine.select_exercise("bicep curls")).unwrap();
    let elbows = |v: f64| AngleSet::from_pairs([("left_elbow", v), ("right_elbow", v)]).with_derived();
    for (i, v) in [170.0, 45.0, 170.0].iter().enumerate() {
        let out = engine.process_angles(elbows(*v), i as f64);
        queue.enqueue_events(&out.events).unwrap();
    }
    queue.enqueue_events(&engine.end_session()).unwrap();

    let stats = queue.shutdown(DrainPolicy::Drain).await;
    assert_eq!(stats.spoken, 3);
    assert_eq!(
        sink.said(),
        vec![
            "Starting Bicep Curl. Hold weights at your sides, curl up to shoulders, then lower slowly.",
            "One!",
            "Great workout! You did 1 reps of Bicep Curl.",
        ]
    );
}
