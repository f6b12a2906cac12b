// ABOUTME: FIFO response queue correlating sent requests to their RECORD/SUCCESS/IGNORED/FAILURE summaries
// ABOUTME: Each pending request owns a Response with optional callbacks fired as its summary arrives

use std::collections::VecDeque;

use crate::error::Neo4jError;
use crate::packstream::{Value, ValueMap};

pub type RecordsHandler = Box<dyn FnMut(Vec<Vec<Value>>) + Send>;
pub type SuccessHandler = Box<dyn FnMut(&ValueMap) + Send>;
pub type FailureHandler = Box<dyn FnMut(&Neo4jError) + Send>;
pub type IgnoredHandler = Box<dyn FnMut() + Send>;
pub type SummaryHandler = Box<dyn FnMut() + Send>;

/// Subscriber for a single request's eventual reply: zero or more RECORD
/// messages followed by exactly one summary (SUCCESS/IGNORED/FAILURE).
#[derive(Default)]
pub struct Response {
    pub request_name: String,
    pub complete: bool,
    pub on_records: Option<RecordsHandler>,
    pub on_success: Option<SuccessHandler>,
    pub on_failure: Option<FailureHandler>,
    pub on_ignored: Option<IgnoredHandler>,
    pub on_summary: Option<SummaryHandler>,
}

impl Response {
    pub fn new(request_name: impl Into<String>) -> Self {
        Self {
            request_name: request_name.into(),
            complete: false,
            on_records: None,
            on_success: None,
            on_failure: None,
            on_ignored: None,
            on_summary: None,
        }
    }

    pub fn with_on_success(mut self, f: impl FnMut(&ValueMap) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn with_on_failure(mut self, f: impl FnMut(&Neo4jError) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    pub fn with_on_records(mut self, f: impl FnMut(Vec<Vec<Value>>) + Send + 'static) -> Self {
        self.on_records = Some(Box::new(f));
        self
    }

    pub fn with_on_ignored(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_ignored = Some(Box::new(f));
        self
    }

    pub fn with_on_summary(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_summary = Some(Box::new(f));
        self
    }

    pub(crate) fn fire_records(&mut self, records: Vec<Vec<Value>>) {
        if let Some(handler) = self.on_records.as_mut() {
            handler(records);
        }
    }

    pub(crate) fn fire_success(&mut self, metadata: &ValueMap) {
        if let Some(handler) = self.on_success.as_mut() {
            handler(metadata);
        }
        let has_more = metadata
            .get("has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !has_more {
            self.fire_summary();
        }
    }

    pub(crate) fn fire_failure(&mut self, error: &Neo4jError) {
        if let Some(handler) = self.on_failure.as_mut() {
            handler(error);
        }
        self.fire_summary();
    }

    pub(crate) fn fire_ignored(&mut self) {
        if let Some(handler) = self.on_ignored.as_mut() {
            handler();
        }
        self.fire_summary();
    }

    fn fire_summary(&mut self) {
        if let Some(handler) = self.on_summary.as_mut() {
            handler();
        }
    }
}

/// FIFO of in-flight responses. RECORD replies address the head without
/// popping it; every other summary pops the head.
#[derive(Default)]
pub struct ResponseQueue {
    queue: VecDeque<Response>,
}

impl ResponseQueue {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, response: Response) {
        self.queue.push_back(response);
    }

    pub fn front_mut(&mut self) -> Option<&mut Response> {
        self.queue.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<Response> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True iff the queue is empty (server state is the caller's
    /// responsibility to check) or the most recently pushed response is
    /// itself a `reset` — in which case the post-reset state will be READY
    /// regardless of what else is in flight.
    pub fn tail_is_reset(&self) -> bool {
        self.queue
            .back()
            .map(|r| r.request_name == "reset")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_does_not_pop_head() {
        let mut q = ResponseQueue::new();
        q.push(Response::new("run"));
        assert_eq!(q.len(), 1);
        q.front_mut().unwrap().fire_records(vec![vec![Value::Integer(1)]]);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn success_pops_and_completes() {
        let mut q = ResponseQueue::new();
        q.push(Response::new("run"));
        let mut r = q.pop_front().unwrap();
        r.complete = true;
        r.fire_success(&ValueMap::new());
        assert!(r.complete);
    }

    #[test]
    fn tail_is_reset_detects_trailing_reset() {
        let mut q = ResponseQueue::new();
        q.push(Response::new("run"));
        assert!(!q.tail_is_reset());
        q.push(Response::new("reset"));
        assert!(q.tail_is_reset());
    }

    #[test]
    fn success_with_has_more_does_not_fire_summary_until_final() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let mut r = Response::new("pull").with_on_summary(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        let mut more = ValueMap::new();
        more.insert("has_more", Value::Boolean(true));
        r.fire_success(&more);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        r.fire_success(&ValueMap::new());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
