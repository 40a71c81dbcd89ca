use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pipeline_console::api::{GraphSource, SelectorEvaluator};
use pipeline_console::dag::{DagPayload, SelectorResult};
use pipeline_console::errors::{ConsoleError, Result};

/// Evaluator answering from a fixed table of selector -> node ids.
///
/// Selectors not in the table fail like an unknown name would on the
/// backend. Every call is recorded.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEvaluator {
    answers: BTreeMap<String, BTreeSet<String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer<I, S>(mut self, selector: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers
            .insert(selector.to_string(), ids.into_iter().map(Into::into).collect());
        self
    }

    /// Selectors seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl SelectorEvaluator for ScriptedEvaluator {
    fn evaluate<'a>(
        &'a self,
        selector: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SelectorResult>> + Send + 'a>> {
        Box::pin(async move {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(selector.to_string());
            }
            match self.answers.get(selector) {
                Some(ids) => Ok(SelectorResult {
                    raw_selector: selector.to_string(),
                    selected_nodes: ids.clone(),
                    explanation: format!("Scripted answer for '{selector}'"),
                }),
                None => Err(ConsoleError::ApiError {
                    status: 400,
                    detail: format!("Invalid selector: {selector}"),
                }),
            }
        })
    }
}

/// Evaluator that always fails with a transport error.
#[derive(Debug, Clone, Default)]
pub struct FailingEvaluator {
    calls: Arc<AtomicUsize>,
}

impl FailingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SelectorEvaluator for FailingEvaluator {
    fn evaluate<'a>(
        &'a self,
        _selector: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SelectorResult>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ConsoleError::TransportError("backend unreachable".into()))
        })
    }
}

/// Graph source serving a fixed payload, or failing when built with
/// [`StaticGraphSource::failing`].
#[derive(Debug, Clone)]
pub struct StaticGraphSource {
    payload: Option<DagPayload>,
}

impl StaticGraphSource {
    pub fn new(payload: DagPayload) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    pub fn failing() -> Self {
        Self { payload: None }
    }
}

impl GraphSource for StaticGraphSource {
    fn fetch_graph(&self) -> Pin<Box<dyn Future<Output = Result<DagPayload>> + Send + '_>> {
        Box::pin(async move {
            self.payload.clone().ok_or(ConsoleError::ApiError {
                status: 500,
                detail: "graph unavailable".into(),
            })
        })
    }
}
