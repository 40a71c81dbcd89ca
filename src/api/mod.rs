// src/api/mod.rs

//! REST collaborators of the console.
//!
//! The DAG view talks to a [`GraphSource`] and a [`SelectorEvaluator`]
//! rather than to HTTP directly, so tests (and offline use) can swap in
//! other implementations.
//!
//! - [`http`] is the production client for the backend REST API.
//! - [`local`] evaluates selectors against an already loaded graph.

use std::future::Future;
use std::pin::Pin;

use crate::dag::model::{DagPayload, SelectorResult};
use crate::errors::Result;

pub mod http;
pub mod local;

pub use http::HttpApi;
pub use local::LocalEvaluator;

/// Something that can produce the full dependency graph in one shot.
pub trait GraphSource: Send + Sync {
    fn fetch_graph(&self) -> Pin<Box<dyn Future<Output = Result<DagPayload>> + Send + '_>>;
}

/// Something that resolves a selector string to a set of node ids.
///
/// Callers treat the selector as an opaque query; validation beyond
/// non-emptiness is the evaluator's business.
pub trait SelectorEvaluator: Send + Sync {
    fn evaluate<'a>(
        &'a self,
        selector: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SelectorResult>> + Send + 'a>>;
}
