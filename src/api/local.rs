// src/api/local.rs

use std::future::Future;
use std::pin::Pin;

use crate::api::SelectorEvaluator;
use crate::dag::graph::GraphModel;
use crate::dag::model::SelectorResult;
use crate::dag::selector::SelectorEngine;
use crate::errors::Result;

/// Evaluates selectors in-process against a snapshot of the graph.
///
/// Same semantics as the backend endpoint; useful offline and in tests.
#[derive(Debug, Clone)]
pub struct LocalEvaluator {
    model: GraphModel,
    engine: SelectorEngine,
}

impl LocalEvaluator {
    pub fn new(model: GraphModel) -> Self {
        Self {
            model,
            engine: SelectorEngine,
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn resolve(&self, selector: &str) -> Result<SelectorResult> {
        Ok(self.engine.resolve(&self.model, selector)?)
    }
}

impl SelectorEvaluator for LocalEvaluator {
    fn evaluate<'a>(
        &'a self,
        selector: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<SelectorResult>> + Send + 'a>> {
        Box::pin(async move { self.resolve(selector) })
    }
}
