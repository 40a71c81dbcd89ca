// src/dag/view.rs

use tracing::{debug, info, warn};

use crate::api::{GraphSource, SelectorEvaluator};
use crate::dag::graph::GraphModel;
use crate::dag::highlight::{project, HighlightState, ProjectedGraph};
use crate::errors::Result;

/// Console-side state of the dependency graph screen.
///
/// Owns the loaded [`GraphModel`], the current [`HighlightState`] and the
/// focused node. All of it is transient and dropped with the view.
///
/// Selector evaluation borrows the view mutably across the request, so one
/// view never has two evaluations in flight and a slower, older response
/// cannot land on top of a newer one.
#[derive(Debug, Default)]
pub struct DagView {
    graph: Option<GraphModel>,
    highlight: HighlightState,
    focused: Option<String>,
}

impl DagView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> Option<&GraphModel> {
        self.graph.as_ref()
    }

    pub fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Fetch the graph and replace the current model.
    ///
    /// On failure the previous model (if any) is kept and the error is
    /// returned; nothing is retried.
    pub async fn load<S: GraphSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        let payload = source.fetch_graph().await?;
        self.replace_graph(GraphModel::from_payload(payload));
        Ok(())
    }

    /// Replace the model wholesale. A focused node that no longer exists is
    /// unfocused.
    pub fn replace_graph(&mut self, model: GraphModel) {
        info!(nodes = model.len(), edges = model.edges().len(), "graph loaded");
        if let Some(id) = &self.focused {
            if !model.contains(id) {
                self.focused = None;
            }
        }
        self.graph = Some(model);
    }

    /// Evaluate `selector` and make its result the highlight.
    ///
    /// - A blank selector clears the highlight locally; the evaluator is
    ///   not called.
    /// - Any evaluation failure clears the highlight. The previous result is
    ///   never kept.
    pub async fn apply_selector<E: SelectorEvaluator + ?Sized>(
        &mut self,
        evaluator: &E,
        selector: &str,
    ) -> &HighlightState {
        let selector = selector.trim();
        if selector.is_empty() {
            debug!("empty selector; clearing highlight");
            self.clear_highlight();
            return &self.highlight;
        }

        self.highlight = match evaluator.evaluate(selector).await {
            Ok(result) => {
                debug!(
                    %selector,
                    count = result.selected_nodes.len(),
                    explanation = %result.explanation,
                    "selector evaluated"
                );
                HighlightState::from_nodes(result.selected_nodes)
            }
            Err(e) => {
                warn!(%selector, error = %e, "selector evaluation failed; clearing highlight");
                HighlightState::none()
            }
        };
        &self.highlight
    }

    pub fn clear_highlight(&mut self) {
        self.highlight.clear();
    }

    /// Focus a node by id. Unknown ids (or no loaded graph) are ignored.
    pub fn focus(&mut self, unique_id: &str) -> bool {
        match &self.graph {
            Some(model) if model.contains(unique_id) => {
                self.focused = Some(unique_id.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn unfocus(&mut self) {
        self.focused = None;
    }

    /// Render-ready projection; empty until a graph is loaded.
    pub fn project(&self) -> ProjectedGraph {
        match &self.graph {
            Some(model) => project(model, &self.highlight, self.focused.as_deref()),
            None => ProjectedGraph::default(),
        }
    }
}
