// src/dag/selector.rs

//! Node selector expressions.
//!
//! ```text
//! name          the node named `name`
//! +name         name and everything it depends on, transitively
//! name+         name and everything that depends on it, transitively
//! +name+        both closures plus name
//! source:s.t    the source node `s.t`
//! source:s.t+   the source and everything downstream of it
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dag::graph::GraphModel;
use crate::dag::model::SelectorResult;
use crate::errors::SelectorError;

const SOURCE_PREFIX: &str = "source:";

static SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<up>\+)?(?P<source>source:)?(?P<name>[^+\s]+)(?P<down>\+)?$")
        .expect("selector pattern is a valid regex")
});

/// What a selector points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorTarget {
    /// A node looked up by display name.
    Model(String),
    /// A source node looked up by its `schema.table` display name.
    Source(String),
}

impl SelectorTarget {
    pub fn name(&self) -> &str {
        match self {
            SelectorTarget::Model(name) | SelectorTarget::Source(name) => name,
        }
    }
}

/// A parsed selector expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub target: SelectorTarget,
    pub upstream: bool,
    pub downstream: bool,
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SelectorError::Empty);
        }

        let caps = SELECTOR_RE
            .captures(raw)
            .ok_or_else(|| SelectorError::Malformed(raw.to_string()))?;

        let upstream = caps.name("up").is_some();
        let downstream = caps.name("down").is_some();
        let name = caps["name"].to_string();

        let target = if caps.name("source").is_some() {
            if upstream {
                // Sources have nothing upstream.
                return Err(SelectorError::Malformed(raw.to_string()));
            }
            SelectorTarget::Source(name)
        } else {
            SelectorTarget::Model(name)
        };

        Ok(Self {
            target,
            upstream,
            downstream,
        })
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.upstream {
            f.write_str("+")?;
        }
        if let SelectorTarget::Source(_) = self.target {
            f.write_str(SOURCE_PREFIX)?;
        }
        f.write_str(self.target.name())?;
        if self.downstream {
            f.write_str("+")?;
        }
        Ok(())
    }
}

/// Resolves selectors against a [`GraphModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorEngine;

impl SelectorEngine {
    /// Parse `raw` and resolve it to the set of node ids it denotes.
    pub fn resolve(&self, model: &GraphModel, raw: &str) -> Result<SelectorResult, SelectorError> {
        let selector = Selector::parse(raw)?;
        let selected = self.select(model, &selector)?;
        let explanation = explain(&selector);

        debug!(%selector, count = selected.len(), "selector resolved");
        Ok(SelectorResult {
            raw_selector: raw.trim().to_string(),
            selected_nodes: selected,
            explanation,
        })
    }

    /// Resolve an already-parsed selector.
    pub fn select(
        &self,
        model: &GraphModel,
        selector: &Selector,
    ) -> Result<BTreeSet<String>, SelectorError> {
        let node = match &selector.target {
            SelectorTarget::Model(name) => model.node_by_name(name),
            SelectorTarget::Source(name) => model
                .node_by_name(name)
                .filter(|node| node.is_source()),
        }
        .ok_or_else(|| SelectorError::UnknownNode(selector.to_string()))?;

        let mut selected = BTreeSet::from([node.unique_id.clone()]);
        if selector.upstream {
            selected.extend(model.upstream_of(&node.unique_id));
        }
        if selector.downstream {
            selected.extend(model.downstream_of(&node.unique_id));
        }
        Ok(selected)
    }
}

fn explain(selector: &Selector) -> String {
    let name = selector.target.name();
    match (&selector.target, selector.upstream, selector.downstream) {
        (SelectorTarget::Source(_), _, true) => {
            format!("Source '{name}' and all downstream models")
        }
        (SelectorTarget::Source(_), _, false) => format!("Source '{name}' only"),
        (SelectorTarget::Model(_), true, true) => format!(
            "Model '{name}', all upstream dependencies, and all downstream dependents"
        ),
        (SelectorTarget::Model(_), true, false) => {
            format!("Model '{name}' and all upstream dependencies")
        }
        (SelectorTarget::Model(_), false, true) => {
            format!("Model '{name}' and all downstream dependents")
        }
        (SelectorTarget::Model(_), false, false) => format!("Model '{name}' only"),
    }
}
