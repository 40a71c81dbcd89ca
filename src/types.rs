use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity carried by an inbound `log` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which part of the pipeline produced a log line.
///
/// The backend uses the short tool names on the wire (`dlt`, `dbt`); the
/// spelled-out role names are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogSource {
    #[serde(rename = "dlt", alias = "pipeline-loader")]
    PipelineLoader,
    #[serde(rename = "dbt", alias = "transform-runner")]
    TransformRunner,
    #[serde(rename = "system")]
    System,
}

impl LogSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LogSource::PipelineLoader => "pipeline-loader",
            LogSource::TransformRunner => "transform-runner",
            LogSource::System => "system",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Coarse pipeline stage a graph node belongs to.
///
/// Declaration order is the canonical left-to-right layout order; `Unknown`
/// always sorts last.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Source,
    Raw,
    Staging,
    Intermediate,
    #[serde(alias = "marts_dim", alias = "marts_fact")]
    Marts,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Layer {
    /// Every layer in canonical order.
    pub const ORDERED: [Layer; 6] = [
        Layer::Source,
        Layer::Raw,
        Layer::Staging,
        Layer::Intermediate,
        Layer::Marts,
        Layer::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Source => "source",
            Layer::Raw => "raw",
            Layer::Staging => "staging",
            Layer::Intermediate => "intermediate",
            Layer::Marts => "marts",
            Layer::Unknown => "unknown",
        }
    }

    /// Fill colour for nodes of this layer when they are emphasised.
    pub fn color(self) -> &'static str {
        match self {
            Layer::Source => "#94a3b8",
            Layer::Raw => "#f97316",
            Layer::Staging => "#eab308",
            Layer::Intermediate => "#22c55e",
            Layer::Marts => "#3b82f6",
            Layer::Unknown => "#64748b",
        }
    }

    /// Column index used by the grid layout.
    pub fn column(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "source" => Ok(Layer::Source),
            "raw" => Ok(Layer::Raw),
            "staging" => Ok(Layer::Staging),
            "intermediate" => Ok(Layer::Intermediate),
            "marts" | "marts_dim" | "marts_fact" => Ok(Layer::Marts),
            "unknown" => Ok(Layer::Unknown),
            other => Err(format!(
                "invalid layer: {other} \
                 (expected source, raw, staging, intermediate, marts or unknown)"
            )),
        }
    }
}
