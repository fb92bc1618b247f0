use anyhow::Context;
use fuzzy_line_follower::ControllerConfig;
use fuzzy_line_follower::core_modules::frame::Orientation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Replays image files from a directory in file-name order.
    Directory {
        path: PathBuf,
        #[serde(default)]
        orientation: Orientation,
    },
    /// Renders a straight track seen by a simulated robot.
    Simulated {
        ticks: u64,
        /// Starting lateral offset from the line, in meters; positive is left.
        #[serde(default)]
        initial_offset: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub source: SourceConfig,
    /// Write an annotated PNG per tick here.
    pub annotate_dir: Option<PathBuf>,
    /// Append one JSON tick report per line here.
    pub report_path: Option<PathBuf>,
    pub controller: ControllerConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::Simulated {
                ticks: 500,
                initial_offset: 0.02,
            },
            annotate_dir: None,
            report_path: None,
            controller: ControllerConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}
