//! Host settings file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use voxedit_core::DispatcherConfig;
use voxedit_ipc::IpcConfig;

/// Everything the host reads from its JSON settings file. Missing keys take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Command execution settings.
    pub dispatcher: DispatcherConfig,
    /// Recognizer connection settings.
    pub ipc: IpcConfig,
}

impl Settings {
    /// Load `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))
    }
}
