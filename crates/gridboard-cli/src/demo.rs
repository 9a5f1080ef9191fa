//! Stand-ins for the game server and the knobs.
//!
//! The board binary has no server client or analog drivers of its own. A
//! `[demo]` table in the board's TOML file seeds the mock collaborators:
//!
//! ```toml
//! [demo]
//! game_active = true
//!
//! [[demo.kinds]]
//! kind = "coal"
//! min = 0.0
//! max = 500.0
//! coefficient = 1.0
//! knob = 0.6
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use gridboard_control::mock::{MockAnalog, MockRemote};
use gridboard_core::{BoardConfig, DeviceKind};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
struct DemoFile {
    #[serde(default)]
    demo: DemoConfig,
}

/// Values fed to the mock collaborators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub game_active: bool,
    pub kinds: Vec<DemoKind>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            game_active: true,
            kinds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DemoKind {
    pub kind: DeviceKind,
    #[serde(default)]
    pub min: f32,
    #[serde(default)]
    pub max: f32,
    #[serde(default)]
    pub coefficient: f32,
    #[serde(default)]
    pub knob: f32,
}

impl DemoConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: DemoFile = toml::from_str(s).context("invalid [demo] table")?;
        Ok(file.demo)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn remote(&self) -> MockRemote {
        let mut remote = MockRemote::new().active(self.game_active);
        for values in &self.kinds {
            remote.set_range(values.kind, values.min, values.max);
            remote.set_coefficient(values.kind, values.coefficient);
        }
        remote
    }

    /// Knob positions, wired to each channel's analog input.
    pub fn analog(&self, config: &BoardConfig) -> MockAnalog {
        let mut analog = MockAnalog::new();
        for channel in &config.channels {
            if let Some(values) = self.kinds.iter().find(|k| k.kind == channel.kind) {
                analog.set_input(channel.analog_input, values.knob);
            }
        }
        analog
    }
}
