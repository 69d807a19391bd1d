//! Runtime limits for the hinting VM.
//!
//! The defaults impose no instruction budget; set `max_steps` when hinting
//! untrusted fonts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Maximum operand stack depth.
    pub max_stack_depth: usize,
    /// Maximum nesting of CALL/LOOPCALL, including calls made from the font program.
    pub max_call_depth: usize,
    /// Step budget for one top-level run (`execute`, `prime` or
    /// `load_font_program`). Every fetched instruction and every function
    /// iteration entered counts, including those of a lazily run font program.
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 4096,
            max_call_depth: 64,
            max_steps: None,
        }
    }
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn from_toml_str(src: &str) -> Result<Self> {
        toml::from_str(src).context("invalid VM configuration")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read VM configuration from {}", path.display()))?;
        Self::from_toml_str(&src)
    }
}
