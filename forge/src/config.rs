//! Render options.
//!
//! Options can be built in code or read from TOML:
//!
//! ```toml
//! hoist_calibration_preamble = true
//! include_externs = true
//!
//! [format]
//! indent = { spaces = 2 }
//! duration_decimals = 3
//! ```

use std::path::Path;
use std::str::FromStr;

use oqforge_codegen::FormatOptions;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How [`Program::render_with`](crate::Program::render_with) lays out a
/// program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Put `defcalgrammar "openpulse";` first and gather externs and
    /// port/frame/waveform declarations into one leading `cal` block.
    pub hoist_calibration_preamble: bool,
    /// Emit `extern` declarations for the externs the program calls.
    pub include_externs: bool,
    /// Wrap everything after the version header in a single `cal` block.
    pub wrap_in_cal: bool,
    /// Skip auto-declaration of used variables.
    pub ignore_needs_declaration: bool,
    pub format: FormatOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hoist_calibration_preamble: false,
            include_externs: true,
            wrap_in_cal: false,
            ignore_needs_declaration: false,
            format: FormatOptions::default(),
        }
    }
}

impl FromStr for RenderOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s)
    }
}

impl RenderOptions {
    /// Parse options from a TOML document. Missing keys take their default.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Config { source })
    }

    /// Read options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_hoisted_preamble(mut self) -> Self {
        self.hoist_calibration_preamble = true;
        self
    }

    pub fn without_externs(mut self) -> Self {
        self.include_externs = false;
        self
    }

    pub fn wrapped_in_cal(mut self) -> Self {
        self.wrap_in_cal = true;
        self
    }

    pub fn ignoring_needs_declaration(mut self) -> Self {
        self.ignore_needs_declaration = true;
        self
    }

    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }
}
