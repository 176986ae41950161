//! Terminal configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default depth of the kitty keyboard flag stack
pub const DEFAULT_KITTY_STACK_DEPTH: usize = 8;

/// Upper bound accepted for the kitty keyboard flag stack depth
const MAX_KITTY_STACK_DEPTH: usize = 64;

/// Options used to construct a [`crate::Terminal`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalOptions {
    /// Number of columns
    pub cols: usize,
    /// Number of rows
    pub rows: usize,
    /// Maximum scrollback lines kept for the primary buffer
    pub scrollback_lines: usize,
    /// Maximum entries on the kitty keyboard flag stack
    pub kitty_stack_depth: usize,
    /// Distance between default tab stops
    pub tab_width: usize,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            scrollback_lines: 1000,
            kitty_stack_depth: DEFAULT_KITTY_STACK_DEPTH,
            tab_width: 8,
        }
    }
}

impl TerminalOptions {
    /// Options with the given size and defaults for everything else
    pub fn with_size(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            ..Default::default()
        }
    }

    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every option is in range
    pub fn validate(&self) -> Result<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(Error::InvalidDimensions {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if self.kitty_stack_depth == 0 || self.kitty_stack_depth > MAX_KITTY_STACK_DEPTH {
            return Err(Error::InvalidOption {
                name: "kitty_stack_depth",
                reason: format!("must be between 1 and {}", MAX_KITTY_STACK_DEPTH),
            });
        }
        if self.tab_width == 0 {
            return Err(Error::InvalidOption {
                name: "tab_width",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
