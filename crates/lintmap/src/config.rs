//! Configuration types for Lintmap diagrams.
//!
//! All types implement [`serde::Deserialize`] with per-field defaults, so a
//! configuration file only needs to name the values it overrides.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`LayoutConfig`] - Force-directed layout parameters.
//! - [`NodeStyle`] - Class box sizing.
//! - [`LintConfig`] - Lint message categories and codes to suppress.
//!
//! # Example
//!
//! ```
//! # use lintmap::config::AppConfig;
//! let config: AppConfig = toml::from_str("[layout]\niterations = 10\n").unwrap();
//! assert_eq!(config.layout().iterations(), 10);
//! assert_eq!(config.node().padding(), 50.0);
//! ```

use serde::{Deserialize, Serialize};

use lintmap_core::{geometry::Insets, semantic::MessageKind};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    node: NodeStyle,

    #[serde(default)]
    lint: LintConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig, node: NodeStyle, lint: LintConfig) -> Self {
        Self { layout, node, lint }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn node(&self) -> &NodeStyle {
        &self.node
    }

    pub fn lint(&self) -> &LintConfig {
        &self.lint
    }
}

/// Parameters of the force-directed layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of simulation steps.
    iterations: usize,
    /// Canvas units per layout grid unit.
    scale: f64,
    /// Distance kept between the canvas origin and the nearest box edge.
    margin: f64,
    /// Seed of the initial placement jitter.
    seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            scale: 180.0,
            margin: 40.0,
            seed: 0x5eed,
        }
    }
}

impl LayoutConfig {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Sizing of class boxes.
///
/// A box is as large as its measured title plus [`padding`](Self::padding)
/// on each axis.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeStyle {
    char_width: f64,
    line_height: f64,
    padding: f64,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            line_height: 14.0,
            padding: 50.0,
        }
    }
}

impl NodeStyle {
    /// Advance width of one terminal column of title text.
    pub fn char_width(&self) -> f64 {
        self.char_width
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Total padding added to each axis.
    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Padding split evenly across the four sides.
    pub fn insets(&self) -> Insets {
        Insets::uniform(self.padding / 2.0)
    }
}

/// Lint messages to suppress before they reach the diagram.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LintConfig {
    disabled_categories: Vec<MessageKind>,
    disabled_codes: Vec<String>,
}

impl LintConfig {
    pub fn new(disabled_categories: Vec<MessageKind>, disabled_codes: Vec<String>) -> Self {
        Self {
            disabled_categories,
            disabled_codes,
        }
    }

    pub fn disabled_categories(&self) -> &[MessageKind] {
        &self.disabled_categories
    }

    pub fn disabled_codes(&self) -> &[String] {
        &self.disabled_codes
    }

    /// Whether a message with this category and code should be shown.
    pub fn is_enabled(&self, kind: MessageKind, code: &str) -> bool {
        !self.disabled_categories.contains(&kind) && !self.disabled_codes.iter().any(|c| c == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lint_sections_deserialize() {
        let config: AppConfig = toml::from_str(
            "[lint]\ndisabled_categories = [\"convention\"]\ndisabled_codes = [\"W0612\"]\n",
        )
        .unwrap();
        let lint = config.lint();
        assert!(!lint.is_enabled(MessageKind::Convention, "C0111"));
        assert!(!lint.is_enabled(MessageKind::Warning, "W0612"));
        assert!(lint.is_enabled(MessageKind::Warning, "W0611"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = toml::from_str("[node]\npadding = 20.0\n").unwrap();
        assert_eq!(config.node().padding(), 20.0);
        assert_eq!(config.node().char_width(), 7.0);
        assert_eq!(config.layout().iterations(), 50);
    }
}
