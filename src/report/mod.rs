//! Output formatting for analysis reports.
//!
//! Supports three output formats:
//! - Text: colored terminal output for human readability
//! - JSON: the persisted report, pretty-printed
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

mod json;
mod sarif;
mod text;

pub use json::JsonRenderer;
pub use sarif::SarifRenderer;
pub use text::TextRenderer;

use thiserror::Error;

use crate::model::ProjectReport;

/// A report output format.
pub trait Renderer: Send + Sync {
    /// Format name used for lookup (e.g., "text").
    fn format(&self) -> &'static str;

    fn render(&self, report: &ProjectReport) -> anyhow::Result<String>;
}

#[derive(Debug, Error)]
#[error("unknown format {name:?} (available: {available})")]
pub struct UnknownFormat {
    pub name: String,
    pub available: String,
}

/// Renderers by format name, matched case-insensitively.
pub struct RendererRegistry {
    renderers: Vec<Box<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self {
            renderers: Vec::new(),
        }
    }

    pub fn register(&mut self, renderer: Box<dyn Renderer>) -> &mut Self {
        self.renderers.push(renderer);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Renderer> {
        self.renderers
            .iter()
            .find(|r| r.format().eq_ignore_ascii_case(name.trim()))
            .map(|r| r.as_ref())
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<&dyn Renderer, UnknownFormat> {
        self.get(name).ok_or_else(|| UnknownFormat {
            name: name.to_string(),
            available: self.formats().join(", "),
        })
    }

    pub fn formats(&self) -> Vec<&'static str> {
        self.renderers.iter().map(|r| r.format()).collect()
    }
}

impl Default for RendererRegistry {
    /// Text, JSON and SARIF.
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(Box::new(TextRenderer))
            .register(Box::new(JsonRenderer))
            .register(Box::new(SarifRenderer));
        registry
    }
}
