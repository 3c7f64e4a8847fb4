//! Language-specific analyzer implementations.

#[cfg(feature = "tree-sitter")]
mod go;
mod heuristic;

#[cfg(feature = "tree-sitter")]
pub use go::GoAnalyzer;
pub use heuristic::{Dialect, HeuristicAnalyzer, Visibility};

use std::path::Path;

use super::{LanguageAnalyzer, SmellThresholds};

/// Ordered set of analyzers. The first one that supports a path wins.
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn LanguageAnalyzer>>,
}

impl AnalyzerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// Go, C, C++, C#, in that order.
    pub fn with_thresholds(thresholds: SmellThresholds) -> Self {
        let mut registry = Self::new();
        #[cfg(feature = "tree-sitter")]
        {
            registry.register(Box::new(GoAnalyzer::with_thresholds(thresholds)));
        }
        registry
            .register(Box::new(HeuristicAnalyzer::with_thresholds(Dialect::c(), thresholds)))
            .register(Box::new(HeuristicAnalyzer::with_thresholds(Dialect::cpp(), thresholds)))
            .register(Box::new(HeuristicAnalyzer::with_thresholds(Dialect::csharp(), thresholds)));
        registry
    }

    /// Append an analyzer at the lowest priority.
    pub fn register(&mut self, analyzer: Box<dyn LanguageAnalyzer>) -> &mut Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn select(&self, path: &Path) -> Option<&dyn LanguageAnalyzer> {
        self.analyzers
            .iter()
            .find(|a| a.supports(path))
            .map(|a| a.as_ref())
    }

    /// Every extension some analyzer handles.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.analyzers
            .iter()
            .flat_map(|a| a.file_extensions().iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::with_thresholds(SmellThresholds::default())
    }
}
