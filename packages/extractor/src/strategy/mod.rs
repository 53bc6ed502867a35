//! Structural extraction strategies.
//!
//! A page is owned by exactly one strategy: the first whose precondition
//! holds, in the fixed order tabular, narrative, linked-tree. Strategies
//! never blend their output.

pub mod builder;
pub mod event;
pub mod labels;
pub mod linked_tree;
pub mod narrative;
pub mod tabular;

pub use builder::RecordBuilder;
pub use linked_tree::LinkedTreeStrategy;
pub use narrative::NarrativeStrategy;
pub use tabular::TabularStrategy;

use crate::html::Document;
use crate::types::StrategyKind;

/// One structural way of reading an individual out of a page.
pub trait ExtractionStrategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Whether the page has the structure this strategy reads.
    fn precondition(&self, doc: &Document<'_>) -> bool;

    /// Write every field found into `builder`.
    fn extract(&self, doc: &Document<'_>, builder: &mut RecordBuilder<'_>);
}

/// Ordered list of strategies evaluated first-match-wins.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy after the ones already registered.
    pub fn register(&mut self, strategy: Box<dyn ExtractionStrategy>) {
        self.strategies.push(strategy);
    }

    /// The first strategy whose precondition holds for `doc`.
    #[must_use]
    pub fn select(&self, doc: &Document<'_>) -> Option<&dyn ExtractionStrategy> {
        self.strategies
            .iter()
            .map(AsRef::as_ref)
            .find(|strategy| strategy.precondition(doc))
    }

    /// Registered strategy kinds, in evaluation order.
    #[must_use]
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }
}

impl Default for StrategyRegistry {
    /// Tabular, then narrative, then linked-tree.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TabularStrategy));
        registry.register(Box::new(NarrativeStrategy));
        registry.register(Box::new(LinkedTreeStrategy));
        registry
    }
}
