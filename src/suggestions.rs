//! Ordered chart suggestions with at most one active entry.

use crate::ChartConfig;

#[derive(Debug, Clone, Default)]
pub struct SuggestionRegistry {
    items: Vec<ChartConfig>,
    active: Option<usize>,
}

impl SuggestionRegistry {
    /// Replaces the list wholesale and clears the active selection.
    pub fn load(&mut self, configs: Vec<ChartConfig>) {
        self.items = configs;
        self.active = None;
    }

    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    /// Marks the entry matching `config` on `(chart_type, title)` as the only active one.
    ///
    /// Returns the index of the active entry. When nothing matches, the selection is cleared.
    pub fn set_active(&mut self, config: &ChartConfig) -> Option<usize> {
        self.active = self
            .items
            .iter()
            .position(|item| item.same_suggestion(config));
        self.active
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&ChartConfig> {
        self.active.and_then(|index| self.items.get(index))
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    pub fn get(&self, index: usize) -> Option<&ChartConfig> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[ChartConfig] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// An empty list is a valid state ("no suggestions").
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
