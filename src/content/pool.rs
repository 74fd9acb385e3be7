use std::sync::Arc;

use rand::seq::IndexedRandom;

use super::ContentItem;

/// The set of content notifications are drawn from.
///
/// Replacement swaps the whole backing slice, so a draw only ever sees
/// either the old pool or the new one.
#[derive(Debug, Clone)]
pub struct ContentPool {
    items: Arc<[ContentItem]>,
}

impl ContentPool {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Replace the pool wholesale. Items are never merged.
    pub fn replace(&mut self, items: Vec<ContentItem>) {
        self.items = items.into();
    }

    /// Uniformly random item, or `None` for an empty pool. Does not consume
    /// the item; the same content may come up on consecutive draws.
    pub fn draw(&self) -> Option<ContentItem> {
        self.items.choose(&mut rand::rng()).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &ContentItem) -> bool {
        self.items.contains(item)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }
}

impl Default for ContentPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
