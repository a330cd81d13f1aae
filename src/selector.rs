use crate::catalog::{Capability, Catalog};

/// Filterable view over the capability catalog that owns the set of
/// currently-active block ids. Insertion order of toggles is preserved so
/// the list the backend sees is stable.
#[derive(Debug)]
pub struct CapabilitySelector {
    catalog: Catalog,
    filter: String,
    active: Vec<u32>,
}

impl CapabilitySelector {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            filter: String::new(),
            active: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Narrows the visible list; never touches the active set.
    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
    }

    /// Blocks currently visible under the filter.
    pub fn visible(&self) -> Vec<&Capability> {
        self.catalog.matching(&self.filter)
    }

    /// Flip membership of `id` in the active set. Unknown ids are ignored,
    /// which keeps the active set a subset of the catalog.
    pub fn toggle(&mut self, id: u32) {
        if !self.catalog.contains(id) {
            return;
        }
        if let Some(pos) = self.active.iter().position(|&a| a == id) {
            self.active.remove(pos);
        } else {
            self.active.push(id);
        }
    }

    pub fn is_active(&self, id: u32) -> bool {
        self.active.contains(&id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// The internal identifiers for the active blocks, in toggle order.
    /// This is the only data that crosses to the request pipeline.
    pub fn active_internal_names(&self) -> Vec<String> {
        self.active
            .iter()
            .filter_map(|&id| self.catalog.get(id))
            .map(|cap| cap.internal_name.to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}
