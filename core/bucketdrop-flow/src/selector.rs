//! The bucket dropdown.

/// An ordered list of bucket names with at most one selected entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSelector {
    items: Vec<String>,
    selected: Option<usize>,
}

impl BucketSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entries, keeping their order. Clears the selection.
    pub fn populate(&mut self, items: Vec<String>) {
        self.items = items;
        self.selected = None;
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn is_populated(&self) -> bool {
        !self.items.is_empty()
    }

    /// Index of the first entry equal to `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item == name)
    }

    /// Selects by index. Returns false (and changes nothing) when out of range.
    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Selects by exact name. Returns false when the name is not listed.
    pub fn select_name(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => self.select_index(index),
            None => false,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.map(|i| self.items[i].as_str())
    }
}
