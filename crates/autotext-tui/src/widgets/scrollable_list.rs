//! Scrollable list whose selection follows an item key, not a row index.
//!
//! The queue list is rebuilt from every fresh snapshot. Keying the selection
//! keeps the cursor on the same lead when rows are inserted or removed above
//! it; when the lead disappears the cursor stays at the same row position.

pub struct ScrollableList<K> {
    keys: Vec<K>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<K: Clone + PartialEq> ScrollableList<K> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    /// Replace the rows, keeping `selected` on the same key when it survives.
    pub fn set_keys(&mut self, keys: Vec<K>) {
        let previous = self.selected_key().cloned();
        self.keys = keys;
        if let Some(pos) = previous.and_then(|k| self.keys.iter().position(|x| *x == k)) {
            self.selected = pos;
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        if self.selected >= self.keys.len() {
            self.selected = self.keys.len().saturating_sub(1);
        }
        if self.scroll_offset > self.selected {
            self.scroll_offset = self.selected;
        }
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.keys.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.keys.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.keys.len().saturating_sub(1);
    }

    pub fn selected_key(&self) -> Option<&K> {
        self.keys.get(self.selected)
    }

    /// Adjust `scroll_offset` so the selection fits in `height` rows.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// Index range of the rows that fit in `height`.
    pub fn visible_range(&self, height: usize) -> std::ops::Range<usize> {
        let start = self.scroll_offset.min(self.keys.len());
        start..(start + height).min(self.keys.len())
    }
}

impl<K: Clone + PartialEq> Default for ScrollableList<K> {
    fn default() -> Self {
        Self::new()
    }
}
