use raster::PixelBuffer;

use crate::registry::BlockRegistry;
use crate::session::Document;

/// Canvas surface and registry as they were after one committed action.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub surface: PixelBuffer,
    pub registry: BlockRegistry,
}

impl HistoryEntry {
    pub fn capture(document: &Document) -> Self {
        Self {
            surface: document.canvas.surface().clone(),
            registry: document.registry.clone(),
        }
    }
}

/// Linear undo history with a cursor.
///
/// `index` is `None` only while the history is empty; otherwise it points at
/// the entry matching the current canvas.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: Option<usize>,
    max_len: usize,
}

impl History {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            max_len: max_len.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        match self.index {
            Some(i) => i + 1 < self.entries.len(),
            None => false,
        }
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.index.map(|i| &self.entries[i])
    }

    /// Pushes `entry` after the cursor, discarding any redo entries and the
    /// oldest entries beyond the cap.
    pub fn record(&mut self, entry: HistoryEntry) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);

        if self.entries.len() > self.max_len {
            let excess = self.entries.len() - self.max_len;
            self.entries.drain(..excess);
        }
        self.index = Some(self.entries.len() - 1);
    }

    /// Forgets everything and starts over from `entry`.
    pub fn reset(&mut self, entry: HistoryEntry) {
        self.entries.clear();
        self.index = None;
        self.record(entry);
    }

    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let i = self.index.filter(|&i| i > 0)? - 1;
        self.index = Some(i);
        Some(&self.entries[i])
    }

    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let i = self.index? + 1;
        if i >= self.entries.len() {
            return None;
        }
        self.index = Some(i);
        Some(&self.entries[i])
    }
}
