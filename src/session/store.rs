//! Append-only message store.

use super::entry::ConversationEntry;

/// Session-scoped, ordered log of conversation entries.
///
/// Insertion order is display order. Entries are only ever removed all at
/// once through [`MessageStore::reset`].
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    entries: Vec<ConversationEntry>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the end of the log.
    pub fn append(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Append several entries, preserving their order.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = ConversationEntry>) {
        self.entries.extend(entries);
    }

    /// Drop every entry. The caller owns regenerating the thread id.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Iterate entries in insertion order.
    ///
    /// The borrow checker keeps the store from changing while the iterator
    /// is alive, so each call sees the state at call time.
    pub fn iter(&self) -> std::slice::Iter<'_, ConversationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }
}

impl<'a> IntoIterator for &'a MessageStore {
    type Item = &'a ConversationEntry;
    type IntoIter = std::slice::Iter<'a, ConversationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
