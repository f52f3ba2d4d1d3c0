//! Entry store
//!
//! Ordered, most-recent-first collection of clipboard entries. Every structural
//! mutation is journaled as a `StoreChange`; the panel drains the journal after
//! each call and forwards it to the host once its lock is released.
//!
//! Lookups are by `EntryId`. A removal or promotion that arrives after the entry
//! is already gone is a no-op, never an error.

use tracing::debug;

use crate::codec;
use crate::interface::{ClipboardLoader, EntryKind, PanelError, StoreChange};
use crate::models::{ClipboardEntry, EntryId};

/// Result of `EntryStore::promote`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteOutcome {
    /// The entry was no longer in the store
    Missing,
    /// The entry is already the live clipboard content (row 0)
    AlreadyCurrent,
    /// Handed back to the clipboard service and removed from the list
    Reborn,
}

#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<ClipboardEntry>,
    next_id: u64,
    changes: Vec<StoreChange>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry. Unknown kinds are refused without any notification.
    pub fn insert_front(&mut self, mut entry: ClipboardEntry) -> Option<EntryId> {
        if entry.kind == EntryKind::Unknown {
            debug!("Dropping clipboard snapshot of unknown kind");
            return None;
        }

        self.next_id += 1;
        let id = EntryId(self.next_id);
        entry.id = Some(id);
        self.entries.insert(0, entry);

        self.changes.push(StoreChange::Inserted { row: 0 });
        self.changes.push(StoreChange::DataChanged);
        Some(id)
    }

    fn take(&mut self, id: EntryId) -> Option<(usize, ClipboardEntry)> {
        let row = self.row_of(id)?;
        let entry = self.entries.remove(row);
        self.changes.push(StoreChange::Removed { row: row as u64 });
        Some((row, entry))
    }

    /// Remove an entry by identity; false when it was already gone.
    pub fn remove_by_identity(&mut self, id: EntryId) -> bool {
        match self.take(id) {
            Some(_) => {
                self.changes.push(StoreChange::DataChanged);
                true
            }
            None => {
                debug!(%id, "Remove of absent entry ignored");
                false
            }
        }
    }

    /// Final step of the removal choreography: drop the entry and ask views
    /// for a full rebuild.
    pub fn commit_removal(&mut self, id: EntryId) -> bool {
        match self.take(id) {
            Some(_) => {
                self.changes.push(StoreChange::Reset);
                self.changes.push(StoreChange::DataChanged);
                true
            }
            None => {
                debug!(%id, "Removal commit for absent entry ignored");
                false
            }
        }
    }

    /// Make an entry the live clipboard content again.
    ///
    /// The topmost entry already is, so it is neither re-sent nor removed;
    /// listeners still get `Reborn`.
    pub fn promote(
        &mut self,
        id: EntryId,
        loader: &dyn ClipboardLoader,
    ) -> Result<PromoteOutcome, PanelError> {
        let Some(row) = self.row_of(id) else {
            debug!(%id, "Promote of absent entry ignored");
            return Ok(PromoteOutcome::Missing);
        };

        if row == 0 {
            self.changes.push(StoreChange::Reborn);
            return Ok(PromoteOutcome::AlreadyCurrent);
        }

        let buffer = codec::encode_reborn(&self.entries[row])?;
        loader.data_reborned(buffer);

        self.take(id);
        self.changes.push(StoreChange::Reborn);
        self.changes.push(StoreChange::DataChanged);
        Ok(PromoteOutcome::Reborn)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.changes.push(StoreChange::Reset);
        self.changes.push(StoreChange::DataChanged);
    }

    /// Flip the enabled flag; returns false when the entry is gone.
    pub fn set_enabled(&mut self, id: EntryId, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.id == Some(id)) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: EntryId) -> Option<&ClipboardEntry> {
        self.entries.iter().find(|e| e.id == Some(id))
    }

    pub fn row_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == Some(id))
    }

    pub fn id_at(&self, row: usize) -> Option<EntryId> {
        self.entries.get(row).and_then(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipboardEntry> {
        self.entries.iter()
    }

    /// Hand out journaled changes in mutation order.
    pub fn drain_changes(&mut self) -> Vec<StoreChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records every call made to the clipboard service
    #[derive(Default)]
    pub(crate) struct RecordingLoader {
        pub valid: std::sync::atomic::AtomicBool,
        pub subscriptions: Mutex<usize>,
        pub reborned: Mutex<Vec<Vec<u8>>>,
    }

    impl ClipboardLoader for RecordingLoader {
        fn is_valid(&self) -> bool {
            self.valid.load(std::sync::atomic::Ordering::SeqCst)
        }

        fn subscribe(&self) {
            *self.subscriptions.lock() += 1;
        }

        fn data_reborned(&self, buffer: Vec<u8>) {
            self.reborned.lock().push(buffer);
        }
    }

    fn texts(store: &EntryStore) -> Vec<String> {
        store.iter().map(|e| e.text.clone()).collect()
    }

    #[test]
    fn test_insert_front_orders_most_recent_first() {
        let mut store = EntryStore::new();
        let a = store.insert_front(ClipboardEntry::new_text("A")).unwrap();
        let b = store.insert_front(ClipboardEntry::new_text("B")).unwrap();
        store.insert_front(ClipboardEntry::new_text("C")).unwrap();

        assert_eq!(texts(&store), vec!["C", "B", "A"]);
        assert_ne!(a, b);
        assert_eq!(store.row_of(a), Some(2));
        assert_eq!(
            store.drain_changes(),
            vec![
                StoreChange::Inserted { row: 0 },
                StoreChange::DataChanged,
                StoreChange::Inserted { row: 0 },
                StoreChange::DataChanged,
                StoreChange::Inserted { row: 0 },
                StoreChange::DataChanged,
            ]
        );
        assert!(store.drain_changes().is_empty());
    }

    #[test]
    fn test_unknown_kind_never_admitted() {
        let mut store = EntryStore::new();
        let mut entry = ClipboardEntry::new_text("x");
        entry.kind = EntryKind::Unknown;

        assert!(store.insert_front(entry).is_none());
        assert!(store.is_empty());
        assert!(store.drain_changes().is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut store = EntryStore::new();
        let a = store.insert_front(ClipboardEntry::new_text("A")).unwrap();
        store.remove_by_identity(a);
        let b = store.insert_front(ClipboardEntry::new_text("B")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_remove_reports_pre_removal_row() {
        let mut store = EntryStore::new();
        store.insert_front(ClipboardEntry::new_text("A"));
        let b = store.insert_front(ClipboardEntry::new_text("B")).unwrap();
        store.insert_front(ClipboardEntry::new_text("C"));
        store.drain_changes();

        assert!(store.remove_by_identity(b));
        assert_eq!(texts(&store), vec!["C", "A"]);
        assert_eq!(
            store.drain_changes(),
            vec![StoreChange::Removed { row: 1 }, StoreChange::DataChanged]
        );
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = EntryStore::new();
        let a = store.insert_front(ClipboardEntry::new_text("A")).unwrap();
        store.remove_by_identity(a);
        store.drain_changes();

        assert!(!store.remove_by_identity(a));
        assert!(!store.commit_removal(a));
        assert!(!store.remove_by_identity(EntryId(999)));
        assert!(store.drain_changes().is_empty());
    }

    #[test]
    fn test_commit_removal_requests_reset() {
        let mut store = EntryStore::new();
        let a = store.insert_front(ClipboardEntry::new_text("A")).unwrap();
        store.insert_front(ClipboardEntry::new_text("B"));
        store.drain_changes();

        assert!(store.commit_removal(a));
        assert_eq!(
            store.drain_changes(),
            vec![
                StoreChange::Removed { row: 1 },
                StoreChange::Reset,
                StoreChange::DataChanged
            ]
        );
    }

    #[test]
    fn test_promote_topmost_skips_service() {
        let loader = RecordingLoader::default();
        let mut store = EntryStore::new();
        store.insert_front(ClipboardEntry::new_text("A"));
        let b = store.insert_front(ClipboardEntry::new_text("B")).unwrap();
        store.drain_changes();

        let outcome = store.promote(b, &loader).unwrap();
        assert_eq!(outcome, PromoteOutcome::AlreadyCurrent);
        assert_eq!(store.len(), 2);
        assert!(loader.reborned.lock().is_empty());
        assert_eq!(store.drain_changes(), vec![StoreChange::Reborn]);
    }

    #[test]
    fn test_promote_non_topmost_sends_full_payload() {
        let loader = RecordingLoader::default();
        let mut store = EntryStore::new();
        let a = store
            .insert_front(ClipboardEntry::new_files(["file:///tmp/a.txt"]))
            .unwrap();
        store.insert_front(ClipboardEntry::new_text("B"));
        store.drain_changes();

        let outcome = store.promote(a, &loader).unwrap();
        assert_eq!(outcome, PromoteOutcome::Reborn);
        assert_eq!(texts(&store), vec!["B"]);

        let sent = loader.reborned.lock();
        assert_eq!(sent.len(), 1);
        let decoded = codec::decode_snapshot(&sent[0]).unwrap();
        assert_eq!(decoded.kind, EntryKind::File);
        assert_eq!(decoded.urls, vec!["file:///tmp/a.txt"]);
        assert!(decoded.formats.contains_key("text/uri-list"));

        assert_eq!(
            store.drain_changes(),
            vec![
                StoreChange::Removed { row: 1 },
                StoreChange::Reborn,
                StoreChange::DataChanged
            ]
        );
    }

    #[test]
    fn test_promote_missing_is_noop() {
        let loader = RecordingLoader::default();
        let mut store = EntryStore::new();
        let outcome = store.promote(EntryId(7), &loader).unwrap();
        assert_eq!(outcome, PromoteOutcome::Missing);
        assert!(store.drain_changes().is_empty());
        assert!(loader.reborned.lock().is_empty());
    }

    #[test]
    fn test_clear_resets() {
        let mut store = EntryStore::new();
        store.insert_front(ClipboardEntry::new_text("A"));
        store.drain_changes();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(
            store.drain_changes(),
            vec![StoreChange::Reset, StoreChange::DataChanged]
        );
    }

    #[test]
    fn test_set_enabled() {
        let mut store = EntryStore::new();
        let a = store.insert_front(ClipboardEntry::new_text("A")).unwrap();
        assert!(store.set_enabled(a, false));
        assert!(!store.get(a).unwrap().enabled);
        store.remove_by_identity(a);
        assert!(!store.set_enabled(a, false));
    }
}
