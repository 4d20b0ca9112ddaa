//! The ordered, deduplicated timeline for the active room.
//!
//! Every mutation path funnels through one insert primitive that keeps the
//! sequence sorted by timestamp at write time, so reads are plain snapshots
//! and the ordering invariant is a write-time contract. Merging is idempotent
//! by entry id: the live stream and a resynchronization reload can race and
//! both deliver the same entry without duplicating it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entry::FeedEntry;
use crate::filter::HiddenSenders;

/// How a feed mutation changed the timeline, for scroll reconciliation.
///
/// Consumers map this to scroll behavior without guessing from size deltas:
/// `Initial` scrolls to the newest entry; `Append` scrolls only if the viewer
/// was already at the bottom; `Prepend` keeps the reading position by
/// offsetting exactly the height added on top; `Cleared` resets the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMutation {
    Initial,
    Append,
    Prepend,
    Cleared,
}

/// Ordered feed entries for one room.
#[derive(Debug)]
pub struct FeedStore {
    entries: Vec<FeedEntry>,
    ids: HashSet<String>,
    has_more_history: bool,
    hidden: HiddenSenders,
}

impl FeedStore {
    pub fn new(hidden: HiddenSenders) -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            has_more_history: true,
            hidden,
        }
    }

    /// Entries in ascending timestamp order.
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    /// Owned copy of the current timeline.
    pub fn snapshot(&self) -> Vec<FeedEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether older history may still exist on the server.
    pub fn has_more_history(&self) -> bool {
        self.has_more_history
    }

    pub fn set_has_more_history(&mut self, has_more: bool) {
        self.has_more_history = has_more;
    }

    /// Pagination cursor: the id of the oldest loaded message.
    ///
    /// Events are skipped; the backward-pagination endpoint compares message
    /// ids only.
    pub fn oldest_message_id(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.is_message())
            .map(|e| e.id())
    }

    /// Replace the whole timeline (initial load of a newly selected room).
    pub fn replace_all(&mut self, entries: Vec<FeedEntry>) -> FeedMutation {
        self.entries.clear();
        self.ids.clear();
        for entry in entries {
            self.insert(entry);
        }
        FeedMutation::Initial
    }

    /// Merge live-stream or optimistic entries.
    ///
    /// Idempotent: entries whose id is already present are skipped, so
    /// applying the same batch twice leaves the timeline unchanged. Returns
    /// `None` when nothing changed, to spare downstream notifications.
    pub fn merge_incoming(&mut self, entries: Vec<FeedEntry>) -> Option<FeedMutation> {
        let mut changed = false;
        for entry in entries {
            changed |= self.insert(entry);
        }
        changed.then_some(FeedMutation::Append)
    }

    /// Merge a backward-pagination page and record whether more history exists.
    pub fn prepend_older(
        &mut self,
        entries: Vec<FeedEntry>,
        has_more: bool,
    ) -> Option<FeedMutation> {
        self.has_more_history = has_more;
        let mut changed = false;
        for entry in entries {
            changed |= self.insert(entry);
        }
        changed.then_some(FeedMutation::Prepend)
    }

    /// Drop everything (room deselected or deleted).
    pub fn remove_all(&mut self) -> Option<FeedMutation> {
        if self.entries.is_empty() {
            self.has_more_history = true;
            return None;
        }
        self.entries.clear();
        self.ids.clear();
        self.has_more_history = true;
        Some(FeedMutation::Cleared)
    }

    /// Insert one entry preserving sort order. Returns whether the timeline changed.
    ///
    /// Equal timestamps insert after existing entries, so arrival order is
    /// the stable tie-break.
    fn insert(&mut self, entry: FeedEntry) -> bool {
        if let Some(sender) = entry.sender() {
            if self.hidden.is_hidden(sender) {
                return false;
            }
        }
        if !self.ids.insert(entry.id().to_string()) {
            return false;
        }
        let ts = entry.timestamp();
        let idx = self.entries.partition_point(|e| e.timestamp() <= ts);
        self.entries.insert(idx, entry);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{ChatMessage, NarratorEvent, Sender};
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn msg(id: &str, secs: i64) -> FeedEntry {
        msg_from(id, secs, "agent")
    }

    fn msg_from(id: &str, secs: i64, sender: &str) -> FeedEntry {
        FeedEntry::Message(ChatMessage {
            id: id.to_string(),
            room_id: "room-1".to_string(),
            agent_id: None,
            content: format!("text {id}"),
            sent_at: at(secs),
            sender: Sender::from(sender),
        })
    }

    fn event(id: &str, secs: i64) -> FeedEntry {
        FeedEntry::Event(NarratorEvent {
            id: id.to_string(),
            room_id: "room-1".to_string(),
            kind: "user_event".to_string(),
            description: "something happens".to_string(),
            target_agent_ids: vec![],
            occurred_at: at(secs),
        })
    }

    fn ids(store: &FeedStore) -> Vec<&str> {
        store.entries().iter().map(|e| e.id()).collect()
    }

    fn store() -> FeedStore {
        FeedStore::new(HiddenSenders::default())
    }

    #[test]
    fn test_merge_sorts_by_timestamp() {
        let mut s = store();
        s.merge_incoming(vec![msg("c", 30), msg("a", 10), msg("b", 20)]);
        assert_eq!(ids(&s), ["a", "b", "c"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut s = store();
        let batch = vec![msg("a", 10), msg("b", 20)];
        s.merge_incoming(batch.clone());
        let first = s.snapshot();
        let second = s.merge_incoming(batch);
        assert!(second.is_none(), "re-merging the same batch is a no-op");
        assert_eq!(s.snapshot(), first);
    }

    #[test]
    fn test_duplicate_id_is_skipped() {
        let mut s = store();
        s.merge_incoming(vec![msg("a", 10)]);
        s.merge_incoming(vec![msg_from("a", 99, "user")]);
        assert_eq!(s.len(), 1);
        // the original entry wins
        assert_eq!(s.entries()[0].timestamp(), at(10));
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let mut s = store();
        s.merge_incoming(vec![msg("first", 10)]);
        s.merge_incoming(vec![msg("second", 10)]);
        s.merge_incoming(vec![msg("third", 10)]);
        assert_eq!(ids(&s), ["first", "second", "third"]);
    }

    #[test]
    fn test_order_invariant_across_operations() {
        let mut s = store();
        s.replace_all(vec![msg("d", 40), msg("c", 30)]);
        s.merge_incoming(vec![msg("e", 50), event("b", 20)]);
        s.prepend_older(vec![msg("a", 10)], true);
        assert_eq!(ids(&s), ["a", "b", "c", "d", "e"]);
        let times: Vec<_> = s.entries().iter().map(|e| e.timestamp()).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_replace_all_discards_previous_state() {
        let mut s = store();
        s.merge_incoming(vec![msg("old", 10)]);
        let mutation = s.replace_all(vec![msg("new", 20)]);
        assert_eq!(mutation, FeedMutation::Initial);
        assert_eq!(ids(&s), ["new"]);
    }

    #[test]
    fn test_prepend_updates_has_more() {
        let mut s = store();
        assert!(s.has_more_history());
        let mutation = s.prepend_older(vec![msg("a", 10)], false);
        assert_eq!(mutation, Some(FeedMutation::Prepend));
        assert!(!s.has_more_history());
    }

    #[test]
    fn test_prepend_of_known_entries_reports_no_change() {
        let mut s = store();
        s.merge_incoming(vec![msg("a", 10)]);
        assert!(s.prepend_older(vec![msg("a", 10)], true).is_none());
    }

    #[test]
    fn test_hidden_sender_never_inserted() {
        let mut s = store();
        s.replace_all(vec![msg_from("sys", 10, "system"), msg("ok", 20)]);
        s.merge_incoming(vec![msg_from("digest", 30, "Summarizer")]);
        s.prepend_older(vec![msg_from("sys2", 5, "system")], true);
        assert_eq!(ids(&s), ["ok"]);
    }

    #[test]
    fn test_events_always_visible() {
        let mut s = store();
        s.merge_incoming(vec![event("e", 10)]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_oldest_message_id_skips_events() {
        let mut s = store();
        s.merge_incoming(vec![event("e", 5), msg("m1", 10), msg("m2", 20)]);
        assert_eq!(s.oldest_message_id(), Some("m1"));
    }

    #[test]
    fn test_oldest_message_id_empty() {
        let mut s = store();
        assert_eq!(s.oldest_message_id(), None);
        s.merge_incoming(vec![event("e", 5)]);
        assert_eq!(s.oldest_message_id(), None);
    }

    #[test]
    fn test_remove_all() {
        let mut s = store();
        assert!(s.remove_all().is_none(), "clearing an empty store is a no-op");
        s.merge_incoming(vec![msg("a", 10)]);
        s.set_has_more_history(false);
        assert_eq!(s.remove_all(), Some(FeedMutation::Cleared));
        assert!(s.is_empty());
        assert!(s.has_more_history(), "cleared store is back to fresh state");
    }

    #[test]
    fn test_no_duplicate_ids_property() {
        let mut s = store();
        s.replace_all(vec![msg("a", 10), msg("b", 20)]);
        s.merge_incoming(vec![msg("b", 20), msg("c", 30)]);
        s.prepend_older(vec![msg("a", 10), msg("z", 1)], true);
        let mut seen = HashSet::new();
        assert!(s.entries().iter().all(|e| seen.insert(e.id())));
    }
}
