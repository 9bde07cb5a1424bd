//! The ordered, de-duplicated message window of one conversation.

use std::collections::HashSet;

use super::entry::{ChatEntry, LocalId, PendingMessage};
use crate::models::{Message, MessageId};

/// Messages materialized for one open conversation, oldest first.
///
/// Order is merge order: older pages go to the front, polls and sends go to
/// the back, and nothing is ever re-sorted by timestamp. Server IDs are
/// unique across the window. Pages arrive newest-first and are reversed here.
#[derive(Debug, Clone, Default)]
pub struct MessageWindow {
    entries: Vec<ChatEntry>,
    revision: u64,
}

impl MessageWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mutation counter; unchanged means the window was not touched.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Display keys in window order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(ChatEntry::key).collect()
    }

    /// Whether a confirmed message with this ID is present.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.position_of(id).is_some()
    }

    /// The pending entry, if a send is outstanding.
    pub fn pending(&self) -> Option<&PendingMessage> {
        self.entries.iter().find_map(|e| match e {
            ChatEntry::Pending(p) => Some(p),
            ChatEntry::Confirmed(_) => None,
        })
    }

    fn position_of(&self, id: &MessageId) -> Option<usize> {
        self.entries.iter().position(|e| e.server_id() == Some(id))
    }

    fn local_position(&self, local_id: &LocalId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.local_id() == Some(local_id))
    }

    fn server_ids(&self) -> HashSet<MessageId> {
        self.entries
            .iter()
            .filter_map(|e| e.server_id().cloned())
            .collect()
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Replace everything with a newest-first page.
    pub fn replace_all(&mut self, newest_first: Vec<Message>) {
        let mut seen = HashSet::new();
        self.entries = newest_first
            .into_iter()
            .rev()
            .filter(|m| seen.insert(m.id.clone()))
            .map(ChatEntry::Confirmed)
            .collect();
        self.touch();
    }

    /// Put an older newest-first page in front, dropping known IDs.
    ///
    /// Returns how many entries were added.
    pub fn prepend_older(&mut self, newest_first: Vec<Message>) -> usize {
        let mut seen = self.server_ids();
        let older: Vec<ChatEntry> = newest_first
            .into_iter()
            .rev()
            .filter(|m| seen.insert(m.id.clone()))
            .map(ChatEntry::Confirmed)
            .collect();

        let added = older.len();
        if added > 0 {
            self.entries.splice(0..0, older);
            self.touch();
        }
        added
    }

    /// Merge a newest-first page at the tail.
    ///
    /// Known IDs are replaced in place, unknown ones appended oldest first.
    /// Pending entries are never touched. Returns how many were appended.
    pub fn merge_newer(&mut self, newest_first: Vec<Message>) -> usize {
        let mut changed = false;
        let mut added = 0;

        for message in newest_first.into_iter().rev() {
            match self.position_of(&message.id) {
                Some(pos) => {
                    if let ChatEntry::Confirmed(existing) = &self.entries[pos] {
                        if *existing != message {
                            self.entries[pos] = ChatEntry::Confirmed(message);
                            changed = true;
                        }
                    }
                }
                None => {
                    self.entries.push(ChatEntry::Confirmed(message));
                    added += 1;
                    changed = true;
                }
            }
        }

        if changed {
            self.touch();
        }
        added
    }

    /// Append an optimistic placeholder.
    pub fn push_pending(&mut self, pending: PendingMessage) {
        self.entries.push(ChatEntry::Pending(pending));
        self.touch();
    }

    /// Reconcile a placeholder with the server's message.
    ///
    /// The message takes the placeholder's position. If the message already
    /// arrived through a poll, the placeholder is dropped instead. Returns
    /// whether the message is new to the window.
    pub fn confirm(&mut self, local_id: &LocalId, message: Message) -> bool {
        let placeholder = self.local_position(local_id);

        let placed = match (placeholder, self.position_of(&message.id)) {
            (Some(pos), None) => {
                self.entries[pos] = ChatEntry::Confirmed(message);
                true
            }
            (Some(pos), Some(_)) => {
                self.entries.remove(pos);
                false
            }
            (None, None) => {
                self.entries.push(ChatEntry::Confirmed(message));
                true
            }
            (None, Some(_)) => return false,
        };
        self.touch();
        placed
    }

    /// Drop a placeholder. Returns whether it was present.
    pub fn remove_pending(&mut self, local_id: &LocalId) -> bool {
        match self.local_position(local_id) {
            Some(pos) => {
                self.entries.remove(pos);
                self.touch();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationId, UserId};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn msg(id: &str) -> Message {
        Message {
            id: id.into(),
            conversation_id: ConversationId::from("c1"),
            sender_id: UserId::from("u2"),
            text: format!("text of {id}"),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn page(ids: &[&str]) -> Vec<Message> {
        ids.iter().map(|id| msg(id)).collect()
    }

    fn window_of(newest_first: &[&str]) -> MessageWindow {
        let mut window = MessageWindow::new();
        window.replace_all(page(newest_first));
        window
    }

    #[test]
    fn test_replace_all_reverses() {
        let window = window_of(&["m3", "m2", "m1"]);
        assert_eq!(window.keys(), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_prepend_older_drops_known_ids() {
        let mut window = window_of(&["m5", "m4", "m3"]);
        let added = window.prepend_older(page(&["m3", "m2", "m1"]));

        assert_eq!(added, 2);
        assert_eq!(window.keys(), vec!["m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn test_prepend_nothing_new_keeps_revision() {
        let mut window = window_of(&["m2", "m1"]);
        let revision = window.revision();
        assert_eq!(window.prepend_older(page(&["m1"])), 0);
        assert_eq!(window.revision(), revision);
    }

    #[test]
    fn test_merge_newer_appends_unknown() {
        let mut window = window_of(&["m3", "m2", "m1"]);
        let added = window.merge_newer(page(&["m5", "m4", "m3"]));

        assert_eq!(added, 2);
        assert_eq!(window.keys(), vec!["m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn test_merge_identical_page_is_a_no_op() {
        let mut window = window_of(&["m3", "m2", "m1"]);
        let revision = window.revision();

        assert_eq!(window.merge_newer(page(&["m3", "m2", "m1"])), 0);
        assert_eq!(window.revision(), revision);
    }

    #[test]
    fn test_merge_replaces_by_id_in_place() {
        let mut window = window_of(&["m2", "m1"]);
        let mut edited = msg("m1");
        edited.text = "edited".into();

        window.merge_newer(vec![msg("m2"), edited]);

        assert_eq!(window.keys(), vec!["m1", "m2"]);
        assert_eq!(window.entries()[0].text(), "edited");
    }

    #[test]
    fn test_merge_leaves_pending_alone() {
        let mut window = window_of(&["m2", "m1"]);
        let pending = PendingMessage::new("c1".into(), None, "hi");
        let local = pending.local_id.clone();
        window.push_pending(pending);

        window.merge_newer(page(&["m3", "m2"]));

        let keys = window.keys();
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[2], local.as_str());
        assert_eq!(keys[3], "m3");
        assert!(window.pending().is_some());
    }

    #[test]
    fn test_confirm_replaces_in_place() {
        let mut window = window_of(&["m3", "m2", "m1"]);
        let pending = PendingMessage::new("c1".into(), None, "hi");
        let local = pending.local_id.clone();
        window.push_pending(pending);

        assert!(window.confirm(&local, msg("m4")));

        assert_eq!(window.keys(), vec!["m1", "m2", "m3", "m4"]);
        assert!(window.pending().is_none());
    }

    #[test]
    fn test_confirm_after_poll_drops_placeholder() {
        let mut window = window_of(&["m1"]);
        let pending = PendingMessage::new("c1".into(), None, "hi");
        let local = pending.local_id.clone();
        window.push_pending(pending);
        window.merge_newer(page(&["m2", "m1"]));

        assert!(!window.confirm(&local, msg("m2")));

        assert_eq!(window.keys(), vec!["m1", "m2"]);
    }

    #[test]
    fn test_remove_pending() {
        let mut window = window_of(&["m1"]);
        let pending = PendingMessage::new("c1".into(), None, "hi");
        let local = pending.local_id.clone();
        window.push_pending(pending);

        assert!(window.remove_pending(&local));
        assert!(!window.remove_pending(&local));
        assert_eq!(window.keys(), vec!["m1"]);
    }
}
