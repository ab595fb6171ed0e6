use std::collections::{HashMap, VecDeque};

use tgm_core::domain::{ChatId, SourceMessage};

/// Per-chat ring of recently observed channel posts.
///
/// The Bot API has no history call, so recent messages are whatever this
/// process has seen through `getUpdates`.
#[derive(Debug)]
pub struct HistoryRing {
    capacity: usize,
    chats: HashMap<ChatId, VecDeque<SourceMessage>>,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            chats: HashMap::new(),
        }
    }

    /// Store a post; a repeated id replaces the older copy.
    pub fn record(&mut self, msg: SourceMessage) {
        let ring = self.chats.entry(msg.chat_id).or_default();
        if let Some(existing) = ring.iter_mut().find(|m| m.id == msg.id) {
            *existing = msg;
            return;
        }
        ring.push_back(msg);
        while ring.len() > self.capacity {
            ring.pop_front();
        }
    }

    /// Newest first.
    pub fn recent(&self, chat_id: ChatId, limit: usize) -> Vec<SourceMessage> {
        self.chats
            .get(&chat_id)
            .map(|ring| ring.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tgm_core::domain::MessageId;

    fn post(chat: i64, id: i32, text: &str) -> SourceMessage {
        SourceMessage {
            chat_id: ChatId(chat),
            id: MessageId(id),
            date: Utc::now(),
            text: Some(text.to_string()),
            media: None,
            chat_title: None,
        }
    }

    #[test]
    fn recent_is_newest_first_and_bounded() {
        let mut h = HistoryRing::new(3);
        for id in 1..=5 {
            h.record(post(-1, id, "x"));
        }
        h.record(post(-2, 1, "other"));

        let ids: Vec<i32> = h.recent(ChatId(-1), 10).iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        assert_eq!(h.recent(ChatId(-1), 1)[0].id.0, 5);
        assert!(h.recent(ChatId(-3), 10).is_empty());
    }

    #[test]
    fn repeated_id_replaces_in_place() {
        let mut h = HistoryRing::new(10);
        h.record(post(-1, 1, "old"));
        h.record(post(-1, 2, "next"));
        h.record(post(-1, 1, "edited"));

        let recent = h.recent(ChatId(-1), 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].text.as_deref(), Some("edited"));
    }
}
