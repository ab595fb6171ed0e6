use std::collections::HashSet;

use crate::domain::MessageKey;

/// Keys of messages already handled in this process.
///
/// Grows for the life of the process and is never persisted; a restart starts
/// from an empty set.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<MessageKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, key: &MessageKey) -> bool {
        self.seen.contains(key)
    }

    pub fn mark_seen(&mut self, key: MessageKey) {
        self.seen.insert(key);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId};

    fn key(chat: i64, id: i32) -> MessageKey {
        MessageKey {
            chat_id: ChatId(chat),
            message_id: MessageId(id),
        }
    }

    #[test]
    fn marks_are_permanent() {
        let mut d = Deduplicator::new();
        assert!(!d.seen(&key(1, 1)));
        d.mark_seen(key(1, 1));
        d.mark_seen(key(1, 1));
        assert!(d.seen(&key(1, 1)));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn same_message_id_in_another_chat_is_distinct() {
        let mut d = Deduplicator::new();
        d.mark_seen(key(-100, 7));
        assert!(!d.seen(&key(-200, 7)));
        assert_eq!(key(-100, 7).to_string(), "-100-7");
    }
}
