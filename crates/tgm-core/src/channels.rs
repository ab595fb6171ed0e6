use std::collections::HashMap;

use crate::domain::{ChannelHandle, ChatId};

/// Source identifier → resolved channel, filled once during initialization.
#[derive(Debug, Default)]
pub struct ChannelEntityCache {
    // Vec keeps the configured order for backlog replay.
    handles: Vec<ChannelHandle>,
    by_identifier: HashMap<String, usize>,
    by_chat: HashMap<ChatId, usize>,
}

impl ChannelEntityCache {
    pub fn insert(&mut self, handle: ChannelHandle) {
        if let Some(&idx) = self.by_identifier.get(&handle.identifier) {
            self.by_chat.insert(handle.chat_id, idx);
            self.handles[idx] = handle;
            return;
        }
        let idx = self.handles.len();
        self.by_identifier.insert(handle.identifier.clone(), idx);
        self.by_chat.insert(handle.chat_id, idx);
        self.handles.push(handle);
    }

    pub fn get(&self, identifier: &str) -> Option<&ChannelHandle> {
        self.by_identifier.get(identifier).map(|&i| &self.handles[i])
    }

    pub fn by_chat(&self, chat_id: ChatId) -> Option<&ChannelHandle> {
        self.by_chat.get(&chat_id).map(|&i| &self.handles[i])
    }

    pub fn handles(&self) -> &[ChannelHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
