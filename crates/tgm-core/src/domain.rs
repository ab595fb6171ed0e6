use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric, unique within a chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Identity of a physical message: ids are only unique per chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.chat_id.0, self.message_id.0)
    }
}

/// A source channel resolved by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelHandle {
    /// The identifier as configured (`@name` or numeric id).
    pub identifier: String,
    pub chat_id: ChatId,
    pub title: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Animation,
    Audio,
    Document,
}

impl MediaKind {
    /// Label used in default captions and logs. Everything that is not a photo
    /// is announced as a video, matching how the source channels post.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Photo => "Photo",
            _ => "Video",
        }
    }

    /// File extension for downloaded copies.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mp4",
            MediaKind::Animation => "mp4",
            MediaKind::Audio => "mp3",
            MediaKind::Document => "bin",
        }
    }
}

/// Transport-side reference to a media payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub file_id: String,
}

/// A message observed in a source channel. Owned by the client; the core only
/// reads it.
#[derive(Clone, Debug)]
pub struct SourceMessage {
    pub chat_id: ChatId,
    pub id: MessageId,
    pub date: DateTime<Utc>,
    /// Text body, or the caption for media messages.
    pub text: Option<String>,
    pub media: Option<MediaRef>,
    pub chat_title: Option<String>,
}

impl SourceMessage {
    pub fn key(&self) -> MessageKey {
        MessageKey {
            chat_id: self.chat_id,
            message_id: self.id,
        }
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// What to upload with `send_file`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutgoingFile {
    /// Re-send by reference, no bytes leave the server.
    Remote(MediaRef),
    /// Upload a local copy.
    Local { kind: MediaKind, path: PathBuf },
}

impl OutgoingFile {
    pub fn kind(&self) -> MediaKind {
        match self {
            OutgoingFile::Remote(m) => m.kind,
            OutgoingFile::Local { kind, .. } => *kind,
        }
    }
}
