//! Conversions between teloxide types and core domain types.

use teloxide::types::{ChatMember, ChatMemberKind, Message, Recipient};

use tgm_core::domain::{ChatId, MediaKind, MediaRef, MessageId, SourceMessage};

/// Numeric identifiers address a chat id, anything else a public username.
/// `t.me` links are accepted for convenience.
pub fn recipient(identifier: &str) -> Recipient {
    let id = identifier.trim();
    if let Ok(n) = id.parse::<i64>() {
        return Recipient::Id(teloxide::types::ChatId(n));
    }
    let name = id
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("t.me/")
        .trim_start_matches('@');
    Recipient::ChannelUsername(format!("@{name}"))
}

/// Telegram only delivers `channel_post` updates to channel administrators.
pub fn can_read_posts(member: &ChatMember) -> bool {
    matches!(
        member.kind,
        ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_)
    )
}

pub fn member_status(member: &ChatMember) -> &'static str {
    match member.kind {
        ChatMemberKind::Owner(_) => "owner",
        ChatMemberKind::Administrator(_) => "administrator",
        ChatMemberKind::Member => "member",
        ChatMemberKind::Restricted(_) => "restricted",
        ChatMemberKind::Left => "not a member",
        ChatMemberKind::Banned(_) => "banned",
    }
}

pub fn to_source_message(msg: &Message) -> SourceMessage {
    SourceMessage {
        chat_id: ChatId(msg.chat.id.0),
        id: MessageId(msg.id.0),
        date: msg.date,
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        media: media_of(msg),
        chat_title: msg.chat.title().map(str::to_string),
    }
}

fn media_of(msg: &Message) -> Option<MediaRef> {
    let (kind, file_id) = if let Some(sizes) = msg.photo() {
        // Largest size is last.
        (MediaKind::Photo, sizes.last()?.file.id.clone())
    } else if let Some(v) = msg.video() {
        (MediaKind::Video, v.file.id.clone())
    } else if let Some(a) = msg.animation() {
        (MediaKind::Animation, a.file.id.clone())
    } else if let Some(a) = msg.audio() {
        (MediaKind::Audio, a.file.id.clone())
    } else if let Some(d) = msg.document() {
        (MediaKind::Document, d.file.id.clone())
    } else {
        return None;
    };
    Some(MediaRef { kind, file_id })
}
