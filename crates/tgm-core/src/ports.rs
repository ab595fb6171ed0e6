use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    domain::{ChannelHandle, MediaRef, OutgoingFile, SourceMessage},
    Result,
};

/// Hexagonal port for the messaging platform.
///
/// Connection, session and update delivery live in the adapter. Live updates
/// are handed over through a single-consumer channel so the dispatcher owns
/// all mutable state without locks.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Establish the session. Called once before anything else.
    async fn connect(&self) -> Result<()>;

    /// Display name of the logged-in account.
    async fn whoami(&self) -> Result<String>;

    async fn resolve(&self, identifier: &str) -> Result<ChannelHandle>;

    /// Most recent messages of a channel, newest first, at most `limit`.
    async fn fetch_recent(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<SourceMessage>>;

    /// Start delivering new messages posted to `channels`. The stream ends
    /// when the client disconnects.
    async fn subscribe(&self, channels: &[ChannelHandle]) -> Result<mpsc::Receiver<SourceMessage>>;

    async fn send_message(&self, destination: &str, text: &str) -> Result<()>;

    async fn send_file(&self, destination: &str, file: OutgoingFile, caption: &str) -> Result<()>;

    /// Download a media payload to `path`.
    async fn download_media(&self, media: &MediaRef, path: &Path) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}

/// Hexagonal port for machine translation.
#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, dest_lang: &str) -> Result<String>;
}
