//! Backlog replay followed by live mirroring.
//!
//! The dispatcher owns every piece of mutable state (processed keys, channel
//! cache) and is driven by a single task, so nothing here needs a lock.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    channels::ChannelEntityCache,
    cleaner::clean,
    config::Config,
    dedupe::Deduplicator,
    domain::{ChannelHandle, MediaKind, MediaRef, OutgoingFile, SourceMessage},
    errors::Error,
    filter::ContentFilter,
    formatting::{apply_source_policy, default_media_caption, BodyKind},
    ports::ChannelClient,
    translator::Translator,
    utils::{preview, start_of_today, truncate_caption},
    Result,
};

const UNKNOWN_CHANNEL: &str = "Unknown Channel";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    Uninitialized,
    Initializing,
    BackfillReplay,
    LiveMonitoring,
    ShuttingDown,
    Stopped,
}

impl DispatcherState {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatcherState::Uninitialized => "uninitialized",
            DispatcherState::Initializing => "initializing",
            DispatcherState::BackfillReplay => "backfill_replay",
            DispatcherState::LiveMonitoring => "live_monitoring",
            DispatcherState::ShuttingDown => "shutting_down",
            DispatcherState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a copied message reached the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Text,
    MediaPrimary,
    MediaFallback,
    /// Nothing left to send after cleaning (e.g. a text post that was only a
    /// handle).
    Nothing,
}

/// Result of handling one live message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Copied(Delivery),
    Duplicate,
    Filtered,
}

pub struct Dispatcher {
    cfg: Arc<Config>,
    client: Arc<dyn ChannelClient>,
    translator: Translator,
    filter: ContentFilter,
    processed: Deduplicator,
    channels: ChannelEntityCache,
    state: watch::Sender<DispatcherState>,
    shutdown: CancellationToken,
    temp_counter: AtomicU64,
}

impl Dispatcher {
    pub fn new(
        cfg: Arc<Config>,
        client: Arc<dyn ChannelClient>,
        translator: Translator,
        shutdown: CancellationToken,
    ) -> Self {
        let filter = ContentFilter::new(cfg.keywords.clone(), cfg.blocked_words.clone());
        let (state, _) = watch::channel(DispatcherState::Uninitialized);
        Self {
            cfg,
            client,
            translator,
            filter,
            processed: Deduplicator::new(),
            channels: ChannelEntityCache::default(),
            state,
            shutdown,
            temp_counter: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    /// Observe state transitions (health endpoint, tests).
    pub fn state_updates(&self) -> watch::Receiver<DispatcherState> {
        self.state.subscribe()
    }

    pub fn processed(&self) -> &Deduplicator {
        &self.processed
    }

    pub fn channels(&self) -> &ChannelEntityCache {
        &self.channels
    }

    fn set_state(&self, next: DispatcherState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = %prev, to = %next, "dispatcher state");
        }
    }

    /// Full lifecycle: initialize, replay today's backlog, mirror live until
    /// the stream closes or shutdown is requested, then disconnect.
    ///
    /// Returns the number of backlog messages copied.
    pub async fn run(&mut self) -> Result<usize> {
        let result = self.run_until_stopped().await;
        if let Err(e) = &result {
            error!("Fatal error: {e}");
        }
        self.shutdown().await;
        result
    }

    async fn run_until_stopped(&mut self) -> Result<usize> {
        self.initialize().await?;
        if self.shutdown.is_cancelled() {
            return Ok(0);
        }

        let copied = self.backfill().await;
        info!(
            copied,
            translation = self.cfg.enable_translation,
            "Bot is now active, monitoring for new messages"
        );

        self.monitor().await?;
        Ok(copied)
    }

    /// Connect, then resolve every source and read one message from it.
    /// Any failure aborts the whole run.
    pub async fn initialize(&mut self) -> Result<()> {
        self.set_state(DispatcherState::Initializing);

        self.client.connect().await?;
        let me = self.client.whoami().await?;
        info!("Connected, logged in as {me}");
        info!(
            sources = %self.cfg.source_channels.join(", "),
            target = %self.cfg.target_channel,
            "Initializing channel access"
        );

        for identifier in self.cfg.source_channels.clone() {
            info!("Testing access to {identifier}");
            let handle = self
                .client
                .resolve(&identifier)
                .await
                .map_err(|e| access_error(&identifier, e))?;
            info!("Successfully accessed {}", handle.title);

            let recent = self
                .client
                .fetch_recent(&handle, 1)
                .await
                .map_err(|e| access_error(&identifier, e))?;
            match recent.first() {
                Some(msg) => match msg.text.as_deref().filter(|t| !t.is_empty()) {
                    Some(text) => info!("Last message preview: {}", preview(text, 50)),
                    None => info!("Last message preview: [Media Message]"),
                },
                None => info!("No recent messages found in {identifier}"),
            }

            self.channels.insert(handle);
        }
        Ok(())
    }

    /// Copy today's messages from every source, oldest first.
    pub async fn backfill(&mut self) -> usize {
        self.set_state(DispatcherState::BackfillReplay);
        info!("Copying today's messages...");

        let since = start_of_today();
        let handles = self.channels.handles().to_vec();
        let mut total = 0;

        for channel in &handles {
            if self.shutdown.is_cancelled() {
                break;
            }
            match self.backfill_channel(channel, since).await {
                Ok(n) => total += n,
                Err(e) => error!(channel = %channel.identifier, "Error scanning channel: {e}"),
            }
        }

        info!(total, "Backlog complete, switching to real-time monitoring");
        total
    }

    async fn backfill_channel(
        &mut self,
        channel: &ChannelHandle,
        since: DateTime<Utc>,
    ) -> Result<usize> {
        info!("Scanning today's messages from {}", channel.title);
        let recent = self
            .client
            .fetch_recent(channel, self.cfg.backlog_limit)
            .await?;
        let todays = select_backlog(recent, since);
        info!(count = todays.len(), "Found messages from today");

        let mut copied = 0;
        for msg in todays {
            if self.shutdown.is_cancelled() {
                break;
            }

            let key = msg.key();
            if self.processed.seen(&key) {
                continue;
            }

            info!(%key, content = %preview(msg.text_or_empty(), 80), "Processing message from today");
            // Rejected messages stay unmarked so a later live event can
            // re-evaluate them.
            if !self.filter.should_copy(msg.text_or_empty()) {
                continue;
            }

            match self.copy(&msg, &channel.title).await {
                Ok(delivery) => debug!(%key, ?delivery, "backlog message copied"),
                Err(e) => warn!(%key, "Copy failed: {e}"),
            }
            self.processed.mark_seen(key);
            copied += 1;

            self.pause(self.cfg.pacing.backfill).await;
        }
        Ok(copied)
    }

    /// Mirror new messages until the stream ends or shutdown is requested.
    pub async fn monitor(&mut self) -> Result<()> {
        info!("Setting up real-time monitoring...");
        let handles = self.channels.handles().to_vec();
        let mut updates = self.client.subscribe(&handles).await?;
        self.set_state(DispatcherState::LiveMonitoring);
        for h in &handles {
            info!("Now listening to {}", h.identifier);
        }

        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, leaving live monitoring");
                    break;
                }
                next = updates.recv() => match next {
                    Some(msg) => {
                        if let Err(e) = self.handle_live(msg).await {
                            error!("Error processing message: {e}");
                        }
                    }
                    None => {
                        warn!("Live update stream closed");
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    /// One live message: dedupe, mark, filter, pace, copy.
    pub async fn handle_live(&mut self, msg: SourceMessage) -> Result<Outcome> {
        let key = msg.key();
        let title = self.title_for(&msg);
        info!(
            from = %title,
            message_id = msg.id.0,
            content = %preview(msg.text_or_empty(), 100),
            "New message detected"
        );

        if self.processed.seen(&key) {
            info!(%key, "Already processed, skipping");
            return Ok(Outcome::Duplicate);
        }
        // Marked before any await so a rapid duplicate cannot slip through.
        self.processed.mark_seen(key);

        if !self.filter.should_copy(msg.text_or_empty()) {
            return Ok(Outcome::Filtered);
        }

        info!("Filters passed, copying message...");
        self.pause(self.cfg.pacing.live).await;

        let delivery = self.copy(&msg, &title).await?;
        if delivery != Delivery::Nothing {
            info!(target = %self.cfg.target_channel, "Message copied");
        }
        Ok(Outcome::Copied(delivery))
    }

    pub async fn shutdown(&mut self) {
        self.set_state(DispatcherState::ShuttingDown);
        if let Err(e) = self.client.disconnect().await {
            warn!("Disconnect failed: {e}");
        }
        self.set_state(DispatcherState::Stopped);
        info!(processed = self.processed.len(), "Stopped");
    }

    fn title_for(&self, msg: &SourceMessage) -> String {
        self.channels
            .by_chat(msg.chat_id)
            .map(|h| h.title.clone())
            .or_else(|| msg.chat_title.clone())
            .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string())
    }

    async fn copy(&self, msg: &SourceMessage, title: &str) -> Result<Delivery> {
        if let Some(media) = &msg.media {
            return self.copy_media(msg, media, title).await;
        }
        if msg.text_or_empty().is_empty() {
            return Ok(Delivery::Nothing);
        }
        self.copy_text(msg, title).await
    }

    /// Clean, translate, then apply the source policy.
    async fn render(&self, msg: &SourceMessage, kind: BodyKind, title: &str) -> String {
        let mut body = clean(msg.text.as_deref());
        if !body.is_empty() && self.cfg.enable_translation {
            body = self.translator.translate(&body).await;
            self.pause(self.cfg.pacing.translation).await;
        }
        apply_source_policy(&body, kind, self.cfg.remove_source, title)
    }

    async fn copy_text(&self, msg: &SourceMessage, title: &str) -> Result<Delivery> {
        let body = self.render(msg, BodyKind::Text, title).await;
        if body.is_empty() {
            warn!(key = %msg.key(), "Nothing left to send after cleaning");
            return Ok(Delivery::Nothing);
        }
        let body = truncate_caption(&body, self.cfg.caption_limit);

        info!("Sending text to target channel...");
        self.client
            .send_message(&self.cfg.target_channel, &body)
            .await?;
        info!("Text sent successfully");
        Ok(Delivery::Text)
    }

    /// Send by reference first; only if that fails, download and upload a
    /// local copy. The fallback's error is the final outcome.
    async fn copy_media(
        &self,
        msg: &SourceMessage,
        media: &MediaRef,
        title: &str,
    ) -> Result<Delivery> {
        let label = media.kind.label();
        info!("Processing {}...", label.to_lowercase());

        let mut caption = self.render(msg, BodyKind::Caption, title).await;
        if caption.is_empty() {
            caption = default_media_caption(media.kind);
        }
        let caption = truncate_caption(&caption, self.cfg.caption_limit);

        let primary = self
            .client
            .send_file(
                &self.cfg.target_channel,
                OutgoingFile::Remote(media.clone()),
                &caption,
            )
            .await;

        match primary {
            Ok(()) => {
                info!("{label} sent successfully");
                Ok(Delivery::MediaPrimary)
            }
            Err(e) => {
                warn!("Primary method failed: {e}");
                self.fallback_media_send(media, &caption).await?;
                Ok(Delivery::MediaFallback)
            }
        }
    }

    async fn fallback_media_send(&self, media: &MediaRef, caption: &str) -> Result<()> {
        info!("Trying fallback method...");
        let path = self.temp_path(media.kind);

        let result = async {
            self.client.download_media(media, &path).await?;
            self.client
                .send_file(
                    &self.cfg.target_channel,
                    OutgoingFile::Local {
                        kind: media.kind,
                        path: path.clone(),
                    },
                    caption,
                )
                .await
        }
        .await;

        remove_temp_file(&path).await;

        match result {
            Ok(()) => {
                info!("{} sent via fallback method", media.kind.label());
                Ok(())
            }
            Err(e) => {
                error!("Fallback also failed: {e}");
                Err(Error::Delivery(format!("fallback media send failed: {e}")))
            }
        }
    }

    fn temp_path(&self, kind: MediaKind) -> PathBuf {
        let ts = Utc::now().timestamp_millis();
        let n = self.temp_counter.fetch_add(1, Ordering::SeqCst);
        self.cfg.download_dir.join(format!(
            "temp_{}_{ts}_{n}.{}",
            kind.label().to_lowercase(),
            kind.extension()
        ))
    }

    /// Throttle delay; cut short by shutdown.
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.shutdown.cancelled() => {}
        }
    }
}

/// Keep messages dated at or after `since`, oldest first.
pub fn select_backlog(messages: Vec<SourceMessage>, since: DateTime<Utc>) -> Vec<SourceMessage> {
    let mut todays: Vec<SourceMessage> = messages.into_iter().filter(|m| m.date >= since).collect();
    todays.sort_by_key(|m| (m.date, m.id.0));
    todays
}

fn access_error(channel: &str, e: Error) -> Error {
    match e {
        Error::ChannelAccess { .. } => e,
        other => Error::ChannelAccess {
            channel: channel.to_string(),
            reason: other.to_string(),
        },
    }
}

async fn remove_temp_file(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Failed to remove temp file: {e}");
        }
    }
}
