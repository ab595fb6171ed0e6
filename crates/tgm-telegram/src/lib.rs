//! Telegram adapter (teloxide).
//!
//! Implements the `tgm-core` ChannelClient port over the Bot API. The bot
//! must be an administrator of the source channels to receive their posts
//! and of the target channel to publish.

use std::{collections::HashSet, path::Path, sync::Arc};

use async_trait::async_trait;

use teloxide::{
    net::Download,
    prelude::*,
    types::{InputFile, Me},
};

use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod convert;
pub mod history;
pub mod poller;

use tgm_core::{
    config::Config,
    domain::{ChannelHandle, ChatId, MediaKind, MediaRef, OutgoingFile, SourceMessage},
    errors::Error,
    ports::ChannelClient,
    Result,
};

use crate::{
    convert::{can_read_posts, member_status, recipient},
    history::HistoryRing,
    poller::UpdateFeed,
};

/// Posts remembered per chat for `fetch_recent`.
pub const HISTORY_CAPACITY: usize = 100;
const LIVE_BUFFER: usize = 256;

pub struct TelegramChannelClient {
    bot: Bot,
    feed: UpdateFeed,
    history: Arc<Mutex<HistoryRing>>,
    me: Mutex<Option<Me>>,
    shutdown: CancellationToken,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramChannelClient {
    pub fn new(bot: Bot) -> Self {
        let history = Arc::new(Mutex::new(HistoryRing::new(HISTORY_CAPACITY)));
        Self {
            feed: UpdateFeed::new(bot.clone(), history.clone()),
            bot,
            history,
            me: Mutex::new(None),
            shutdown: CancellationToken::new(),
            poller: Mutex::new(None),
        }
    }

    /// The session credential is the bot token.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(Bot::new(cfg.session_string.clone()))
    }

    /// The bot's own account, fetched once.
    async fn me(&self) -> Result<Me> {
        let mut cached = self.me.lock().await;
        if let Some(me) = cached.as_ref() {
            return Ok(me.clone());
        }
        let me = self.with_retry(|| self.bot.get_me()).await?;
        *cached = Some(me.clone());
        Ok(me)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

fn display_name(me: &Me) -> String {
    match &me.user.username {
        Some(u) => format!("@{u}"),
        None => me.user.first_name.clone(),
    }
}

#[async_trait]
impl ChannelClient for TelegramChannelClient {
    async fn connect(&self) -> Result<()> {
        let me = self.me().await?;
        debug!(bot = %display_name(&me), "token verified");

        let drained = self.feed.drain_pending().await.map_err(Self::map_err)?;
        info!(drained, "Telegram session ready");
        Ok(())
    }

    async fn whoami(&self) -> Result<String> {
        Ok(display_name(&self.me().await?))
    }

    async fn resolve(&self, identifier: &str) -> Result<ChannelHandle> {
        let to = recipient(identifier);
        let chat = self
            .with_retry(|| self.bot.get_chat(to.clone()))
            .await
            .map_err(|e| Error::ChannelAccess {
                channel: identifier.to_string(),
                reason: e.to_string(),
            })?;

        let title = chat
            .title()
            .map(str::to_string)
            .or_else(|| chat.username().map(|u| format!("@{u}")))
            .unwrap_or_else(|| identifier.to_string());

        // get_chat succeeds for any public channel; posts only reach admins.
        let me = self.me().await?;
        let member = self
            .with_retry(|| self.bot.get_chat_member(chat.id, me.user.id))
            .await
            .map_err(|e| Error::ChannelAccess {
                channel: identifier.to_string(),
                reason: e.to_string(),
            })?;
        if !can_read_posts(&member) {
            return Err(Error::ChannelAccess {
                channel: identifier.to_string(),
                reason: format!(
                    "bot is {}; channel posts are only delivered to administrators",
                    member_status(&member)
                ),
            });
        }

        Ok(ChannelHandle {
            identifier: identifier.to_string(),
            chat_id: ChatId(chat.id.0),
            title,
        })
    }

    async fn fetch_recent(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<SourceMessage>> {
        Ok(self.history.lock().await.recent(channel.chat_id, limit))
    }

    async fn subscribe(&self, channels: &[ChannelHandle]) -> Result<mpsc::Receiver<SourceMessage>> {
        let mut poller = self.poller.lock().await;
        if poller.is_some() {
            return Err(Error::External("already subscribed".to_string()));
        }

        let watched: HashSet<ChatId> = channels.iter().map(|c| c.chat_id).collect();
        let (tx, rx) = mpsc::channel(LIVE_BUFFER);
        let feed = self.feed.clone();
        let shutdown = self.shutdown.child_token();
        *poller = Some(tokio::spawn(feed.run(watched, tx, shutdown)));
        Ok(rx)
    }

    async fn send_message(&self, destination: &str, text: &str) -> Result<()> {
        let to = recipient(destination);
        self.with_retry(|| self.bot.send_message(to.clone(), text.to_string()))
            .await?;
        Ok(())
    }

    async fn send_file(&self, destination: &str, file: OutgoingFile, caption: &str) -> Result<()> {
        let to = recipient(destination);
        let kind = file.kind();
        let input = match file {
            OutgoingFile::Remote(media) => InputFile::file_id(media.file_id),
            OutgoingFile::Local { path, .. } => InputFile::file(path),
        };
        let caption = caption.to_string();

        match kind {
            MediaKind::Photo => {
                self.with_retry(|| {
                    self.bot
                        .send_photo(to.clone(), input.clone())
                        .caption(caption.clone())
                })
                .await?
            }
            MediaKind::Video => {
                self.with_retry(|| {
                    self.bot
                        .send_video(to.clone(), input.clone())
                        .caption(caption.clone())
                })
                .await?
            }
            MediaKind::Animation => {
                self.with_retry(|| {
                    self.bot
                        .send_animation(to.clone(), input.clone())
                        .caption(caption.clone())
                })
                .await?
            }
            MediaKind::Audio => {
                self.with_retry(|| {
                    self.bot
                        .send_audio(to.clone(), input.clone())
                        .caption(caption.clone())
                })
                .await?
            }
            MediaKind::Document => {
                self.with_retry(|| {
                    self.bot
                        .send_document(to.clone(), input.clone())
                        .caption(caption.clone())
                })
                .await?
            }
        };
        Ok(())
    }

    async fn download_media(&self, media: &MediaRef, path: &Path) -> Result<()> {
        let file = self
            .with_retry(|| self.bot.get_file(media.file_id.clone()))
            .await?;

        let mut dst = tokio::fs::File::create(path).await?;
        self.bot
            .download_file(&file.path, &mut dst)
            .await
            .map_err(|e| Error::External(format!("telegram download error: {e}")))?;
        debug!(path = %path.display(), "media downloaded");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.shutdown.cancel();
        if let Some(handle) = self.poller.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("update poller ended abnormally: {e}");
            }
        }
        info!("Telegram session closed");
        Ok(())
    }
}
