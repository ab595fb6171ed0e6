//! Long-polling loop for channel posts.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use teloxide::{
    prelude::*,
    types::{AllowedUpdate, Update, UpdateKind},
    RequestError,
};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tgm_core::domain::{ChatId, SourceMessage};

use crate::{convert::to_source_message, history::HistoryRing};

/// Kept below teloxide's default HTTP timeout (17s).
pub const POLL_TIMEOUT_SECS: u32 = 10;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// State shared by `connect` (draining) and the live poller.
#[derive(Clone)]
pub struct UpdateFeed {
    bot: Bot,
    offset: Arc<AtomicI32>,
    history: Arc<Mutex<HistoryRing>>,
}

impl UpdateFeed {
    pub fn new(bot: Bot, history: Arc<Mutex<HistoryRing>>) -> Self {
        Self {
            bot,
            offset: Arc::new(AtomicI32::new(0)),
            history,
        }
    }

    async fn fetch(&self, timeout: u32) -> Result<Vec<Update>, RequestError> {
        self.bot
            .get_updates()
            .offset(self.offset.load(Ordering::SeqCst))
            .timeout(timeout)
            .allowed_updates(vec![AllowedUpdate::ChannelPost])
            .send()
            .await
    }

    /// Acknowledge the update and return the channel post it carries, if
    /// any, after storing it in history.
    async fn absorb(&self, update: Update) -> Option<SourceMessage> {
        self.offset.fetch_max(update.id + 1, Ordering::SeqCst);
        match update.kind {
            UpdateKind::ChannelPost(m) => {
                let msg = to_source_message(&m);
                self.history.lock().await.record(msg.clone());
                Some(msg)
            }
            _ => None,
        }
    }

    /// Consume everything already queued on the server so history holds the
    /// backlog. Returns the number of channel posts seen.
    pub async fn drain_pending(&self) -> Result<usize, RequestError> {
        let mut posts = 0;
        loop {
            let updates = self.fetch(0).await?;
            if updates.is_empty() {
                return Ok(posts);
            }
            for u in updates {
                if self.absorb(u).await.is_some() {
                    posts += 1;
                }
            }
        }
    }

    /// Forward posts from `watched` chats until cancelled or the receiver
    /// goes away.
    pub async fn run(
        self,
        watched: HashSet<ChatId>,
        tx: mpsc::Sender<SourceMessage>,
        shutdown: CancellationToken,
    ) {
        loop {
            let batch = tokio::select! {
                _ = shutdown.cancelled() => break,
                r = self.fetch(POLL_TIMEOUT_SECS) => r,
            };

            match batch {
                Ok(updates) => {
                    for u in updates {
                        let Some(msg) = self.absorb(u).await else {
                            continue;
                        };
                        if !watched.contains(&msg.chat_id) {
                            debug!(chat = msg.chat_id.0, "post from unwatched chat");
                            continue;
                        }
                        if tx.send(msg).await.is_err() {
                            return;
                        }
                    }
                }
                Err(RequestError::RetryAfter(d)) => {
                    warn!(?d, "telegram flood control, backing off");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(d) => {}
                    }
                }
                Err(e) => {
                    warn!("getUpdates failed: {e}");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }
        debug!("update poller stopped");
    }
}
