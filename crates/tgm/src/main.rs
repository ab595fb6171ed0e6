use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tgm_core::{
    config::Config, dispatcher::Dispatcher, ports::ChannelClient, translator::Translator,
};
use tgm_telegram::TelegramChannelClient;
use tgm_translate::GoogleTranslator;

mod health;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tgm_core::logging::init("tgm")?;
    info!("Starting channel mirror");

    let cfg = Arc::new(Config::load().context("configuration error")?);
    cfg.log_summary();

    let client: Arc<dyn ChannelClient> = Arc::new(TelegramChannelClient::from_config(&cfg));
    let translator = if cfg.enable_translation {
        Translator::new(Arc::new(GoogleTranslator::from_config(&cfg)?))
    } else {
        Translator::offline()
    };

    let shutdown = CancellationToken::new();
    let mut dispatcher = Dispatcher::new(cfg.clone(), client, translator, shutdown.clone());

    if let Some(addr) = cfg.health_addr {
        tokio::spawn(health::serve(
            addr,
            dispatcher.state_updates(),
            shutdown.clone(),
        ));
    }
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let result = dispatcher.run().await;
    shutdown.cancel();
    info!("Shutting down bot gracefully");

    let copied = result.context("mirror stopped")?;
    info!(copied, "Backlog messages copied this run");
    Ok(())
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
