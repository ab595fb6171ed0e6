use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::info;

use crate::{errors::Error, Result};

const DEFAULT_SOURCE_CHANNEL: &str = "@myachPRO";
const DEFAULT_TARGET_CHANNEL: &str = "@livefootball671";
const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Typed run configuration, loaded once at startup and shared by `Arc`.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub api_id: i32,
    pub api_hash: String,
    pub session_string: String,

    // Routing
    pub source_channels: Vec<String>,
    pub target_channel: String,

    // Filters (already lower-cased)
    pub keywords: Vec<String>,
    pub blocked_words: Vec<String>,

    // Behavior flags
    pub remove_source: bool,
    pub enable_translation: bool,

    // Backlog and limits
    pub backlog_limit: usize,
    /// Cap for every outgoing body, captions and text posts alike.
    pub caption_limit: usize,

    // Pacing
    pub pacing: Pacing,

    // Translation service
    pub translate_endpoint: String,
    pub translation_timeout: Duration,

    // Files
    pub download_dir: PathBuf,

    // Health endpoint (None = disabled)
    pub health_addr: Option<SocketAddr>,
}

/// Fixed delays between API-heavy steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// After each message copied during backlog replay.
    pub backfill: Duration,
    /// Before copying a live message.
    pub live: Duration,
    /// After each call to the translation service.
    pub translation: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            backfill: Duration::from_millis(2000),
            live: Duration::from_millis(1000),
            translation: Duration::from_millis(1000),
        }
    }
}

impl Pacing {
    /// No waiting at all (tests, dry runs).
    pub fn immediate() -> Self {
        Self {
            backfill: Duration::ZERO,
            live: Duration::ZERO,
            translation: Duration::ZERO,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        let cfg = Self::from_lookup(|key| env::var(key).ok())?;
        fs::create_dir_all(&cfg.download_dir)?;
        Ok(cfg)
    }

    /// Build from an arbitrary key lookup. Does not touch the filesystem.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        // Required values first, so nothing else runs on a broken setup.
        let api_id_raw = get("API_ID").unwrap_or_default();
        let api_id = if api_id_raw.is_empty() {
            0
        } else {
            api_id_raw
                .parse::<i32>()
                .map_err(|_| Error::Config(format!("API_ID must be an integer, got {api_id_raw:?}")))?
        };
        let api_hash = get("API_HASH").unwrap_or_default();
        if api_id == 0 || api_hash.is_empty() {
            return Err(Error::Config(
                "API_ID or API_HASH is missing from the environment".to_string(),
            ));
        }

        let session_string = get("SESSION_STRING").unwrap_or_default();
        if session_string.is_empty() {
            return Err(Error::Config(
                "SESSION_STRING is missing from the environment".to_string(),
            ));
        }

        let source_channels = get("SOURCE_CHANNELS")
            .map(|v| parse_csv(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_SOURCE_CHANNEL.to_string()]);
        let target_channel = get("TARGET_CHANNEL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_TARGET_CHANNEL.to_string());

        let keywords = parse_csv_lower(get("KEYWORDS"));
        let blocked_words = parse_csv_lower(get("BLOCKED_WORDS"));

        let remove_source = get("REMOVE_SOURCE").map(|v| parse_bool(&v)).unwrap_or(true);
        let enable_translation = get("ENABLE_TRANSLATION")
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        let backlog_limit = parse_num(get("BACKLOG_LIMIT"), "BACKLOG_LIMIT")?.unwrap_or(50);
        let caption_limit = parse_num(get("CAPTION_LIMIT"), "CAPTION_LIMIT")?.unwrap_or(1024);
        if caption_limit < 4 {
            return Err(Error::Config(
                "CAPTION_LIMIT must be at least 4".to_string(),
            ));
        }

        let defaults = Pacing::default();
        let pacing = Pacing {
            backfill: parse_millis(get("BACKFILL_DELAY_MS"), "BACKFILL_DELAY_MS")?
                .unwrap_or(defaults.backfill),
            live: parse_millis(get("LIVE_DELAY_MS"), "LIVE_DELAY_MS")?.unwrap_or(defaults.live),
            translation: parse_millis(get("TRANSLATION_DELAY_MS"), "TRANSLATION_DELAY_MS")?
                .unwrap_or(defaults.translation),
        };

        let translate_endpoint = get("TRANSLATE_ENDPOINT")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_TRANSLATE_ENDPOINT.to_string());
        let translation_timeout = parse_millis(get("TRANSLATION_TIMEOUT_MS"), "TRANSLATION_TIMEOUT_MS")?
            .unwrap_or(Duration::from_secs(10));

        let download_dir = PathBuf::from(
            get("DOWNLOAD_DIR")
                .and_then(non_empty)
                .unwrap_or_else(|| "./downloads".to_string()),
        );

        let health_addr = match get("HEALTH_ADDR") {
            Some(v) if v.is_empty() => None,
            Some(v) => Some(
                v.parse::<SocketAddr>()
                    .map_err(|e| Error::Config(format!("HEALTH_ADDR {v:?} is invalid: {e}")))?,
            ),
            None => Some(SocketAddr::from(([0, 0, 0, 0], 3000))),
        };

        Ok(Self {
            api_id,
            api_hash,
            session_string,
            source_channels,
            target_channel,
            keywords,
            blocked_words,
            remove_source,
            enable_translation,
            backlog_limit,
            caption_limit,
            pacing,
            translate_endpoint,
            translation_timeout,
            download_dir,
            health_addr,
        })
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_summary(&self) {
        info!(api_id = self.api_id, "API_ID");
        info!("API_HASH: {}", mask(&self.api_hash));
        info!("SESSION_STRING: {}", mask(&self.session_string));
        info!("SOURCE_CHANNELS: {}", self.source_channels.join(", "));
        info!("TARGET_CHANNEL: {}", self.target_channel);
        if self.keywords.is_empty() {
            info!("KEYWORDS: none (all messages will be copied)");
        } else {
            info!("KEYWORDS: {}", self.keywords.join(", "));
        }
        info!("BLOCKED_WORDS: {}", self.blocked_words.join(", "));
        info!("REMOVE_SOURCE: {}", self.remove_source);
        info!(
            "TRANSLATION: {}",
            if self.enable_translation {
                "enabled (ru -> en)"
            } else {
                "disabled"
            }
        );
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "missing"
    } else {
        "set"
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

/// Anything but an explicit "off" value counts as true.
fn parse_bool(v: &str) -> bool {
    !matches!(
        v.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

fn parse_num(v: Option<String>, key: &str) -> Result<Option<usize>> {
    match v.and_then(non_empty) {
        None => Ok(None),
        Some(s) => s
            .parse::<usize>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {s:?}"))),
    }
}

fn parse_millis(v: Option<String>, key: &str) -> Result<Option<Duration>> {
    match v.and_then(non_empty) {
        None => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| Error::Config(format!("{key} must be milliseconds, got {s:?}"))),
    }
}

fn parse_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_csv_lower(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
