//! Russian → English translation with an offline fallback.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{ports::TranslationService, utils::preview};

pub const SOURCE_LANG: &str = "ru";
pub const DEST_LANG: &str = "en";

/// Appended when the fallback dictionary changed anything.
pub const AUTO_TRANSLATED_MARKER: &str = " [Auto-Translated]";

/// Fallback dictionary, applied top to bottom as literal substring
/// replacements. Results depend on this order wherever keys overlap with
/// other words ("гол" also rewrites the start of "голкипер"), so keep it
/// stable.
pub const FALLBACK_DICTIONARY: &[(&str, &str)] = &[
    // Football terms
    ("футбол", "football"),
    ("Футбол", "Football"),
    ("матч", "match"),
    ("Матч", "Match"),
    ("гол", "goal"),
    ("Гол", "Goal"),
    ("команда", "team"),
    ("Команда", "Team"),
    ("игра", "game"),
    ("Игра", "Game"),
    ("лига", "league"),
    ("Лига", "League"),
    ("чемпионат", "championship"),
    ("Чемпионат", "Championship"),
    ("счет", "score"),
    ("Счет", "Score"),
    ("победа", "victory"),
    ("Победа", "Victory"),
    ("поражение", "defeat"),
    ("Поражение", "Defeat"),
    ("ничья", "draw"),
    ("Ничья", "Draw"),
    ("турнир", "tournament"),
    ("Турнир", "Tournament"),
    ("сезон", "season"),
    ("Сезон", "Season"),
    ("болельщик", "fan"),
    ("Болельщик", "Fan"),
    ("тренер", "coach"),
    ("Тренер", "Coach"),
    ("игрок", "player"),
    ("Игрок", "Player"),
    ("вратарь", "goalkeeper"),
    ("Вратарь", "Goalkeeper"),
    ("нападающий", "forward"),
    ("Нападающий", "Forward"),
    ("защитник", "defender"),
    ("Защитник", "Defender"),
    // Common words
    ("сегодня", "today"),
    ("Сегодня", "Today"),
    ("завтра", "tomorrow"),
    ("Завтра", "Tomorrow"),
    ("вчера", "yesterday"),
    ("Вчера", "Yesterday"),
    ("новость", "news"),
    ("Новость", "News"),
    ("новости", "news"),
    ("Новости", "News"),
    ("смотреть", "watch"),
    ("Смотреть", "Watch"),
    ("онлайн", "online"),
    ("Онлайн", "Online"),
    ("прямая", "live"),
    ("Прямая", "Live"),
    ("трансляция", "broadcast"),
    ("Трансляция", "Broadcast"),
    ("результат", "result"),
    ("Результат", "Result"),
    ("обзор", "review"),
    ("Обзор", "Review"),
    ("анонс", "announcement"),
    ("Анонс", "Announcement"),
];

/// Best-effort word substitution. Returns the input unchanged when nothing
/// matched, otherwise the substituted text plus [`AUTO_TRANSLATED_MARKER`].
pub fn fallback_translate(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut translated = text.to_string();
    for (russian, english) in FALLBACK_DICTIONARY {
        translated = translated.replace(russian, english);
    }

    if translated != text {
        translated.push_str(AUTO_TRANSLATED_MARKER);
        return translated;
    }
    text.to_string()
}

/// Translator used by the dispatcher. Never fails: every service error
/// degrades to [`fallback_translate`].
#[derive(Clone, Default)]
pub struct Translator {
    service: Option<Arc<dyn TranslationService>>,
}

impl Translator {
    pub fn new(service: Arc<dyn TranslationService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Dictionary-only translator.
    pub fn offline() -> Self {
        Self { service: None }
    }

    pub async fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let Some(service) = &self.service else {
            return fallback_translate(text);
        };

        info!("Translating text...");
        match service.translate(text, SOURCE_LANG, DEST_LANG).await {
            Ok(translated) if !translated.trim().is_empty() => {
                info!(
                    original = %preview(text, 80),
                    translated = %preview(&translated, 80),
                    "Translation successful"
                );
                translated
            }
            Ok(_) => {
                warn!("Translation service returned empty text, using fallback");
                fallback_translate(text)
            }
            Err(e) => {
                warn!("Translation failed, using fallback: {e}");
                fallback_translate(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{errors::Error, Result};

    struct ScriptedService {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn new(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(|s| s.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranslationService for ScriptedService {
        async fn translate(&self, _text: &str, source: &str, dest: &str) -> Result<String> {
            assert_eq!((source, dest), ("ru", "en"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .ok_or_else(|| Error::Translation("quota exceeded".to_string()))
        }
    }

    #[test]
    fn dictionary_has_a_capitalized_variant_for_every_word() {
        assert_eq!(FALLBACK_DICTIONARY.len(), 62);
        for pair in FALLBACK_DICTIONARY.chunks(2) {
            let (lower, upper) = (pair[0].0, pair[1].0);
            let mut chars = lower.chars();
            let first = chars.next().unwrap().to_uppercase().collect::<String>();
            assert_eq!(format!("{first}{}", chars.as_str()), upper);
        }
    }

    #[test]
    fn fallback_substitutes_and_marks() {
        assert_eq!(fallback_translate("гол сегодня"), "goal today [Auto-Translated]");
        assert_eq!(
            fallback_translate("Смотреть футбол сегодня"),
            "Watch football today [Auto-Translated]"
        );
    }

    #[test]
    fn fallback_without_matches_returns_input_unchanged() {
        assert_eq!(fallback_translate("Привет, мир"), "Привет, мир");
        assert_eq!(fallback_translate("already english"), "already english");
        assert_eq!(fallback_translate(""), "");
    }

    #[test]
    fn fallback_replaces_inside_longer_words() {
        // Literal substring replacement: "голкипер" is not a dictionary word.
        assert_eq!(
            fallback_translate("голкипер"),
            "goalкипер [Auto-Translated]"
        );
    }

    #[tokio::test]
    async fn uses_service_result_when_available() {
        let service = Arc::new(ScriptedService::new(Some("Goal today")));
        let translator = Translator::new(service.clone());
        assert_eq!(translator.translate("Гол сегодня").await, "Goal today");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn service_failure_degrades_to_dictionary() {
        let translator = Translator::new(Arc::new(ScriptedService::new(None)));
        assert_eq!(
            translator.translate("гол сегодня").await,
            "goal today [Auto-Translated]"
        );
    }

    #[tokio::test]
    async fn empty_service_reply_degrades_to_dictionary() {
        let translator = Translator::new(Arc::new(ScriptedService::new(Some("  "))));
        assert_eq!(translator.translate("матч").await, "match [Auto-Translated]");
    }

    #[tokio::test]
    async fn blank_input_skips_the_service() {
        let service = Arc::new(ScriptedService::new(Some("x")));
        let translator = Translator::new(service.clone());
        assert_eq!(translator.translate("   ").await, "");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_translator_uses_dictionary() {
        assert_eq!(Translator::offline().translate("обзор").await, "review [Auto-Translated]");
    }
}
