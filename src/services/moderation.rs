//! Comment moderation
//!
//! Comments are checked against a fixed block-list before they are stored.
//! A word matches anywhere inside the text, ignoring case, so "РЕДИСКА" and
//! "редисками" are both rejected by the entry "редиска".

use crate::config::NewsConfig;
use crate::models::{CommentForm, REQUIRED_FIELD};

/// Bad-word filter for comment text
#[derive(Debug, Clone)]
pub struct Moderator {
    /// Lowercased block-list
    bad_words: Vec<String>,
    warning: String,
}

impl Moderator {
    pub fn new<I, S>(bad_words: I, warning: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bad_words: bad_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            warning: warning.into(),
        }
    }

    pub fn from_config(config: &NewsConfig) -> Self {
        Self::new(&config.bad_words, config.warning.clone())
    }

    /// Message attached to the `text` field when a bad word is found
    pub fn warning(&self) -> &str {
        &self.warning
    }

    /// First block-listed word contained in `text`, if any
    pub fn find_bad_word(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.bad_words
            .iter()
            .find(|word| text.contains(word.as_str()))
            .map(String::as_str)
    }

    /// Validate a bound comment form in place.
    ///
    /// Leading and trailing whitespace is stripped from the text. Returns
    /// `true` when the form is valid.
    pub fn clean(&self, form: &mut CommentForm) -> bool {
        let trimmed = form.text.trim();
        if trimmed.len() != form.text.len() {
            form.text = trimmed.to_string();
        }

        if form.text.is_empty() {
            form.errors.add("text", REQUIRED_FIELD);
        } else if let Some(word) = self.find_bad_word(&form.text) {
            tracing::debug!("Comment rejected: contains block-listed word {:?}", word);
            form.errors.add("text", self.warning.clone());
        }

        form.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn moderator() -> Moderator {
        Moderator::from_config(&NewsConfig::default())
    }

    #[test]
    fn test_default_block_list() {
        let m = moderator();
        assert_eq!(m.warning(), "Не ругайтесь!");
        assert_eq!(m.find_bad_word("Какой-то текст, редиска, еще текст"), Some("редиска"));
        assert_eq!(m.find_bad_word("ты негодяй"), Some("негодяй"));
        assert_eq!(m.find_bad_word("Текст комментария"), None);
    }

    #[test]
    fn test_match_ignores_case() {
        let m = moderator();
        assert_eq!(m.find_bad_word("РЕДИСКА!"), Some("редиска"));
        assert_eq!(m.find_bad_word("НеГоДяЙ"), Some("негодяй"));
    }

    #[test]
    fn test_block_list_entries_are_normalized() {
        let m = Moderator::new(["  Spam ", ""], "no");
        assert_eq!(m.find_bad_word("this is SPAM"), Some("spam"));
        assert_eq!(m.find_bad_word("clean"), None);
    }

    #[test]
    fn test_clean_rejects_bad_word() {
        let mut form = CommentForm::bound("Какой-то текст, негодяй, еще текст");

        assert!(!moderator().clean(&mut form));
        assert_eq!(form.errors.field("text"), ["Не ругайтесь!"]);
    }

    #[test]
    fn test_clean_requires_text() {
        let mut form = CommentForm::bound("   \n ");

        assert!(!moderator().clean(&mut form));
        assert_eq!(form.errors.field("text"), [REQUIRED_FIELD]);
        assert!(form.text.is_empty());
    }

    #[test]
    fn test_clean_accepts_and_trims() {
        let mut form = CommentForm::bound("  Текст комментария \n");

        assert!(moderator().clean(&mut form));
        assert_eq!(form.text, "Текст комментария");
        assert!(form.errors.is_empty());
    }

    proptest! {
        #[test]
        fn text_with_embedded_bad_word_is_rejected(
            prefix in "[a-zа-я ]{0,20}",
            suffix in "[a-zа-я ]{0,20}",
            idx in 0usize..2,
            upper in any::<bool>(),
        ) {
            let m = moderator();
            let word = ["редиска", "негодяй"][idx];
            let word = if upper { word.to_uppercase() } else { word.to_string() };
            let mut form = CommentForm::bound(format!("{prefix}{word}{suffix}"));

            prop_assert!(!m.clean(&mut form));
            prop_assert_eq!(form.errors.field("text"), [m.warning().to_string()]);
        }

        #[test]
        fn latin_text_is_never_flagged(text in "[a-zA-Z0-9 ,.!?]{1,80}") {
            prop_assert!(moderator().find_bad_word(&text).is_none());
        }
    }
}
