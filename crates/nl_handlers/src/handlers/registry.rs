use nl_core::{Email, Newsletter};

use super::{AndroidWeeklyHandler, KotlinWeeklyHandler, NewsletterHandler, TldrHandler};

/// Outcome of looking up the handler for an email.
pub enum Resolution<'a> {
    None,
    One(&'a NewsletterHandler),
    Ambiguous(Vec<&'a str>),
}

/// Ordered, immutable set of handlers built once at startup.
pub struct HandlerRegistry {
    handlers: Vec<NewsletterHandler>,
}

impl HandlerRegistry {
    pub fn new(handlers: Vec<NewsletterHandler>) -> Self {
        Self { handlers }
    }

    /// Every handler shipped with the crate.
    pub fn default_handlers() -> Self {
        Self::new(vec![
            NewsletterHandler::single(KotlinWeeklyHandler::new()),
            NewsletterHandler::single(AndroidWeeklyHandler::new()),
            NewsletterHandler::multiple(TldrHandler::new()),
        ])
    }

    pub fn resolve(&self, email: &Email) -> Resolution<'_> {
        let mut matching: Vec<&NewsletterHandler> = self.handlers.iter().filter(|h| h.can_handle(email)).collect();
        match matching.len() {
            0 => Resolution::None,
            1 => Resolution::One(matching.remove(0)),
            _ => Resolution::Ambiguous(matching.iter().map(|h| h.name()).collect()),
        }
    }

    /// All newsletters any handler can produce, in registration order.
    pub fn newsletters(&self) -> Vec<Newsletter> {
        self.handlers.iter().flat_map(|h| h.newsletters()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NewsletterHandler> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::default_handlers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::SingleFeedHandler;
    use chrono::{TimeZone, Utc};
    use nl_core::{Article, EmailContent, MessageId, Result};

    struct ByDomain(&'static str, &'static str);

    impl SingleFeedHandler for ByDomain {
        fn name(&self) -> &str {
            self.0
        }

        fn newsletter(&self) -> Newsletter {
            Newsletter::new(self.0, self.0, "https://example.com").unwrap()
        }

        fn can_handle(&self, email: &Email) -> bool {
            email.sender.ends_with(self.1)
        }

        fn extract_articles(&self, _email: &Email) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }
    }

    fn email(sender: &str, date: (i32, u32, u32)) -> Email {
        Email {
            sender: sender.to_string(),
            date: Utc.with_ymd_and_hms(date.0, date.1, date.2, 8, 0, 0).unwrap(),
            subject: "Issue".to_string(),
            content: EmailContent::TextOnly { text: String::new() },
            message_id: MessageId {
                folder: "INBOX".to_string(),
                sequence: 1,
                key: "k".to_string(),
            },
        }
    }

    #[test]
    fn test_default_handlers() {
        let registry = HandlerRegistry::default_handlers();
        assert_eq!(registry.len(), 3);

        let codes: Vec<_> = registry.newsletters().into_iter().map(|n| n.code).collect();
        assert_eq!(
            codes,
            vec!["kotlin-weekly", "android-weekly", "tldr-webdev", "tldr-ai", "tldr"]
        );
    }

    #[test]
    fn test_resolve() {
        let registry = HandlerRegistry::default_handlers();

        match registry.resolve(&email("mailer@kotlinweekly.net", (2023, 11, 12))) {
            Resolution::One(handler) => assert_eq!(handler.name(), "Kotlin Weekly"),
            _ => panic!("expected the Kotlin Weekly handler"),
        }
        match registry.resolve(&email("dan@tldrnewsletter.com", (2024, 1, 11))) {
            Resolution::One(handler) => assert_eq!(handler.name(), "TLDR"),
            _ => panic!("expected the TLDR handler"),
        }
        assert!(matches!(
            registry.resolve(&email("contact@androidweekly.net", (2024, 2, 4))),
            Resolution::None
        ));
        assert!(matches!(
            registry.resolve(&email("friend@example.org", (2023, 5, 1))),
            Resolution::None
        ));
    }

    #[test]
    fn test_ambiguous_resolution() {
        let registry = HandlerRegistry::new(vec![
            NewsletterHandler::single(ByDomain("first", "example.com")),
            NewsletterHandler::single(ByDomain("other", "example.org")),
            NewsletterHandler::single(ByDomain("second", "example.com")),
        ]);

        match registry.resolve(&email("news@example.com", (2023, 5, 1))) {
            Resolution::Ambiguous(names) => assert_eq!(names, vec!["first", "second"]),
            _ => panic!("expected an ambiguous resolution"),
        }
    }
}
