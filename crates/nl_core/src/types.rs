use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::source::MessageId;

/// Body of an email. At least one representation is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailContent {
    TextOnly { text: String },
    HtmlOnly { html: String },
    TextAndHtml { text: String, html: String },
}

impl EmailContent {
    pub fn text(&self) -> Option<&str> {
        match self {
            EmailContent::TextOnly { text } | EmailContent::TextAndHtml { text, .. } => Some(text),
            EmailContent::HtmlOnly { .. } => None,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            EmailContent::HtmlOnly { html } | EmailContent::TextAndHtml { html, .. } => Some(html),
            EmailContent::TextOnly { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub sender: String,
    pub date: DateTime<Utc>,
    pub subject: String,
    pub content: EmailContent,
    pub message_id: MessageId,
}

impl Email {
    /// Domain part of the sender address, lowercased.
    pub fn sender_domain(&self) -> Option<String> {
        self.sender
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim_end_matches('>').to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Newsletter {
    pub code: String,
    pub name: String,
    pub website_url: Url,
}

impl Newsletter {
    pub fn new(code: &str, name: &str, website_url: &str) -> crate::Result<Self> {
        Ok(Self {
            code: code.to_string(),
            name: name.to_string(),
            website_url: Url::parse(website_url)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: Url,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    pub date: DateTime<Utc>,
    pub newsletter: Newsletter,
    pub articles: Vec<Article>,
}

impl Publication {
    /// A publication without articles must never reach a sink.
    pub fn is_valid(&self) -> bool {
        !self.articles.is_empty()
    }

    /// Stable identity of an issue, independent of its articles.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.newsletter.code.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.date.to_rfc3339().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.title.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn publication(title: &str, articles: Vec<Article>) -> Publication {
        Publication {
            title: title.to_string(),
            date: Utc.with_ymd_and_hms(2023, 5, 4, 8, 0, 0).unwrap(),
            newsletter: Newsletter::new("kotlin-weekly", "Kotlin Weekly", "https://kotlinweekly.net").unwrap(),
            articles,
        }
    }

    #[test]
    fn test_content_accessors() {
        let both = EmailContent::TextAndHtml {
            text: "plain".to_string(),
            html: "<p>rich</p>".to_string(),
        };
        assert_eq!(both.text(), Some("plain"));
        assert_eq!(both.html(), Some("<p>rich</p>"));

        let html = EmailContent::HtmlOnly { html: "<p>rich</p>".to_string() };
        assert_eq!(html.text(), None);
    }

    #[test]
    fn test_publication_validity() {
        assert!(!publication("Issue #1", vec![]).is_valid());

        let article = Article {
            title: "Coroutines".to_string(),
            link: Url::parse("https://example.com/coroutines").unwrap(),
            description: String::new(),
        };
        assert!(publication("Issue #1", vec![article]).is_valid());
    }

    #[test]
    fn test_fingerprint_ignores_articles() {
        let a = publication("Issue #1", vec![]);
        let mut b = publication("Issue #1", vec![]);
        b.articles.push(Article {
            title: "x".to_string(),
            link: Url::parse("https://example.com").unwrap(),
            description: String::new(),
        });
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), publication("Issue #2", vec![]).fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
