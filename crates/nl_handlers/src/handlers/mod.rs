use std::collections::BTreeMap;

use nl_core::{Article, Email, Newsletter, Publication, Result};

pub mod android_weekly;
pub mod kotlin_weekly;
pub mod registry;
pub mod tldr;

pub use android_weekly::AndroidWeeklyHandler;
pub use kotlin_weekly::KotlinWeeklyHandler;
pub use registry::{HandlerRegistry, Resolution};
pub use tldr::TldrHandler;

/// A handler for a source that publishes exactly one newsletter.
pub trait SingleFeedHandler: Send + Sync {
    /// Returns the handler name used in logs and reports
    fn name(&self) -> &str;

    fn newsletter(&self) -> Newsletter;

    /// Returns true if this handler knows how to read the given email
    fn can_handle(&self, email: &Email) -> bool;

    /// Extracts the articles of one issue. Must not touch anything but `email`.
    fn extract_articles(&self, email: &Email) -> Result<Vec<Article>>;
}

/// A handler for a source that sends several newsletters from one address.
pub trait MultipleFeedsHandler: Send + Sync {
    fn name(&self) -> &str;

    fn newsletters(&self) -> Vec<Newsletter>;

    fn can_handle(&self, email: &Email) -> bool;

    fn extract_articles(&self, email: &Email) -> Result<BTreeMap<Newsletter, Vec<Article>>>;
}

/// Every registered handler is one of the two shapes.
pub enum NewsletterHandler {
    Single(Box<dyn SingleFeedHandler>),
    Multiple(Box<dyn MultipleFeedsHandler>),
}

impl NewsletterHandler {
    pub fn single(handler: impl SingleFeedHandler + 'static) -> Self {
        NewsletterHandler::Single(Box::new(handler))
    }

    pub fn multiple(handler: impl MultipleFeedsHandler + 'static) -> Self {
        NewsletterHandler::Multiple(Box::new(handler))
    }

    pub fn name(&self) -> &str {
        match self {
            NewsletterHandler::Single(h) => h.name(),
            NewsletterHandler::Multiple(h) => h.name(),
        }
    }

    pub fn newsletters(&self) -> Vec<Newsletter> {
        match self {
            NewsletterHandler::Single(h) => vec![h.newsletter()],
            NewsletterHandler::Multiple(h) => h.newsletters(),
        }
    }

    pub fn can_handle(&self, email: &Email) -> bool {
        match self {
            NewsletterHandler::Single(h) => h.can_handle(email),
            NewsletterHandler::Multiple(h) => h.can_handle(email),
        }
    }

    /// Runs the extraction and wraps the result into publications dated and
    /// titled after the email. Publications may still be empty here.
    pub fn extract_publications(&self, email: &Email) -> Result<Vec<Publication>> {
        let publication = |newsletter: Newsletter, articles: Vec<Article>| Publication {
            title: email.subject.clone(),
            date: email.date,
            newsletter,
            articles,
        };

        match self {
            NewsletterHandler::Single(h) => Ok(vec![publication(h.newsletter(), h.extract_articles(email)?)]),
            NewsletterHandler::Multiple(h) => Ok(h
                .extract_articles(email)?
                .into_iter()
                .map(|(newsletter, articles)| publication(newsletter, articles))
                .collect()),
        }
    }
}

/// Common utilities for handlers
pub(crate) mod utils {
    use lazy_static::lazy_static;
    use nl_core::{Email, Error, Result};
    use nl_dom::{clean_html, collapse_whitespace};
    use regex_lite::Regex;
    use scraper::{ElementRef, Html, Selector};
    use url::Url;

    lazy_static! {
        static ref READING_TIME: Regex =
            Regex::new(r"\s*\((\d+ minute read|GitHub Repo|Website|Sponsor)\)\s*$").unwrap();
    }

    /// Cleaned, parsed HTML body of the email.
    pub fn html_document(handler: &str, email: &Email) -> Result<Html> {
        let html = email
            .content
            .html()
            .ok_or_else(|| Error::parsing(handler, "email has no HTML part"))?;
        Ok(Html::parse_document(&clean_html(html)))
    }

    pub fn sender_matches(email: &Email, domains: &[&str]) -> bool {
        email.sender_domain().map_or(false, |domain| {
            domains
                .iter()
                .any(|d| domain == *d || domain.ends_with(&format!(".{}", d)))
        })
    }

    /// Resolves `href` against `base`, keeps only web links and drops `utm_*` tracking parameters.
    pub fn absolute_link(base: &Url, href: &str) -> Option<Url> {
        let mut url = base.join(href.trim()).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !k.starts_with("utm_"))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        Some(url)
    }

    pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
        element
            .select(selector)
            .next()
            .map(nl_dom::text_of)
            .filter(|text| !text.is_empty())
    }

    /// Drops the trailing "(5 minute read)" style annotations.
    pub fn strip_annotation(title: &str) -> String {
        collapse_whitespace(&READING_TIME.replace(title, ""))
    }

    /// True only for a trailing "(Sponsor)" annotation, not for titles mentioning sponsors.
    pub fn has_sponsor_annotation(title: &str) -> bool {
        READING_TIME
            .captures(title)
            .map_or(false, |caps| caps.get(1).map_or(false, |m| m.as_str() == "Sponsor"))
    }
}
