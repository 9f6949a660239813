use std::collections::BTreeMap;

use lazy_static::lazy_static;
use nl_core::{Article, Email, Error, Newsletter, Result};
use nl_dom::{text_of, HtmlNodeId, SectionOptions, Sectioner};
use scraper::{Html, Selector};
use url::Url;

use super::utils;
use super::MultipleFeedsHandler;

lazy_static! {
    static ref HEADING: Selector = Selector::parse("h1, h2").unwrap();
    static ref ARTICLE: Selector = Selector::parse("div.article").unwrap();
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref STRONG: Selector = Selector::parse("strong").unwrap();
    static ref PARAGRAPH: Selector = Selector::parse("p").unwrap();

    /// Subject prefix of each edition, longest first so "TLDR AI" never reads as "TLDR".
    static ref EDITIONS: Vec<(&'static str, Newsletter)> = vec![
        ("TLDR Web Dev", Newsletter::new("tldr-webdev", "TLDR Web Dev", "https://tldr.tech/webdev").unwrap()),
        ("TLDR AI", Newsletter::new("tldr-ai", "TLDR AI", "https://tldr.tech/ai").unwrap()),
        ("TLDR", Newsletter::new("tldr", "TLDR", "https://tldr.tech").unwrap()),
    ];
}

/// Referral block closing every edition.
const REFERRAL_HEADING: &str = "Love TLDR";

/// TLDR sends all its editions from one address; the subject tells them apart.
#[derive(Debug, Clone, Default)]
pub struct TldrHandler;

impl TldrHandler {
    pub fn new() -> Self {
        Self
    }

    const NAME: &'static str = "TLDR";

    fn edition(subject: &str) -> Option<&'static Newsletter> {
        let subject = subject.trim_start();
        EDITIONS
            .iter()
            .find(|(prefix, _)| {
                subject
                    .strip_prefix(*prefix)
                    .map_or(false, |rest| rest.is_empty() || rest.starts_with(|c: char| !c.is_alphanumeric()))
            })
            .map(|(_, newsletter)| newsletter)
    }

    fn items(fragment: &Html, base: &Url) -> Vec<Article> {
        fragment
            .select(&ARTICLE)
            .filter_map(|item| {
                let anchor = item.select(&LINK).next()?;
                let label = utils::first_text(anchor, &STRONG).unwrap_or_else(|| text_of(anchor));
                if utils::has_sponsor_annotation(&label) {
                    return None;
                }
                Some(Article {
                    title: utils::strip_annotation(&label),
                    link: utils::absolute_link(base, anchor.value().attr("href")?)?,
                    description: utils::first_text(item, &PARAGRAPH).unwrap_or_default(),
                })
            })
            .filter(|article| !article.title.is_empty())
            .collect()
    }
}

impl MultipleFeedsHandler for TldrHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn newsletters(&self) -> Vec<Newsletter> {
        EDITIONS.iter().map(|(_, newsletter)| newsletter.clone()).collect()
    }

    fn can_handle(&self, email: &Email) -> bool {
        utils::sender_matches(email, &["tldrnewsletter.com"])
    }

    fn extract_articles(&self, email: &Email) -> Result<BTreeMap<Newsletter, Vec<Article>>> {
        let newsletter = Self::edition(&email.subject)
            .ok_or_else(|| Error::parsing(Self::NAME, format!("unknown edition: {}", email.subject)))?;

        let document = utils::html_document(Self::NAME, email)?;
        let referral = document
            .select(&HEADING)
            .find(|heading| text_of(*heading).starts_with(REFERRAL_HEADING))
            .map(|heading| heading.id());

        let mut options = SectionOptions::new().filter(|id: HtmlNodeId| Some(id) != referral);
        if let Some(stop) = referral {
            options = options.stop_at(stop);
        }

        let sectioner = Sectioner::new(&document);
        let sections = sectioner.extract_by_selector(&HEADING, &options)?;
        if sections.is_empty() {
            return Err(Error::parsing(Self::NAME, "no section headings found"));
        }

        let mut articles = Vec::new();
        for section in sections {
            let found = sectioner.process(&section, |fragment| Self::items(&fragment, &newsletter.website_url))?;
            tracing::debug!("{}: {} articles in {}", newsletter.name, found.len(), section.title);
            articles.extend(found);
        }

        Ok(BTreeMap::from([(newsletter.clone(), articles)]))
    }
}
