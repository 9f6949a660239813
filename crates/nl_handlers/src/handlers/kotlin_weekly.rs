use lazy_static::lazy_static;
use nl_core::{Article, Email, Error, Newsletter, Result};
use nl_dom::{element, inline_color, HtmlColor, SectionOptions, Sectioner};
use scraper::{Html, Selector};
use url::Url;

use super::utils;
use super::SingleFeedHandler;

lazy_static! {
    static ref MARKER: Selector = Selector::parse("td[style], td[bgcolor]").unwrap();
    static ref FOOTER: Selector = Selector::parse("td.footer").unwrap();
    static ref ITEM: Selector = Selector::parse("td.item").unwrap();
    static ref HEADLINE: Selector = Selector::parse("h3 a").unwrap();
    static ref PARAGRAPH: Selector = Selector::parse("p").unwrap();
    static ref WEBSITE: Url = Url::parse("https://kotlinweekly.net").unwrap();
}

/// Category header background.
const CATEGORY: HtmlColor = HtmlColor::new(0x7f, 0x52, 0xff);
/// Sponsor header background.
const SPONSOR: HtmlColor = HtmlColor::new(0xf4, 0xb4, 0x00);

/// Kotlin Weekly, a Mailchimp template where categories are colored table rows.
#[derive(Debug, Clone, Default)]
pub struct KotlinWeeklyHandler;

impl KotlinWeeklyHandler {
    pub fn new() -> Self {
        Self
    }

    const NAME: &'static str = "Kotlin Weekly";

    fn items(fragment: &Html, base: &Url) -> Vec<Article> {
        fragment
            .select(&ITEM)
            .filter_map(|item| {
                let headline = item.select(&HEADLINE).next()?;
                let link = utils::absolute_link(base, headline.value().attr("href")?)?;
                Some(Article {
                    title: nl_dom::text_of(headline),
                    link,
                    description: utils::first_text(item, &PARAGRAPH).unwrap_or_default(),
                })
            })
            .collect()
    }
}

impl SingleFeedHandler for KotlinWeeklyHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn newsletter(&self) -> Newsletter {
        Newsletter {
            code: "kotlin-weekly".to_string(),
            name: Self::NAME.to_string(),
            website_url: WEBSITE.clone(),
        }
    }

    fn can_handle(&self, email: &Email) -> bool {
        utils::sender_matches(email, &["kotlinweekly.net"])
    }

    fn extract_articles(&self, email: &Email) -> Result<Vec<Article>> {
        let document = utils::html_document(Self::NAME, email)?;
        let color_of = |id| element(&document, id).and_then(|el| inline_color(el, "background-color"));

        let markers: Vec<_> = document.select(&MARKER).map(|el| el.id()).collect();
        if !markers.iter().any(|id| color_of(*id).map_or(false, |c| c.matches(&SPONSOR))) {
            return Err(Error::parsing(Self::NAME, "sponsor header not found"));
        }
        if !markers.iter().any(|id| color_of(*id).map_or(false, |c| c.matches(&CATEGORY))) {
            return Err(Error::parsing(Self::NAME, "no category headers found"));
        }
        let footer = document
            .select(&FOOTER)
            .next()
            .ok_or_else(|| Error::parsing(Self::NAME, "footer not found"))?;

        let options = SectionOptions::new()
            .filter(|id| color_of(id).map_or(false, |c| c.matches(&CATEGORY) || c.matches(&SPONSOR)))
            .stop_at(footer.id());
        let sectioner = Sectioner::new(&document);
        let is_sponsor_block = |id| {
            element(&document, id).map_or(false, |el| {
                std::iter::once(el)
                    .chain(el.select(&MARKER))
                    .any(|td| inline_color(td, "background-color").map_or(false, |c| c.matches(&SPONSOR)))
            })
        };

        let mut articles = Vec::new();
        for section in sectioner.extract_sections(markers, &options)? {
            if is_sponsor_block(section.start) {
                continue;
            }
            let found = sectioner.process(&section, |fragment| Self::items(&fragment, &WEBSITE))?;
            tracing::debug!("{}: {} articles in {}", Self::NAME, found.len(), section.title);
            articles.extend(found);
        }

        Ok(articles)
    }
}
