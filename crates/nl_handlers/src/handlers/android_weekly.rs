use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use nl_core::{Article, Email, Error, Newsletter, Result};
use nl_dom::{SectionOptions, Sectioner};
use scraper::{Html, Selector};
use url::Url;

use super::utils;
use super::SingleFeedHandler;

lazy_static! {
    static ref SECTION_HEADER: Selector = Selector::parse("div.content h2").unwrap();
    static ref FOOTER: Selector = Selector::parse("hr.footer-separator").unwrap();
    static ref ITEM: Selector = Selector::parse("div.item").unwrap();
    static ref HEADLINE: Selector = Selector::parse("a.article-headline").unwrap();
    static ref PARAGRAPH: Selector = Selector::parse("p").unwrap();
    static ref WEBSITE: Url = Url::parse("https://androidweekly.net").unwrap();
    /// Issues from this instant on use the new template.
    static ref TEMPLATE_CUTOFF: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
}

const SPONSORED_HEADER: &str = "Sponsored";

/// Android Weekly, legacy template: `h2` headers inside `div.content`,
/// closed by a footer separator.
#[derive(Debug, Clone, Default)]
pub struct AndroidWeeklyHandler;

impl AndroidWeeklyHandler {
    pub fn new() -> Self {
        Self
    }

    const NAME: &'static str = "Android Weekly";

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

impl SingleFeedHandler for AndroidWeeklyHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn newsletter(&self) -> Newsletter {
        Newsletter {
            code: "android-weekly".to_string(),
            name: Self::NAME.to_string(),
            website_url: WEBSITE.clone(),
        }
    }

    fn can_handle(&self, email: &Email) -> bool {
        utils::sender_matches(email, &["androidweekly.net"]) && email.date < *TEMPLATE_CUTOFF
    }

    fn extract_articles(&self, email: &Email) -> Result<Vec<Article>> {
        let document = utils::html_document(Self::NAME, email)?;
        let footer = document
            .select(&FOOTER)
            .next()
            .ok_or_else(|| Error::parsing(Self::NAME, "footer separator not found"))?;

        let sectioner = Sectioner::new(&document);
        let options = SectionOptions::new().stop_at(footer.id());
        let sections = sectioner.extract_by_selector(&SECTION_HEADER, &options)?;
        if sections.is_empty() {
            return Err(Error::parsing(Self::NAME, "no section headers found"));
        }

        let mut articles = Vec::new();
        for section in sections {
            if section.title.eq_ignore_ascii_case(SPONSORED_HEADER) {
                tracing::debug!("{}: skipping {}", Self::NAME, section.title);
                continue;
            }
            articles.extend(sectioner.process(&section, |fragment| Self::items(&fragment, &WEBSITE))?);
        }

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nl_core::{EmailContent, MessageId};

    const FIXTURE: &str = include_str!("../../tests/fixtures/android_weekly.html");

    fn email(date: DateTime<Utc>) -> Email {
        Email {
            sender: "contact@androidweekly.net".to_string(),
            date,
            subject: "Android Weekly #590".to_string(),
            content: EmailContent::HtmlOnly { html: FIXTURE.to_string() },
            message_id: MessageId {
                folder: "INBOX".to_string(),
                sequence: 4,
                key: "aw".to_string(),
            },
        }
    }

    fn legacy_issue() -> Email {
        email(Utc.with_ymd_and_hms(2023, 9, 24, 8, 0, 0).unwrap())
    }

    #[test]
    fn test_can_handle_only_legacy_issues() {
        let handler = AndroidWeeklyHandler::new();
        assert!(handler.can_handle(&email(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap())));
        assert!(!handler.can_handle(&email(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())));

        let mut other = legacy_issue();
        other.sender = "mailer@kotlinweekly.net".to_string();
        assert!(!handler.can_handle(&other));
    }

    #[test]
    fn test_extract_articles() {
        let articles = AndroidWeeklyHandler::new().extract_articles(&legacy_issue()).unwrap();

        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["State in Compose", "Baseline Profiles", "OkHttp 5"]);
        assert_eq!(articles[0].description, "Understand state hoisting with a practical example.");
        assert_eq!(articles[1].link.as_str(), "https://proandroiddev.com/baseline-profiles");
        assert_eq!(articles[2].link.as_str(), "https://github.com/square/okhttp");
    }

    #[test]
    fn test_headers_after_footer_are_ignored() {
        let articles = AndroidWeeklyHandler::new().extract_articles(&legacy_issue()).unwrap();
        assert!(FIXTURE.contains("<h2>More from Android Weekly</h2>"));
        assert!(articles.iter().all(|a| a.title != "Issue archive"));
        assert!(articles.iter().all(|a| !a.link.as_str().contains("androidweekly.net/archive")));
    }

    #[test]
    fn test_headers_mentioning_sponsors_are_kept() {
        let mut issue = legacy_issue();
        issue.content = EmailContent::HtmlOnly {
            html: FIXTURE.replace("Libraries &amp; Code", "Sponsorware &amp; Open Source"),
        };
        let articles = AndroidWeeklyHandler::new().extract_articles(&issue).unwrap();
        assert_eq!(articles.last().unwrap().title, "OkHttp 5");
        assert!(articles.iter().all(|a| a.title != "Ship faster"));
    }

    #[test]
    fn test_missing_footer() {
        let mut issue = legacy_issue();
        issue.content = EmailContent::HtmlOnly {
            html: FIXTURE.replace("footer-separator", "divider"),
        };
        let result = AndroidWeeklyHandler::new().extract_articles(&issue);
        assert!(matches!(result, Err(Error::NewsletterParsing { .. })));
    }
}
