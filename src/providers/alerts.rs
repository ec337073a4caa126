//! Disaster and weather alerts from an RSS feed

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use quick_xml::de::from_str;
use scraper::{Html, Node};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{HttpClient, Provider, ProviderError, ProviderKind, ProviderResult};
use crate::models::{Alert, AlertSeverity, Location};

/// Number of feed items kept per cycle
pub const MAX_ALERTS: usize = 5;

const HIGH_SEVERITY_KEYWORDS: [&str; 9] = [
    "warning",
    "red",
    "severe",
    "typhoon",
    "signal",
    "evacuation",
    "emergency",
    "extreme",
    "orange",
];

pub struct RssAlertProvider {
    http: HttpClient,
    feed_url: String,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Elements whose boundaries separate words in the rendered text
const BLOCK_ELEMENTS: [&str; 12] = [
    "p", "br", "div", "li", "ul", "ol", "tr", "td", "h1", "h2", "h3", "h4",
];

/// Remove markup and entities from a feed description and collapse whitespace
#[must_use]
pub fn strip_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut text = String::with_capacity(raw.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(content) => text.push_str(content),
            Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => text.push(' '),
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// High when the title mentions a severe-event keyword
#[must_use]
pub fn classify_severity(title: &str) -> AlertSeverity {
    let is_high = title.split(|c: char| !c.is_alphanumeric()).any(|token| {
        HIGH_SEVERITY_KEYWORDS
            .iter()
            .any(|keyword| token.eq_ignore_ascii_case(keyword))
    });

    if is_high {
        AlertSeverity::High
    } else {
        AlertSeverity::Moderate
    }
}

fn parse_pub_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

impl RssAlertProvider {
    #[must_use]
    pub fn new(http: HttpClient, feed_url: &str) -> Self {
        Self {
            http,
            feed_url: feed_url.to_string(),
        }
    }

    /// Parse the feed into at most [`MAX_ALERTS`] alerts, newest first.
    /// Items without a parseable date sort last.
    pub fn parse(body: &str) -> Result<Vec<Alert>, ProviderError> {
        let rss: Rss = from_str(body).map_err(|e| ProviderError::malformed(e.to_string()))?;

        let mut alerts: Vec<Alert> = rss
            .channel
            .items
            .into_iter()
            .take(MAX_ALERTS)
            .map(|item| {
                let title = strip_html(item.title.as_deref().unwrap_or_default());
                let description = strip_html(item.description.as_deref().unwrap_or_default());
                let severity = classify_severity(&title);
                Alert {
                    published_at: item.pub_date.as_deref().and_then(parse_pub_date),
                    title,
                    description,
                    severity,
                }
            })
            .collect();

        alerts.sort_by(|a, b| match (a.published_at, b.published_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        debug!("Parsed {} alerts", alerts.len());
        Ok(alerts)
    }
}

#[async_trait]
impl Provider<Vec<Alert>> for RssAlertProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Alerts
    }

    #[instrument(name = "fetch_alerts", skip(self, location), fields(location = %location.id))]
    async fn fetch(&self, location: &Location, _as_of: NaiveDate) -> ProviderResult<Vec<Alert>> {
        self.http
            .get_text(self.kind(), &self.feed_url, &[])
            .await
            .and_then(|body| Self::parse(&body))
            .into()
    }
}
