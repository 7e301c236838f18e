//! Google Trends provider
//!
//! Speaks the public web protocol used by the Trends explore page:
//!
//! 1. load the landing page once so the client holds session cookies
//! 2. `POST /trends/api/explore` returns widgets, each with a token
//! 3. `GET /trends/api/widgetdata/relatedsearches` or `.../multiline` with
//!    that widget's request and token returns the data
//!
//! Every JSON body is prefixed with an anti-hijacking guard (`)]}'`) that
//! has to be stripped before parsing.

use super::{
    InterestPoint, InterestTimeline, ProviderError, RankedQuery, RelatedQueries, TrendsProvider,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

const EXPLORE_PATH: &str = "/trends/api/explore";
const RELATED_QUERIES_PATH: &str = "/trends/api/widgetdata/relatedsearches";
const MULTILINE_PATH: &str = "/trends/api/widgetdata/multiline";

/// Connection settings for [`GoogleTrendsProvider`]
#[derive(Debug, Clone)]
pub struct GoogleTrendsSettings {
    /// Scheme and host, no trailing slash
    pub base_url: String,
    /// Interface language, e.g. `en-US`
    pub host_language: String,
    /// Timezone offset in minutes, as the explore page sends it
    pub tz_offset: i32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GoogleTrendsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://trends.google.com".to_string(),
            host_language: "en-US".to_string(),
            tz_offset: 0,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(25),
        }
    }
}

/// Explore widget: a data request the client is allowed to make
#[derive(Debug, Clone, Deserialize)]
struct Widget {
    id: String,
    token: String,
    request: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedKeyword {
    query: String,
    #[serde(default)]
    value: i64,
    #[serde(default)]
    formatted_value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedList {
    #[serde(default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedDefault {
    #[serde(default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineEntry {
    time: String,
    #[serde(default)]
    value: Vec<i64>,
    #[serde(default)]
    is_partial: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineDefault {
    #[serde(default)]
    timeline_data: Vec<TimelineEntry>,
}

#[derive(Debug, Deserialize)]
struct WidgetPayload<T> {
    #[serde(default)]
    default: Option<T>,
}

/// Google Trends over HTTPS
pub struct GoogleTrendsProvider {
    client: reqwest::Client,
    settings: GoogleTrendsSettings,
    session: OnceCell<()>,
}

impl GoogleTrendsProvider {
    /// Create a provider with its own cookie-holding HTTP client
    pub fn new(settings: GoogleTrendsSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(concat!("trendgate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, settings, session: OnceCell::new() })
    }

    pub fn settings(&self) -> &GoogleTrendsSettings {
        &self.settings
    }

    /// Load the landing page once so later API calls carry session cookies
    async fn ensure_session(&self) -> Result<(), ProviderError> {
        self.session
            .get_or_try_init(|| async {
                let region = cookie_region(&self.settings.host_language);
                let url = format!("{}/explore/?geo={}", self.settings.base_url, region);
                let response = self.client.get(&url).send().await.map_err(classify)?;
                check_status(response.status())?;
                log::debug!("Trends session established");
                Ok::<(), ProviderError>(())
            })
            .await
            .map(|_| ())
    }

    /// Fetch the explore widgets for a comparison of keywords
    async fn explore(
        &self,
        keywords: &[String],
        geo: &str,
        timeframe: &str,
    ) -> Result<Vec<Widget>, ProviderError> {
        self.ensure_session().await?;

        let comparison: Vec<serde_json::Value> = keywords
            .iter()
            .map(|kw| serde_json::json!({ "keyword": kw, "time": timeframe, "geo": geo }))
            .collect();
        let req = serde_json::json!({
            "comparisonItem": comparison,
            "category": 0,
            "property": "",
        });

        let url = format!(
            "{}{}?hl={}&tz={}&req={}&property=",
            self.settings.base_url,
            EXPLORE_PATH,
            urlencoding::encode(&self.settings.host_language),
            self.settings.tz_offset,
            urlencoding::encode(&req.to_string()),
        );

        let text = self.send(self.client.post(&url)).await?;
        parse_widgets(&text)
    }

    /// Fetch data for one widget from a widgetdata endpoint
    async fn widget_data(&self, path: &str, widget: &Widget) -> Result<String, ProviderError> {
        let url = format!(
            "{}{}?hl={}&tz={}&req={}&token={}",
            self.settings.base_url,
            path,
            urlencoding::encode(&self.settings.host_language),
            self.settings.tz_offset,
            urlencoding::encode(&widget.request.to_string()),
            urlencoding::encode(&widget.token),
        );
        self.send(self.client.get(&url)).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ProviderError> {
        let response = request.send().await.map_err(classify)?;
        check_status(response.status())?;
        response.text().await.map_err(classify)
    }
}

#[async_trait::async_trait]
impl TrendsProvider for GoogleTrendsProvider {
    async fn related_queries(
        &self,
        keyword: &str,
        geo: &str,
        timeframe: &str,
    ) -> Result<RelatedQueries, ProviderError> {
        let widgets = self.explore(&[keyword.to_string()], geo, timeframe).await?;
        let widget = widgets
            .iter()
            .find(|w| w.id.starts_with("RELATED_QUERIES"))
            .ok_or_else(|| ProviderError::Other("explore returned no related queries widget".into()))?;

        let text = self.widget_data(RELATED_QUERIES_PATH, widget).await?;
        parse_related(&text)
    }

    async fn interest_over_time(
        &self,
        keywords: &[String],
        geo: &str,
        timeframe: &str,
    ) -> Result<InterestTimeline, ProviderError> {
        let widgets = self.explore(keywords, geo, timeframe).await?;
        let widget = widgets
            .iter()
            .find(|w| w.id == "TIMESERIES")
            .ok_or_else(|| ProviderError::Other("explore returned no timeseries widget".into()))?;

        let text = self.widget_data(MULTILINE_PATH, widget).await?;
        parse_timeline(&text, keywords)
    }
}

/// Region used for the session cookie, taken from the language tag
fn cookie_region(host_language: &str) -> &str {
    host_language.rsplit('-').next().unwrap_or("US")
}

fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(ProviderError::RateLimited(format!("upstream returned {}", status)))
    } else if status.is_success() {
        Ok(())
    } else {
        Err(ProviderError::Other(format!("upstream returned {}", status)))
    }
}

/// Map a transport error onto the provider failure kinds
fn classify(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_connect() {
        ProviderError::ConnectionFailed(err.to_string())
    } else if let Some(status) = err.status() {
        match check_status(status) {
            Err(mapped) => mapped,
            Ok(()) => ProviderError::Other(err.to_string()),
        }
    } else {
        ProviderError::Other(err.to_string())
    }
}

/// Drop the `)]}'` guard (and anything else) before the JSON object
fn strip_guard(text: &str) -> &str {
    match text.find('{') {
        Some(start) => &text[start..],
        None => text,
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    serde_json::from_str(strip_guard(text))
        .map_err(|e| ProviderError::Other(format!("malformed provider payload: {}", e)))
}

fn parse_widgets(text: &str) -> Result<Vec<Widget>, ProviderError> {
    Ok(parse_json::<ExploreResponse>(text)?.widgets)
}

/// Ranked list 0 is "top", ranked list 1 is "rising"; either may be missing
fn parse_related(text: &str) -> Result<RelatedQueries, ProviderError> {
    let payload: WidgetPayload<RelatedDefault> = parse_json(text)?;
    let mut lists = payload.default.unwrap_or_default().ranked_list.into_iter().map(|list| {
        list.ranked_keyword
            .into_iter()
            .map(|k| RankedQuery { query: k.query, value: k.value, formatted_value: k.formatted_value })
            .collect::<Vec<_>>()
    });

    let top = lists.next().unwrap_or_default();
    let rising = lists.next().unwrap_or_default();
    Ok(RelatedQueries { top, rising })
}

fn parse_timeline(text: &str, keywords: &[String]) -> Result<InterestTimeline, ProviderError> {
    let payload: WidgetPayload<TimelineDefault> = parse_json(text)?;
    let mut points = Vec::new();

    for entry in payload.default.unwrap_or_default().timeline_data {
        let seconds: i64 = entry
            .time
            .parse()
            .map_err(|_| ProviderError::Other(format!("bad timeline timestamp '{}'", entry.time)))?;
        let date = chrono::DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| ProviderError::Other(format!("timeline timestamp out of range: {}", seconds)))?
            .date_naive();
        points.push(InterestPoint { date, values: entry.value, is_partial: entry.is_partial });
    }

    Ok(InterestTimeline { keywords: keywords.to_vec(), points })
}
