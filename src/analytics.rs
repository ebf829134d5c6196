use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::config::Analytics;

/// One client-side event, validated at the boundary. The wire shape is
/// tagged on `eventType`; anything that does not match one of the
/// variants is rejected with a 400 by the endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "eventType", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    #[serde(rename_all = "camelCase")]
    PageView {
        path: String,
        #[serde(default)]
        visitor_id: String,
        #[serde(default)]
        load_time_ms: f64,
        #[serde(default)]
        is_unique: bool,
    },
    #[serde(rename_all = "camelCase")]
    PostMilestone {
        path: String,
        #[serde(default)]
        visitor_id: String,
        /// Percentage of the post scrolled/read, 0-100
        milestone: u32,
    },
    #[serde(rename_all = "camelCase")]
    LinkClick {
        path: String,
        #[serde(default)]
        visitor_id: String,
        target: String,
    },
}

/// The sink's native record: the blobs/doubles/indexes triple of a
/// write-only analytics store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub blobs: Vec<String>,
    pub doubles: Vec<f64>,
    pub indexes: Vec<String>,
}

impl AnalyticsEvent {
    /// Flatten the typed event into one data point.
    ///
    /// Blob layout: event kind, page path, event detail, post slug (empty
    /// when the path is not a post page). Double layout: count, load time,
    /// unique-visit flag, post-page flag. The visitor id is the sampling
    /// index.
    pub fn normalize(&self) -> DataPoint {
        let (kind, path, detail, visitor_id, load_time, is_unique) = match self {
            AnalyticsEvent::PageView {
                path,
                visitor_id,
                load_time_ms,
                is_unique,
            } => ("page_view", path, String::new(), visitor_id, *load_time_ms, *is_unique),
            AnalyticsEvent::PostMilestone {
                path,
                visitor_id,
                milestone,
            } => ("post_milestone", path, milestone.to_string(), visitor_id, 0.0, false),
            AnalyticsEvent::LinkClick {
                path,
                visitor_id,
                target,
            } => ("link_click", path, target.clone(), visitor_id, 0.0, false),
        };

        let post_slug = extract_post_slug(path).unwrap_or_default();
        let is_post = !post_slug.is_empty();

        DataPoint {
            blobs: vec![kind.to_string(), path.clone(), detail, post_slug],
            doubles: vec![
                1.0,
                load_time,
                if is_unique { 1.0 } else { 0.0 },
                if is_post { 1.0 } else { 0.0 },
            ],
            indexes: vec![visitor_id.clone()],
        }
    }
}

/// Post slug of a path like `/en/posts/my-post`, if it is a post page.
pub fn extract_post_slug(path: &str) -> Option<String> {
    lazy_static! {
        static ref POST_PATH_REGEX: Regex = Regex::new(r"/[^/]+/posts/([^/]+)").unwrap();
    }
    POST_PATH_REGEX
        .captures(path)
        .map(|cap| cap[1].to_string())
}

/// Write-only destination for normalized analytics records. Deployments
/// without a configured sink have none; the endpoint answers 503 there.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn write_data_point(&self, point: &DataPoint) -> Result<()>;
}

/// Forwards data points to an external HTTP collector. Fire-and-forget
/// from the blog's perspective: no retries, no queueing.
pub struct HttpSink {
    http: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpSink {
    pub fn from_config(config: &Analytics) -> Result<HttpSink> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid analytics endpoint: {}", config.endpoint))?;
        let http = Client::builder()
            .user_agent("bilingue/1.0")
            .build()
            .context("Error building analytics HTTP client")?;

        Ok(HttpSink {
            http,
            endpoint,
            auth_token: config.auth_token.clone(),
        })
    }
}

#[async_trait]
impl AnalyticsSink for HttpSink {
    async fn write_data_point(&self, point: &DataPoint) -> Result<()> {
        let mut request = self.http.post(self.endpoint.clone()).json(point);
        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.context("Error reaching analytics sink")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Analytics sink answered {}", status));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_view_wire_shape() {
        let body = r#"{
            "eventType": "page_view",
            "path": "/en/posts/my-post",
            "visitorId": "v-123",
            "loadTimeMs": 250.5,
            "isUnique": true
        }"#;
        let event: AnalyticsEvent = serde_json::from_str(body).unwrap();

        assert_eq!(
            event,
            AnalyticsEvent::PageView {
                path: "/en/posts/my-post".to_string(),
                visitor_id: "v-123".to_string(),
                load_time_ms: 250.5,
                is_unique: true,
            }
        );
    }

    #[test]
    fn test_missing_event_type_is_rejected() {
        let body = r#"{"path": "/en/posts/my-post"}"#;
        assert!(serde_json::from_str::<AnalyticsEvent>(body).is_err());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let body = r#"{"eventType": "link_click", "path": "/en/about"}"#;
        assert!(serde_json::from_str::<AnalyticsEvent>(body).is_err());
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let body = r#"{"eventType": "mouse_wiggle", "path": "/en"}"#;
        assert!(serde_json::from_str::<AnalyticsEvent>(body).is_err());
    }

    #[test]
    fn test_normalize_page_view_on_post_page() {
        let event = AnalyticsEvent::PageView {
            path: "/pt/posts/minha-postagem".to_string(),
            visitor_id: "v-9".to_string(),
            load_time_ms: 120.0,
            is_unique: false,
        };
        let point = event.normalize();

        assert_eq!(
            point.blobs,
            vec!["page_view", "/pt/posts/minha-postagem", "", "minha-postagem"]
        );
        assert_eq!(point.doubles, vec![1.0, 120.0, 0.0, 1.0]);
        assert_eq!(point.indexes, vec!["v-9"]);
    }

    #[test]
    fn test_normalize_page_view_off_post_page() {
        let event = AnalyticsEvent::PageView {
            path: "/en/about".to_string(),
            visitor_id: String::new(),
            load_time_ms: 0.0,
            is_unique: true,
        };
        let point = event.normalize();

        assert_eq!(point.blobs, vec!["page_view", "/en/about", "", ""]);
        assert_eq!(point.doubles, vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normalize_milestone_and_click() {
        let milestone = AnalyticsEvent::PostMilestone {
            path: "/en/posts/my-post".to_string(),
            visitor_id: "v-1".to_string(),
            milestone: 75,
        };
        assert_eq!(
            milestone.normalize().blobs,
            vec!["post_milestone", "/en/posts/my-post", "75", "my-post"]
        );

        let click = AnalyticsEvent::LinkClick {
            path: "/en".to_string(),
            visitor_id: "v-1".to_string(),
            target: "https://example.dev".to_string(),
        };
        assert_eq!(
            click.normalize().blobs,
            vec!["link_click", "/en", "https://example.dev", ""]
        );
    }

    #[test]
    fn test_extract_post_slug() {
        assert_eq!(
            extract_post_slug("/en/posts/my-post"),
            Some("my-post".to_string())
        );
        assert_eq!(
            extract_post_slug("/pt/posts/outro/extra"),
            Some("outro".to_string())
        );
        assert_eq!(extract_post_slug("/en/about"), None);
        assert_eq!(extract_post_slug("/posts"), None);
    }
}
