use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use reqwest::blocking::Client;
use serde::Serialize;

use crate::source::Article;
use crate::transform::TransformedBody;

pub const GENERATOR: &str = "blogport/0.1";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub endpoint_url: String,
    pub email: String,
    pub password: String,
    pub timeout_ms: u64,
}

impl PublisherConfig {
    pub fn new(endpoint_url: String, email: String, password: String) -> Self {
        Self {
            endpoint_url,
            email,
            password,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// One successfully submitted article. The remote identifier is the raw
/// response body; its content is never inspected.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublishResult {
    pub remote_id: String,
    pub slug: String,
    pub published_at: NaiveDateTime,
}

pub trait PublishApi {
    fn publish(
        &mut self,
        article: &Article,
        published_at: NaiveDateTime,
        tags: &[String],
        body: &TransformedBody,
    ) -> Result<PublishResult>;
}

pub struct HttpPublisher {
    client: Client,
    config: PublisherConfig,
}

impl HttpPublisher {
    pub fn new(config: PublisherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build publishing HTTP client")?;
        Ok(Self { client, config })
    }
}

impl PublishApi for HttpPublisher {
    fn publish(
        &mut self,
        article: &Article,
        published_at: NaiveDateTime,
        tags: &[String],
        body: &TransformedBody,
    ) -> Result<PublishResult> {
        let fields: Vec<(&str, String)> = vec![
            ("email", self.config.email.clone()),
            ("password", self.config.password.clone()),
            ("type", "regular".to_string()),
            ("generator", GENERATOR.to_string()),
            ("date", published_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            ("private", "0".to_string()),
            ("tags", tags.join(",")),
            ("format", body.format.as_str().to_string()),
            ("slug", article.permalink.clone()),
            ("state", "published".to_string()),
            ("send-to-twitter", "no".to_string()),
            ("title", article.title.clone()),
            ("body", body.text.clone()),
        ];

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .form(&fields)
            .send()
            .with_context(|| {
                format!(
                    "failed to submit article {} to {}",
                    article.id, self.config.endpoint_url
                )
            })?;
        let remote_id = response
            .text()
            .context("failed to read publishing API response body")?;

        Ok(PublishResult {
            remote_id,
            slug: article.permalink.clone(),
            published_at,
        })
    }
}

/// Injectable seam for the post-publish courtesy delay.
pub trait Sleeper {
    fn pause(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn pause(&self, duration: Duration) {
        sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use httpmock::prelude::*;

    use super::*;
    use crate::source::MarkupKind;
    use crate::transform::BodyFormat;

    fn article() -> Article {
        Article {
            id: 7,
            title: "First Post".to_string(),
            body: "B".to_string(),
            excerpt: String::new(),
            published_at: None,
            permalink: "first-post".to_string(),
            filter: MarkupKind::Markdown,
        }
    }

    fn publisher_for(server: &MockServer) -> HttpPublisher {
        HttpPublisher::new(PublisherConfig::new(
            server.url("/api/write"),
            "author@example.com".to_string(),
            "apisecret".to_string(),
        ))
        .expect("build publisher")
    }

    fn noon(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time")
    }

    #[test]
    fn publish_submits_the_documented_form_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/write")
                .x_www_form_urlencoded_tuple("email", "author@example.com")
                .x_www_form_urlencoded_tuple("password", "apisecret")
                .x_www_form_urlencoded_tuple("type", "regular")
                .x_www_form_urlencoded_tuple("generator", GENERATOR)
                .x_www_form_urlencoded_tuple("date", "2010-05-03 12:00:00")
                .x_www_form_urlencoded_tuple("private", "0")
                .x_www_form_urlencoded_tuple("tags", "a,b")
                .x_www_form_urlencoded_tuple("format", "markdown")
                .x_www_form_urlencoded_tuple("slug", "first-post")
                .x_www_form_urlencoded_tuple("state", "published")
                .x_www_form_urlencoded_tuple("send-to-twitter", "no")
                .x_www_form_urlencoded_tuple("title", "First Post")
                .x_www_form_urlencoded_tuple("body", "B");
            then.status(200).body("123456");
        });

        let mut publisher = publisher_for(&server);
        let tags = vec!["a".to_string(), "b".to_string()];
        let body = TransformedBody {
            text: "B".to_string(),
            format: BodyFormat::Markdown,
        };
        let result = publisher
            .publish(&article(), noon(2010, 5, 3), &tags, &body)
            .expect("publish");

        mock.assert();
        assert_eq!(result.remote_id, "123456");
        assert_eq!(result.slug, "first-post");
        assert_eq!(result.published_at, noon(2010, 5, 3));
    }

    #[test]
    fn publish_submits_empty_tags_field_for_untagged_article() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/write")
                .x_www_form_urlencoded_tuple("tags", "");
            then.status(200).body("1");
        });

        let mut publisher = publisher_for(&server);
        let body = TransformedBody {
            text: "B".to_string(),
            format: BodyFormat::Html,
        };
        publisher
            .publish(&article(), noon(2011, 1, 9), &[], &body)
            .expect("publish");
        mock.assert();
    }

    #[test]
    fn publish_accepts_the_response_body_regardless_of_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/write");
            then.status(503).body("temporarily unavailable");
        });

        let mut publisher = publisher_for(&server);
        let body = TransformedBody {
            text: "B".to_string(),
            format: BodyFormat::Html,
        };
        let result = publisher
            .publish(&article(), noon(2011, 1, 9), &[], &body)
            .expect("publish");
        assert_eq!(result.remote_id, "temporarily unavailable");
    }
}
