//! Remote machine-translation client.
//!
//! Talks to a translation endpoint shaped like
//! `GET {base}/{source}/{target}/{url-encoded text}` returning
//! `{"translation": "..."}`. Requests run at most five at a time and a
//! failure for one string never sinks the batch: that slot comes back as an
//! empty string, which the cache refuses to store, so it is retried later.

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONCURRENT_REQUESTS: usize = 5;

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    translation: String,
}

/// Client for the remote translation endpoint. Cheap to clone; clones share
/// the underlying connection pool.
#[derive(Clone)]
pub struct TranslationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TranslationClient {
    pub fn new(endpoint: &str) -> Result<TranslationClient> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building translation http client")?;
        Ok(TranslationClient {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Translate one string. Errors bubble up; the batch API turns them into
    /// empty slots.
    async fn translate_one(&self, source: &str, target: &str, text: &str) -> Result<String> {
        let url = format!(
            "{}/{}/{}/{}",
            self.endpoint,
            source,
            target,
            urlencoding::encode(text)
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("sending translation request")?;
        if !response.status().is_success() {
            bail!("translation endpoint returned {}", response.status());
        }
        let body: TranslationResponse = response
            .json()
            .await
            .context("decoding translation response")?;
        Ok(body.translation)
    }

    /// Translate a batch of strings from `source` into `target`. Results come
    /// back in input order, with empty strings standing in for failures.
    pub async fn request_translations(
        &self,
        source: &str,
        target: &str,
        texts: &[&str],
    ) -> Vec<String> {
        let owned: Vec<String> = texts.iter().map(|text| text.to_string()).collect();
        futures::stream::iter(owned.into_iter().map(|text| async move {
            match self.translate_one(source, target, &text).await {
                Ok(translation) => translation,
                Err(err) => {
                    warn!(error = %err, text = %text, "translation request failed");
                    String::new()
                }
            }
        }))
        .buffered(MAX_CONCURRENT_REQUESTS)
        .collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn translates_a_single_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/es/en/Hola"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translation": "Hello"
            })))
            .mount(&server)
            .await;

        let client = TranslationClient::new(&server.uri()).unwrap();
        let results = client.request_translations("es", "en", &["Hola"]).await;
        assert_eq!(results, vec!["Hello".to_string()]);
    }

    #[tokio::test]
    async fn url_encodes_the_source_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/es/en/Buenos%20d%C3%ADas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translation": "Good morning"
            })))
            .mount(&server)
            .await;

        let client = TranslationClient::new(&server.uri()).unwrap();
        let results = client
            .request_translations("es", "en", &["Buenos días"])
            .await;
        assert_eq!(results, vec!["Good morning".to_string()]);
    }

    #[tokio::test]
    async fn one_failure_does_not_sink_the_batch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/es/en/Hola"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translation": "Hello"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/es/en/Adi%C3%B3s"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = TranslationClient::new(&server.uri()).unwrap();
        let results = client
            .request_translations("es", "en", &["Hola", "Adiós"])
            .await;
        assert_eq!(results, vec!["Hello".to_string(), String::new()]);
    }

    #[tokio::test]
    async fn results_keep_input_order() {
        let server = MockServer::start().await;
        for (text, translation) in [("uno", "one"), ("dos", "two"), ("tres", "three")] {
            Mock::given(method("GET"))
                .and(path(format!("/es/en/{text}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "translation": translation
                })))
                .mount(&server)
                .await;
        }

        let client = TranslationClient::new(&server.uri()).unwrap();
        let results = client
            .request_translations("es", "en", &["uno", "dos", "tres"])
            .await;
        assert_eq!(results, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn malformed_body_becomes_an_empty_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/es/en/Hola"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = TranslationClient::new(&server.uri()).unwrap();
        let results = client.request_translations("es", "en", &["Hola"]).await;
        assert_eq!(results, vec![String::new()]);
    }
}
