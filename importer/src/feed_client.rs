//! HTTP client for the upstream feed service.
//!
//! The service exposes POST endpoints with JSON bodies. Failures come back as a
//! JSON document carrying a short error code; two codes get special treatment:
//! `CH050` (the feed alias already exists) and `CH001` (the long poll elapsed with
//! no new transactions). Everything else is a plain request failure.

use std::time::Duration;

use config::shared::FeedConfig;
use ingest::error::{ErrorKind, IngestResult};
use ingest::feed::{Feed, FeedClient, TransactionPage};
use ingest::{bail, ingest_error};
use serde::Deserialize;
use serde::Serialize;
use serde_json::{json, Value};

/// Feed already exists under the requested alias.
const CODE_FEED_ALREADY_EXISTS: &str = "CH050";

/// Long-poll window elapsed without matching transactions.
const CODE_REQUEST_TIMED_OUT: &str = "CH001";

/// Timeout for control-plane calls that do not long-poll.
const CONTROL_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra client-side allowance on top of the server-side long-poll window.
const LONG_POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// Error document returned by the feed service.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    message: String,
}

/// Wire representation of a feed resource.
#[derive(Debug, Deserialize)]
struct FeedResource {
    id: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    filter: String,
    #[serde(default)]
    after: String,
}

impl From<FeedResource> for Feed {
    fn from(resource: FeedResource) -> Feed {
        Feed {
            id: resource.id,
            alias: resource.alias,
            filter: resource.filter,
            after: resource.after,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NextQuery {
    #[serde(default)]
    after: String,
}

/// Wire representation of one `list-transactions` page.
#[derive(Debug, Deserialize)]
struct TransactionsPage {
    #[serde(default)]
    items: Vec<Value>,
    next: NextQuery,
}

/// Maps a service error code to the importer's error kind.
fn classify_api_error(code: &str) -> ErrorKind {
    match code {
        CODE_FEED_ALREADY_EXISTS => ErrorKind::FeedAlreadyExists,
        CODE_REQUEST_TIMED_OUT => ErrorKind::FeedRequestTimedOut,
        _ => ErrorKind::FeedRequestFailed,
    }
}

/// [`FeedClient`] talking to a real feed service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl HttpFeedClient {
    /// Builds a client for the configured feed service.
    ///
    /// The access token has the form `id:secret` and is sent as basic auth.
    pub fn new(config: &FeedConfig) -> IngestResult<HttpFeedClient> {
        let http = reqwest::Client::builder().build().map_err(|err| {
            ingest_error!(
                ErrorKind::FeedSetupFailed,
                "Failed to build the HTTP client",
                source: err
            )
        })?;

        let credentials = config.token.as_ref().map(|token| {
            let token = token.expose_secret();
            match token.split_once(':') {
                Some((id, secret)) => (id.to_owned(), secret.to_owned()),
                None => (token.to_owned(), String::new()),
            }
        });

        Ok(HttpFeedClient {
            http,
            base_url: config.url.trim_end_matches('/').to_owned(),
            credentials,
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B, timeout: Duration) -> IngestResult<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}/{path}", self.base_url))
            .timeout(timeout)
            .json(body);

        if let Some((id, secret)) = &self.credentials {
            request = request.basic_auth(id, Some(secret));
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ingest_error!(
                    ErrorKind::FeedRequestTimedOut,
                    "Feed request timed out client-side",
                    source: err
                )
            } else {
                ingest_error!(
                    ErrorKind::FeedRequestFailed,
                    "Feed request failed",
                    source: err
                )
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|err| {
                ingest_error!(
                    ErrorKind::DeserializationError,
                    "Failed to decode the feed service response",
                    source: err
                )
            });
        }

        match response.json::<ApiError>().await {
            Ok(api_error) => bail!(
                classify_api_error(&api_error.code),
                "Feed service returned an error",
                format!("{}: {}", api_error.code, api_error.message)
            ),
            Err(_) => bail!(
                ErrorKind::FeedRequestFailed,
                "Feed service returned an unexpected response",
                format!("http status {status}")
            ),
        }
    }
}

impl FeedClient for HttpFeedClient {
    async fn create_feed(&self, alias: &str, filter: &str) -> IngestResult<Feed> {
        let resource: FeedResource = self
            .post(
                "create-transaction-feed",
                &json!({ "alias": alias, "filter": filter }),
                CONTROL_REQUEST_TIMEOUT,
            )
            .await?;

        Ok(resource.into())
    }

    async fn get_feed_by_alias(&self, alias: &str) -> IngestResult<Feed> {
        let resource: FeedResource = self
            .post(
                "get-transaction-feed",
                &json!({ "alias": alias }),
                CONTROL_REQUEST_TIMEOUT,
            )
            .await?;

        Ok(resource.into())
    }

    async fn query_transactions(
        &self,
        feed: &Feed,
        timeout_ms: u64,
    ) -> IngestResult<TransactionPage> {
        let page: TransactionsPage = self
            .post(
                "list-transactions",
                &json!({
                    "filter": feed.filter,
                    "after": feed.after,
                    "timeout": timeout_ms,
                    "ascending_with_long_poll": true,
                }),
                Duration::from_millis(timeout_ms) + LONG_POLL_TIMEOUT_MARGIN,
            )
            .await?;

        Ok(TransactionPage {
            transactions: page.items,
            next_after: page.next.after,
        })
    }

    async fn update_feed_cursor(&self, feed: &Feed, after: &str) -> IngestResult<Feed> {
        let resource: FeedResource = self
            .post(
                "update-transaction-feed",
                &json!({
                    "id": feed.id,
                    "previous_after": feed.after,
                    "after": after,
                }),
                CONTROL_REQUEST_TIMEOUT,
            )
            .await?;

        Ok(resource.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_codes_map_to_kinds() {
        assert_eq!(classify_api_error("CH050"), ErrorKind::FeedAlreadyExists);
        assert_eq!(classify_api_error("CH001"), ErrorKind::FeedRequestTimedOut);
        assert_eq!(classify_api_error("CH706"), ErrorKind::FeedRequestFailed);
    }

    #[test]
    fn wire_page_decodes_with_missing_items() {
        let page: TransactionsPage =
            serde_json::from_value(json!({ "next": { "after": "7" } })).unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.next.after, "7");
    }
}
