use crate::config::NodeEndpoint;
use crate::types::{HoprError, HoprResult, MessageBody, NodeInfo, PeersListing, RawResponse};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

pub const AUTH_HEADER: &str = "x-auth-token";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one daemon's `/api/v2` management API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    api_token: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(endpoint: &NodeEndpoint) -> HoprResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: endpoint.base_url(),
            api_token: endpoint.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn messages_url(&self) -> String {
        format!("{}/messages/", self.base_url)
    }

    pub async fn node_info(&self) -> HoprResult<NodeInfo> {
        let url = format!("{}/node/info", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(AUTH_HEADER, &self.api_token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HoprError::Protocol {
                operation: "node info",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    /// Lists known peers. A quality of zero is the same as no filter.
    pub async fn peers(&self, quality: Option<f64>) -> HoprResult<PeersListing> {
        let url = format!("{}/node/peers", self.base_url);
        let mut request = self.http.get(&url).header(AUTH_HEADER, &self.api_token);
        if let Some(quality) = quality.filter(|q| *q != 0.0) {
            request = request.query(&[("quality", quality)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(HoprError::Protocol {
                operation: "peer nodes",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    /// Posts a message body; anything but `202 Accepted` is a send failure.
    pub async fn send_message(&self, body: &MessageBody) -> HoprResult<String> {
        let response = self
            .post_json(&self.messages_url(), &self.api_token, body)
            .await?;

        if response.status != StatusCode::ACCEPTED.as_u16() {
            return Err(HoprError::Send {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }

    /// Posts any JSON payload with the given token and returns the response as-is.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        api_token: &str,
        payload: &T,
    ) -> HoprResult<RawResponse> {
        debug!(url, "Posting to daemon");
        let response = self
            .http
            .post(url)
            .header(AUTH_HEADER, api_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_urls() {
        let endpoint = NodeEndpoint::new("10.0.0.5", 13305, "secret");
        let client = ApiClient::new(&endpoint).unwrap();

        assert_eq!(client.base_url(), "http://10.0.0.5:13305/api/v2");
        assert_eq!(client.messages_url(), "http://10.0.0.5:13305/api/v2/messages/");
        assert_eq!(client.api_token(), "secret");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = ApiClient::new(&NodeEndpoint::new("localhost", 1, "secret")).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("localhost:1"));
        assert!(!debug.contains("secret"));
    }
}
