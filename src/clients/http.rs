use std::collections::HashMap;
use rquest::{Client, Response, RequestBuilder};
use rquest_util::Emulation;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::de::DeserializeOwned;
use crate::error::{Error, Result};
use tracing::{error, debug};

/// Configured headers that parse; the rest are logged and dropped.
fn header_map(configured: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in configured {
        match (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => error!(header_key = %key, "Invalid header, skipping"),
        }
    }
    headers
}

/// Outbound HTTP with a fixed browser emulation and default headers.
pub struct HttpClient {
    client: Client,
    headers: HeaderMap,
}

impl HttpClient {
    pub fn new(default_headers: &HashMap<String, String>, emulation: Emulation) -> Result<Self> {
        let headers = header_map(default_headers);
        debug!(emulation = ?emulation, headers = headers.len(), "Creating client with emulation");

        let client = Client::builder()
            .emulation(emulation)
            .build()?;

        Ok(Self { client, headers })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        let mut request = self.client.get(url);

        for (key, value) in self.headers.iter() {
            request = request.header(key, value);
        }

        request
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;

        debug!(
            status = response.status().as_u16(),
            url = %response.url(),
            "Response received"
        );

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                debug!("Rate limit exceeded");
                Err(Error::RateLimit)
            },
            StatusCode::FORBIDDEN => {
                debug!(url = %response.url(), "Received 403 Forbidden");
                Err(Error::Forbidden(format!("upstream refused {}", response.url())))
            },
            status if !status.is_success() => {
                Err(Error::Upstream(format!("{} returned {}", response.url(), status)))
            },
            _ => Ok(response)
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.get(url).query(query);
        let response = self.send(request).await?;
        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| {
            let body_str = String::from_utf8_lossy(&body);
            error!(
                error = %e,
                body = %body_str,
                "Failed to parse JSON response"
            );
            Error::from(e)
        })
    }
}
