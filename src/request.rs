use crate::config::Tier;
use crate::transport::{RawResponse, Transport};
use crate::MeteosourceError;
use log::{debug, warn};
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Query parameters in wire order; `None` values are left out of the URL.
pub(crate) type QueryParams = [(&'static str, Option<String>)];

/// Builds endpoint URLs with the API key injected and turns transport
/// outcomes into decoded JSON or a [`MeteosourceError`].
#[derive(Clone)]
pub(crate) struct ApiRequester {
    api_key: String,
    tier: Tier,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl ApiRequester {
    pub(crate) fn new(
        api_key: String,
        tier: Tier,
        base_url: String,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            api_key,
            tier,
            base_url,
            transport,
        }
    }

    pub(crate) fn tier(&self) -> Tier {
        self.tier
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base + tier + endpoint`, then `key` followed by every present parameter.
    pub(crate) fn compose_url(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<Url, MeteosourceError> {
        let raw = format!("{}{}{}", self.base_url, self.tier, endpoint);
        let pairs = std::iter::once(("key", self.api_key.as_str())).chain(
            params
                .iter()
                .filter_map(|(name, value)| value.as_deref().map(|value| (*name, value))),
        );
        Url::parse_with_params(&raw, pairs).map_err(|e| {
            MeteosourceError::InvalidOptions(format!(
                "cannot compose request URL for {endpoint}: {e}"
            ))
        })
    }

    /// Performs one GET against `endpoint` and returns the decoded JSON body.
    pub(crate) async fn compose_request(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<Value, MeteosourceError> {
        let url = self.compose_url(endpoint, params)?;
        let shown = redacted(&url);
        debug!("GET {}", shown);

        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| MeteosourceError::Transport {
                url: shown.clone(),
                detail: e.to_string(),
            })?;
        interpret_response(&shown, response)
    }
}

/// The URL with the API key masked, for logs and error messages.
pub(crate) fn redacted(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

pub(crate) fn interpret_response(
    shown_url: &str,
    response: RawResponse,
) -> Result<Value, MeteosourceError> {
    let RawResponse { status, body } = response;
    if (200..=299).contains(&status) {
        let body = body.ok_or_else(|| {
            MeteosourceError::MalformedResponse(format!("body of {shown_url} could not be read"))
        })?;
        return serde_json::from_str(&body).map_err(|e| {
            MeteosourceError::MalformedResponse(format!("body of {shown_url} is not JSON: {e}"))
        });
    }

    let detail = remote_detail(body.as_deref());
    warn!("HTTP {} for {}: {}", status, shown_url, detail);
    Err(MeteosourceError::Remote {
        code: i32::from(status),
        detail,
    })
}

/// `detail` of a JSON error body, else the raw text, else a generic message.
fn remote_detail(body: Option<&str>) -> String {
    let Some(text) = body.filter(|text| !text.trim().is_empty()) else {
        return UNKNOWN_ERROR.to_string();
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut root)) => match root.remove("detail") {
            Some(Value::String(detail)) => detail,
            Some(other) => other.to_string(),
            None => text.to_string(),
        },
        _ => text.to_string(),
    }
}
