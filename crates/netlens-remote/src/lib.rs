// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use netlens_app::{Endpoint, Row, RowSet};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Blocking client for the analysis backend. Every route answers with a
/// `{"data": [...]}` envelope of flat rows.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        let base_url =
            Url::parse(trimmed).with_context(|| format!("parse backend.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "backend.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if base_url.cannot_be_a_base() {
            bail!("backend.base_url {trimmed:?} cannot carry a path");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for an endpoint, with each segment percent-encoded.
    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }

    pub fn fetch_rows(&self, endpoint: &Endpoint) -> Result<Vec<Row>> {
        let url = self.url_for(endpoint)?;
        tracing::debug!(%url, "fetching rows");
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|error| connection_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: RowSet = response
            .json()
            .with_context(|| format!("decode rows from {}", url.path()))?;
        tracing::trace!(%url, rows = parsed.data.len(), "rows fetched");
        Ok(parsed.data)
    }

    /// Confirms the backend answers the profile listing.
    pub fn ping(&self) -> Result<usize> {
        self.fetch_rows(&Endpoint::Profiles).map(|rows| rows.len())
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- is the analysis web server running? ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('<') && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response};
    use netlens_app::{AlertId, Endpoint, ProfileId, TimeWindowId, ViewKind};
    use reqwest::StatusCode;
    use std::time::Duration;

    fn client_for(base: &str) -> Client {
        Client::new(base, Duration::from_secs(1)).expect("client should initialize")
    }

    #[test]
    fn new_rejects_empty_and_non_http_urls() {
        assert!(Client::new("  ", Duration::from_secs(1)).is_err());
        let error = Client::new("ftp://localhost", Duration::from_secs(1))
            .expect_err("ftp should be rejected");
        assert!(error.to_string().contains("http or https"));
    }

    #[test]
    fn url_for_appends_view_route_to_base_path() {
        let client = client_for("http://localhost:55000/");
        let url = client
            .url_for(&Endpoint::View {
                view: ViewKind::TimelineFlows,
                profile: ProfileId::from("192.168.1.5"),
                time_window: TimeWindowId::from("timewindow1"),
            })
            .expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:55000/analysis/timeline_flows/192.168.1.5/timewindow1"
        );

        let prefixed = client_for("http://example.test/slips");
        let url = prefixed.url_for(&Endpoint::Profiles).expect("url");
        assert_eq!(url.as_str(), "http://example.test/slips/analysis/profiles_tws");
    }

    #[test]
    fn url_for_keeps_trailing_slash_on_general_evidence() {
        let client = client_for("http://localhost:55000");
        let url = client
            .url_for(&Endpoint::View {
                view: ViewKind::Evidence,
                profile: ProfileId::from("10.0.0.1"),
                time_window: TimeWindowId::from("tw3"),
            })
            .expect("url");
        assert_eq!(url.path(), "/analysis/evidence/10.0.0.1/tw3/");

        let nested = client
            .url_for(&Endpoint::Evidence {
                profile: ProfileId::from("10.0.0.1"),
                time_window: TimeWindowId::from("tw3"),
                alert: AlertId::from("7"),
            })
            .expect("url");
        assert_eq!(nested.path(), "/analysis/evidence/10.0.0.1/tw3/7");
    }

    #[test]
    fn url_for_escapes_reserved_characters_in_segments() {
        let client = client_for("http://localhost:55000");
        let url = client
            .url_for(&Endpoint::Info {
                key: "a/b c".to_owned(),
            })
            .expect("url");
        assert_eq!(url.path(), "/analysis/info/a%2Fb%20c");
    }

    #[test]
    fn clean_error_response_prefers_structured_message() {
        let error = clean_error_response(
            StatusCode::NOT_FOUND,
            r#"{"error":"profile not found"}"#,
        );
        assert_eq!(error.to_string(), "server error (404): profile not found");

        let error = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(error.to_string(), "server error (502): upstream down");

        let error = clean_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>Internal Server Error</body></html>",
        );
        assert_eq!(error.to_string(), "server returned 500");
    }
}
