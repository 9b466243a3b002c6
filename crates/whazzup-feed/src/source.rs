// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP feed sources.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;

use crate::poller::FeedSource;
use crate::protocol::FeedError;

/// Structured v2 tracker endpoint.
pub const TRACKER_URL: &str = "https://api.ivao.aero/v2/tracker/whazzup";
/// Legacy whazzup text endpoint.
pub const LEGACY_URL: &str = "https://api.ivao.aero/getdata/whazzup/whazzup.txt";
/// AVWX METAR endpoint; the station is appended.
pub const AVWX_METAR_URL: &str = "https://avwx.rest/api/metar";

/// Environment variable holding the AVWX token.
pub const AVWX_TOKEN_ENV: &str = "AVWX_API_TOKEN";
/// Token value shipped in sample configs, treated as no token.
pub const AVWX_TOKEN_PLACEHOLDER: &str = "your_avwx_api_token_here";

fn build_client(timeout: Duration) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("whazzup-feed/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FeedError::NetworkFailure(format!("http client: {e}")))
}

async fn get_text(request: reqwest::RequestBuilder, what: &str) -> Result<String, FeedError> {
    let response = request
        .send()
        .await
        .map_err(|e| FeedError::NetworkFailure(format!("{what}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::NetworkFailure(format!("{what}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| FeedError::NetworkFailure(format!("{what}: {e}")))
}

/// Plain GET of one document.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    url: String,
    accept: &'static str,
    client: Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, accept: &'static str, timeout: Duration) -> Result<Self, FeedError> {
        Ok(Self {
            url: url.into(),
            accept,
            client: build_client(timeout)?,
        })
    }

    /// The tracker JSON document.
    pub fn tracker(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        Self::new(url, "application/json", timeout)
    }

    /// The legacy whazzup text file.
    pub fn legacy(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        Self::new(url, "text/plain", timeout)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    type Payload = String;

    async fn fetch(&self) -> Result<String, FeedError> {
        debug!("GET {}", self.url);
        let body = get_text(
            self.client.get(&self.url).header(ACCEPT, self.accept),
            &self.url,
        )
        .await?;
        debug!("{}: {} bytes", self.url, body.len());
        Ok(body)
    }
}

/// One station's response from a METAR cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct StationPayload {
    pub station: String,
    pub body: Result<String, FeedError>,
}

/// Fetches one METAR report per station from AVWX.
#[derive(Debug, Clone)]
pub struct MetarFeed {
    base_url: String,
    stations: Vec<String>,
    token: Option<String>,
    client: Client,
}

/// A usable token: present, non-blank and not the sample placeholder.
#[must_use]
pub fn usable_token(token: Option<&str>) -> Option<&str> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != AVWX_TOKEN_PLACEHOLDER)
}

impl MetarFeed {
    pub fn new(
        base_url: impl Into<String>,
        stations: Vec<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let token = usable_token(token.as_deref()).map(str::to_string);
        if token.is_none() {
            warn!("No AVWX token configured; set {AVWX_TOKEN_ENV} for live weather");
        }
        Ok(Self {
            base_url: base_url.into(),
            stations,
            token,
            client: build_client(timeout)?,
        })
    }

    #[must_use]
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    fn station_url(&self, station: &str) -> String {
        format!(
            "{}/{}?format=json&options=info",
            self.base_url.trim_end_matches('/'),
            station
        )
    }
}

#[async_trait]
impl FeedSource for MetarFeed {
    type Payload = Vec<StationPayload>;

    async fn fetch(&self) -> Result<Vec<StationPayload>, FeedError> {
        let token = self
            .token
            .as_deref()
            .ok_or(FeedError::MissingToken(AVWX_TOKEN_ENV))?;

        let mut payloads = Vec::with_capacity(self.stations.len());
        for station in &self.stations {
            let request = self
                .client
                .get(self.station_url(station))
                .header(AUTHORIZATION, format!("BEARER {token}"))
                .header(ACCEPT, "application/json");
            let body = get_text(request, station).await;
            if let Err(e) = &body {
                warn!("METAR {station}: {e}");
            }
            payloads.push(StationPayload {
                station: station.clone(),
                body,
            });
        }
        Ok(payloads)
    }
}
