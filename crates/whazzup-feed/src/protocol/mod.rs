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

//! Protocol layer for network feed parsing.
//!
//! Upstream payloads come in three shapes: the legacy colon-delimited
//! whazzup text file, the structured v2 tracker JSON document, and AVWX
//! METAR JSON reports. Each parser turns one payload into records that the
//! [`entity`](crate::entity) layer normalizes.

mod legacy;
mod metar;
mod tracker;

pub use legacy::{LegacyClient, LegacyTextParser, CLIENTS_MARKER, MIN_LEGACY_FIELDS};
pub use metar::{
    CodeEntry, MetarInfo, MetarReport, Reading, Scalar, WeatherObservation, WindDirection,
    DEFAULT_PRESSURE, DEFAULT_TEMPERATURE, DEFAULT_VISIBILITY, DEFAULT_WIND_SPEED,
    DEWPOINT_OFFSET,
};
pub use tracker::{
    Atis, AtcSession, AtcClient, FlightPlan, FlightPlanAircraft, PilotClient, TrackPoint,
    TrackerClients, TrackerJsonParser, TrackerSnapshot,
};

use thiserror::Error;

/// Errors raised while fetching or decoding a feed.
///
/// Per-record problems never surface here; parsers skip the offending
/// record. These variants fail a whole poll cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// Structural markers of the payload are absent or unparseable.
    #[error("malformed feed: {0}")]
    MalformedFeed(String),

    /// The request was rejected or returned a non-success status.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// No API token is configured for an authenticated feed.
    #[error("no API token configured for {0}")]
    MissingToken(&'static str),
}

/// A record as it came off the wire, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFeedRecord {
    /// Pilot entry from the tracker JSON document.
    Pilot(PilotClient),
    /// Controller entry from the tracker JSON document.
    Controller(AtcClient),
    /// One positional line from the legacy text file.
    Legacy(LegacyClient),
}

/// Trait for feed parsers.
///
/// Implement this trait to add support for new upstream formats.
pub trait FeedParser {
    /// The record type produced by this parser.
    type Record;

    /// Parse one complete payload into records, preserving input order.
    ///
    /// Fails only when the payload as a whole is unusable; individual bad
    /// records are dropped.
    fn parse(&mut self, payload: &str) -> Result<Vec<Self::Record>, FeedError>;
}
