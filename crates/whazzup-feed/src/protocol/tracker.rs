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

//! Structured v2 tracker document (`/v2/tracker/whazzup`).
//!
//! Only the fields the board consumes are declared. Every nested object is
//! optional and every scalar carries a serde default, so a sparse entry
//! decodes instead of failing the whole document. Entries that still fail to
//! decode (a `null` altitude, a string rating) are dropped one by one.

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::{FeedError, FeedParser, RawFeedRecord};

/// Top-level tracker document.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    #[serde(default)]
    pub updated_at: Option<String>,
    pub clients: TrackerClients,
}

/// Client lists of the tracker document.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TrackerClients {
    #[serde(default, deserialize_with = "skip_bad_entries")]
    pub pilots: Vec<PilotClient>,
    #[serde(default, deserialize_with = "skip_bad_entries")]
    pub atcs: Vec<AtcClient>,
}

/// Decode a client list entry by entry, dropping entries that do not decode.
/// A `null` list is empty.
fn skip_bad_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(client) => Some(client),
            Err(e) => {
                debug!("tracker: skipping client entry {index}: {e}");
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PilotClient {
    pub id: u64,
    pub callsign: Option<String>,
    pub server_id: Option<String>,
    pub time: u64,
    pub last_track: Option<TrackPoint>,
    pub flight_plan: Option<FlightPlan>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackPoint {
    pub altitude: f64,
    pub ground_speed: f64,
    pub heading: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub on_ground: bool,
    pub state: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightPlan {
    pub aircraft_id: Option<String>,
    pub departure_id: Option<String>,
    pub arrival_id: Option<String>,
    pub aircraft: Option<FlightPlanAircraft>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlightPlanAircraft {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AtcClient {
    pub id: u64,
    pub callsign: Option<String>,
    pub server_id: Option<String>,
    pub rating: u8,
    pub created_at: Option<String>,
    pub time: u64,
    pub atc_session: Option<AtcSession>,
    pub atis: Option<Atis>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtcSession {
    pub frequency: f64,
    pub position: Option<String>,
}

/// ATIS broadcast attached to a controller session.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Atis {
    pub lines: Vec<String>,
    pub revision: String,
    pub timestamp: String,
}

/// Parser for the tracker JSON document.
///
/// Emits pilots first, then controllers, each in document order.
#[derive(Debug, Default)]
pub struct TrackerJsonParser;

impl TrackerJsonParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode the document without flattening it into records.
    pub fn decode(payload: &str) -> Result<TrackerSnapshot, FeedError> {
        serde_json::from_str(payload)
            .map_err(|e| FeedError::MalformedFeed(format!("tracker document: {e}")))
    }
}

impl FeedParser for TrackerJsonParser {
    type Record = RawFeedRecord;

    fn parse(&mut self, payload: &str) -> Result<Vec<RawFeedRecord>, FeedError> {
        let snapshot = Self::decode(payload)?;
        let TrackerClients { pilots, atcs } = snapshot.clients;

        Ok(pilots
            .into_iter()
            .map(RawFeedRecord::Pilot)
            .chain(atcs.into_iter().map(RawFeedRecord::Controller))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "updatedAt": "2025-06-01T12:00:00Z",
        "clients": {
            "pilots": [
                {
                    "id": 7,
                    "callsign": "RJA501",
                    "lastTrack": {"altitude": 33000, "groundSpeed": 460, "heading": 135,
                                  "latitude": 31.9, "longitude": 36.1, "onGround": false,
                                  "state": "En Route", "timestamp": "2025-06-01T11:59:30Z"},
                    "flightPlan": {"aircraftId": "A320", "departureId": "OJAI",
                                   "arrivalId": "OMDB", "aircraft": {"model": "Airbus A320"}}
                },
                {"id": 8, "callsign": "NOFPL"}
            ],
            "atcs": [
                {"id": 9, "callsign": "OJAI_TWR", "rating": 3, "time": 3900,
                 "atcSession": {"frequency": 118.1, "position": "TWR"},
                 "atis": {"lines": ["OJAI ATIS A"], "revision": "A", "timestamp": "x"}}
            ]
        }
    }"#;

    #[test]
    fn test_decode_full_document() {
        let snapshot = TrackerJsonParser::decode(DOCUMENT).unwrap();
        assert_eq!(snapshot.updated_at.as_deref(), Some("2025-06-01T12:00:00Z"));
        assert_eq!(snapshot.clients.pilots.len(), 2);

        let pilot = &snapshot.clients.pilots[0];
        let track = pilot.last_track.as_ref().unwrap();
        assert!((track.altitude - 33000.0).abs() < f64::EPSILON);
        assert_eq!(track.state.as_deref(), Some("En Route"));
        let plan = pilot.flight_plan.as_ref().unwrap();
        assert_eq!(plan.departure_id.as_deref(), Some("OJAI"));
        assert_eq!(
            plan.aircraft.as_ref().and_then(|a| a.model.as_deref()),
            Some("Airbus A320")
        );

        let atc = &snapshot.clients.atcs[0];
        assert_eq!(atc.rating, 3);
        assert_eq!(atc.atc_session.as_ref().unwrap().position.as_deref(), Some("TWR"));
        assert_eq!(atc.atis.as_ref().unwrap().revision, "A");
    }

    #[test]
    fn test_missing_flight_plan_does_not_fault() {
        let snapshot = TrackerJsonParser::decode(DOCUMENT).unwrap();
        let pilot = &snapshot.clients.pilots[1];
        assert!(pilot.flight_plan.is_none());
        assert!(pilot.last_track.is_none());
    }

    #[test]
    fn test_parse_orders_pilots_before_controllers() {
        let records = TrackerJsonParser::new().parse(DOCUMENT).unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], RawFeedRecord::Pilot(ref p) if p.id == 7));
        assert!(matches!(records[1], RawFeedRecord::Pilot(ref p) if p.id == 8));
        assert!(matches!(records[2], RawFeedRecord::Controller(ref c) if c.id == 9));
    }

    #[test]
    fn test_missing_client_lists_are_empty() {
        let snapshot = TrackerJsonParser::decode(r#"{"clients": {}}"#).unwrap();
        assert!(snapshot.clients.pilots.is_empty());
        assert!(snapshot.clients.atcs.is_empty());
    }

    #[test]
    fn test_missing_clients_object_is_malformed() {
        let result = TrackerJsonParser::new().parse(r#"{"updatedAt": "now"}"#);
        assert!(matches!(result, Err(FeedError::MalformedFeed(_))));

        let result = TrackerJsonParser::new().parse("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(FeedError::MalformedFeed(_))));
    }

    #[test]
    fn test_bad_entry_is_dropped_not_the_document() {
        let document = r#"{"clients": {
            "pilots": [
                {"id": 1, "callsign": "RJA1", "lastTrack": {"altitude": 12000}},
                {"id": 2, "callsign": "RJA2", "lastTrack": {"altitude": null}},
                "not a pilot"
            ],
            "atcs": [
                {"id": 3, "callsign": "OJAI_TWR", "rating": "high"},
                {"id": 4, "callsign": "OJAI_GND", "rating": 2}
            ]
        }}"#;

        let records = TrackerJsonParser::new().parse(document).unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], RawFeedRecord::Pilot(ref p) if p.id == 1));
        assert!(matches!(records[1], RawFeedRecord::Controller(ref c) if c.id == 4));
    }

    #[test]
    fn test_null_client_list_is_empty() {
        let snapshot = TrackerJsonParser::decode(r#"{"clients": {"pilots": null, "atcs": []}}"#).unwrap();
        assert!(snapshot.clients.pilots.is_empty());
    }
}
