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

//! Canonical entity shape shared by every feed.
//!
//! Raw records from either whazzup format are normalized here. Any field the
//! record cannot supply gets the default documented on the field, so two
//! normalizations of the same record are always identical.

use std::fmt;

use log::debug;

use crate::protocol::{AtcClient, Atis, LegacyClient, PilotClient, RawFeedRecord};

/// Placeholder for text fields the feed did not provide.
pub const UNKNOWN: &str = "Unknown";

/// Longest raw excerpt retained on an entity, in characters.
pub const EXCERPT_CHARS: usize = 50;

/// What an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A pilot connection with an aircraft.
    Aircraft,
    /// An air traffic control session.
    Controller,
}

/// Controller position type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControllerRole {
    Delivery,
    Ground,
    Tower,
    Approach,
    Center,
    /// ATIS, FSS, observers and anything unrecognized.
    Other,
}

impl ControllerRole {
    /// Map a position code (`DEL`, `GND`, `TWR`, `APP`, `CTR`) to a role.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "DEL" => Self::Delivery,
            "GND" => Self::Ground,
            "TWR" => Self::Tower,
            "APP" => Self::Approach,
            "CTR" => Self::Center,
            _ => Self::Other,
        }
    }

    /// Derive the role from the callsign suffix (`OJAI_TWR` is a tower).
    #[must_use]
    pub fn from_callsign(callsign: &str) -> Self {
        callsign
            .rsplit_once('_')
            .map_or(Self::Other, |(_, suffix)| Self::from_code(suffix))
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Delivery => "DEL",
            Self::Ground => "GND",
            Self::Tower => "TWR",
            Self::Approach => "APP",
            Self::Center => "CTR",
            Self::Other => "OTHER",
        }
    }

    /// Whether the role staffs an operational position.
    #[must_use]
    pub fn is_operational(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for ControllerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Motion state of an aircraft. All values default to zero / `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Motion {
    /// Altitude in feet.
    pub altitude: i32,
    /// Ground speed in knots.
    pub ground_speed: i32,
    /// Heading in degrees.
    pub heading: i32,
    pub on_ground: bool,
}

/// The canonical record every pipeline stage works on.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntity {
    /// Network id; 0 for the legacy feed, which carries none.
    pub id: u64,
    /// Callsign; [`UNKNOWN`] when absent.
    pub callsign: String,
    pub kind: EntityKind,
    /// None when the feed reported no position.
    pub position: Option<Position>,
    /// Always present for aircraft (zeros when unreported), None for controllers.
    pub motion: Option<Motion>,
    /// Always present for controllers, None for aircraft.
    pub role: Option<ControllerRole>,
    /// Departure identifier; None without a flight plan.
    pub origin: Option<String>,
    /// Arrival identifier; None without a flight plan.
    pub destination: Option<String>,
    /// Aircraft model, else aircraft id, else [`UNKNOWN`].
    pub aircraft_model: String,
    /// Flight state reported by the tracker, else [`UNKNOWN`].
    pub flight_state: String,
    /// Transponder code; empty when unreported.
    pub squawk: String,
    /// Frequency in MHz; 0.0 when unreported.
    pub frequency: f64,
    /// Controller rating index; 0 when unreported.
    pub rating: u8,
    /// Server id, else [`UNKNOWN`].
    pub server_id: String,
    /// Seconds connected; 0 when unreported.
    pub session_secs: u64,
    pub atis: Option<Atis>,
    /// Time of the last track report; empty when unreported.
    pub timestamp: String,
    /// Up to [`EXCERPT_CHARS`] characters of the source text; empty when none.
    pub raw_excerpt: String,
}

/// Truncate `text` to `max_chars` characters, marking the cut with `...`.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn or_unknown(value: Option<&str>, field: &str, callsign: &str) -> String {
    non_empty(value).unwrap_or_else(|| {
        debug!("{callsign}: no {field}, using {UNKNOWN}");
        UNKNOWN.to_string()
    })
}

#[allow(clippy::cast_possible_truncation, reason = "feed values are well inside i32")]
fn round_i32(value: f64) -> i32 {
    if value.is_finite() {
        value.round() as i32
    } else {
        0
    }
}

impl NormalizedEntity {
    fn blank(kind: EntityKind) -> Self {
        Self {
            id: 0,
            callsign: UNKNOWN.to_string(),
            kind,
            position: None,
            motion: None,
            role: None,
            origin: None,
            destination: None,
            aircraft_model: UNKNOWN.to_string(),
            flight_state: UNKNOWN.to_string(),
            squawk: String::new(),
            frequency: 0.0,
            rating: 0,
            server_id: UNKNOWN.to_string(),
            session_secs: 0,
            atis: None,
            timestamp: String::new(),
            raw_excerpt: String::new(),
        }
    }

    /// Normalize one raw record.
    ///
    /// Returns None only for legacy lines whose client type is neither a
    /// pilot nor a controller.
    #[must_use]
    pub fn from_record(record: &RawFeedRecord) -> Option<Self> {
        match record {
            RawFeedRecord::Pilot(pilot) => Some(Self::from_pilot(pilot)),
            RawFeedRecord::Controller(atc) => Some(Self::from_controller(atc)),
            RawFeedRecord::Legacy(line) => Self::from_legacy(line),
        }
    }

    #[must_use]
    pub fn from_pilot(pilot: &PilotClient) -> Self {
        let callsign = or_unknown(pilot.callsign.as_deref(), "callsign", "pilot");
        let plan = pilot.flight_plan.as_ref();
        let track = pilot.last_track.as_ref();

        let model = plan
            .and_then(|p| p.aircraft.as_ref())
            .and_then(|a| non_empty(a.model.as_deref()))
            .or_else(|| plan.and_then(|p| non_empty(p.aircraft_id.as_deref())));

        let position = track.and_then(|t| match (t.latitude, t.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position { latitude, longitude }),
            _ => None,
        });

        let motion = track.map_or_else(Motion::default, |t| Motion {
            altitude: round_i32(t.altitude),
            ground_speed: round_i32(t.ground_speed),
            heading: round_i32(t.heading),
            on_ground: t.on_ground,
        });

        Self {
            id: pilot.id,
            aircraft_model: model.unwrap_or_else(|| {
                debug!("{callsign}: no aircraft model, using {UNKNOWN}");
                UNKNOWN.to_string()
            }),
            flight_state: or_unknown(track.and_then(|t| t.state.as_deref()), "state", &callsign),
            server_id: or_unknown(pilot.server_id.as_deref(), "server", &callsign),
            origin: plan.and_then(|p| non_empty(p.departure_id.as_deref())),
            destination: plan.and_then(|p| non_empty(p.arrival_id.as_deref())),
            position,
            motion: Some(motion),
            session_secs: pilot.time,
            timestamp: track
                .and_then(|t| t.timestamp.clone())
                .unwrap_or_default(),
            callsign,
            ..Self::blank(EntityKind::Aircraft)
        }
    }

    #[must_use]
    pub fn from_controller(atc: &AtcClient) -> Self {
        let callsign = or_unknown(atc.callsign.as_deref(), "callsign", "controller");
        let session = atc.atc_session.as_ref();

        let role = session
            .and_then(|s| non_empty(s.position.as_deref()))
            .map_or_else(|| ControllerRole::from_callsign(&callsign), |p| ControllerRole::from_code(&p));

        let raw_excerpt = atc
            .atis
            .as_ref()
            .and_then(|a| a.lines.first())
            .map(|line| excerpt(line, EXCERPT_CHARS))
            .unwrap_or_default();

        Self {
            id: atc.id,
            role: Some(role),
            frequency: session.map_or(0.0, |s| s.frequency),
            rating: atc.rating,
            server_id: or_unknown(atc.server_id.as_deref(), "server", &callsign),
            session_secs: atc.time,
            atis: atc.atis.clone(),
            timestamp: atc.created_at.clone().unwrap_or_default(),
            raw_excerpt,
            callsign,
            ..Self::blank(EntityKind::Controller)
        }
    }

    #[must_use]
    pub fn from_legacy(client: &LegacyClient) -> Option<Self> {
        let kind = if client.is_pilot() {
            EntityKind::Aircraft
        } else if client.is_atc() {
            EntityKind::Controller
        } else {
            debug!("{}: ignoring client type {:?}", client.callsign, client.client_type);
            return None;
        };

        let callsign = or_unknown(Some(&client.callsign), "callsign", "legacy client");
        let mut entity = Self {
            position: Some(Position {
                latitude: client.latitude,
                longitude: client.longitude,
            }),
            squawk: client.squawk.clone(),
            raw_excerpt: excerpt(&client.line, EXCERPT_CHARS),
            ..Self::blank(kind)
        };

        match kind {
            EntityKind::Aircraft => {
                entity.motion = Some(Motion {
                    altitude: client.altitude,
                    ground_speed: client.ground_speed,
                    heading: client.heading,
                    on_ground: client.on_ground,
                });
            }
            EntityKind::Controller => {
                entity.role = Some(ControllerRole::from_callsign(&callsign));
            }
        }
        entity.callsign = callsign;

        Some(entity)
    }

    /// Identifiers tested against prefix membership rules.
    ///
    /// Controllers are matched on their callsign, aircraft on their flight
    /// plan endpoints.
    #[must_use]
    pub fn membership_identifiers(&self) -> Vec<&str> {
        match self.kind {
            EntityKind::Controller => vec![self.callsign.as_str()],
            EntityKind::Aircraft => self
                .origin
                .iter()
                .chain(self.destination.iter())
                .map(String::as_str)
                .collect(),
        }
    }

    /// Whether the entity carries any flight plan endpoint.
    #[must_use]
    pub fn has_endpoints(&self) -> bool {
        self.origin.is_some() || self.destination.is_some()
    }
}

/// Normalize a batch of raw records, preserving input order.
#[must_use]
pub fn normalize_all(records: &[RawFeedRecord]) -> Vec<NormalizedEntity> {
    records.iter().filter_map(NormalizedEntity::from_record).collect()
}
