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

//! Presentation fields derived from entities and observations.
//!
//! Every function here is total: inputs that fit no rule land in an explicit
//! `Unknown` / `Clear` bucket.

use std::fmt;

use crate::entity::{excerpt, Motion, NormalizedEntity, EXCERPT_CHARS};
use crate::protocol::{WeatherObservation, WindDirection};
use crate::region::RegionDefinition;

/// Ground speed below which a surface-tracked aircraft counts as arriving.
pub const INBOUND_SPEED_KTS: i32 = 50;

const COMPASS_16: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];
const COMPASS_8: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Precipitation and obscuration codes, highest priority first.
const PRECIPITATION: [(&str, Condition); 7] = [
    ("RA", Condition::Rain),
    ("SN", Condition::Snow),
    ("FG", Condition::Fog),
    ("BR", Condition::Mist),
    ("HZ", Condition::Haze),
    ("TS", Condition::Thunderstorm),
    ("SH", Condition::Showers),
];

/// Cloud cover codes, most severe first.
const CLOUD_COVER: [(&str, Condition); 4] = [
    ("OVC", Condition::Cloudy),
    ("BKN", Condition::MostlyCloudy),
    ("SCT", Condition::PartlyCloudy),
    ("FEW", Condition::FewClouds),
];

/// Human readable sky condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Rain,
    Snow,
    Fog,
    Mist,
    Haze,
    Thunderstorm,
    Showers,
    Cloudy,
    MostlyCloudy,
    PartlyCloudy,
    FewClouds,
    Clear,
}

impl Condition {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Fog => "Fog",
            Self::Mist => "Mist",
            Self::Haze => "Haze",
            Self::Thunderstorm => "Thunderstorm",
            Self::Showers => "Showers",
            Self::Cloudy => "Cloudy",
            Self::MostlyCloudy => "Mostly Cloudy",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::FewClouds => "Few Clouds",
            Self::Clear => "Clear",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Drop a leading intensity qualifier (`-RA`, `+SN`).
fn bare_code(code: &str) -> &str {
    code.trim().trim_start_matches(['+', '-'])
}

fn first_match<S: AsRef<str>>(codes: &[S], table: &[(&str, Condition)]) -> Option<Condition> {
    table.iter().find_map(|(code, condition)| {
        codes
            .iter()
            .any(|c| bare_code(c.as_ref()).eq_ignore_ascii_case(code))
            .then_some(*condition)
    })
}

/// Classify the sky from weather and cloud codes.
///
/// Precipitation overrides cloud cover; no code at all is [`Condition::Clear`].
#[must_use]
pub fn classify_condition<S: AsRef<str>>(weather_codes: &[S], cloud_codes: &[S]) -> Condition {
    first_match(weather_codes, &PRECIPITATION)
        .or_else(|| first_match(cloud_codes, &CLOUD_COVER))
        .unwrap_or(Condition::Clear)
}

fn magnus(celsius: f64) -> f64 {
    (17.625 * celsius / (243.04 + celsius)).exp()
}

/// Relative humidity in percent from temperature and dew point (Magnus form).
#[must_use]
#[allow(clippy::cast_possible_truncation, reason = "humidity is a small percentage")]
pub fn humidity(temperature: f64, dewpoint: f64) -> i32 {
    (100.0 * magnus(dewpoint) / magnus(temperature)).round() as i32
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "point counts are 8 or 16 and the index is reduced modulo them"
)]
fn compass_index(degrees: f64, points: usize) -> usize {
    let sector = 360.0 / points as f64;
    let index = (degrees / sector).round() as i64;
    // rem_euclid keeps negative headings on the rose
    index.rem_euclid(points as i64) as usize
}

/// 16-point compass label for a wind direction.
#[must_use]
pub fn compass16(degrees: f64) -> &'static str {
    if degrees.is_finite() {
        COMPASS_16[compass_index(degrees, COMPASS_16.len())]
    } else {
        "VRB"
    }
}

/// 8-point compass label for a heading.
#[must_use]
pub fn compass8(degrees: f64) -> &'static str {
    if degrees.is_finite() {
        COMPASS_8[compass_index(degrees, COMPASS_8.len())]
    } else {
        "N"
    }
}

/// Traffic direction relative to one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Departing the region.
    Outbound,
    /// Arriving in the region.
    Inbound,
    /// Both endpoints inside the region.
    Domestic,
    Unknown,
}

impl Direction {
    /// Short board label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Outbound => "DEP",
            Self::Inbound => "ARR",
            Self::Domestic => "DOMESTIC",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Direction from surface motion alone, for feeds without flight plans.
    #[must_use]
    pub fn from_motion(motion: &Motion) -> Self {
        if motion.on_ground || motion.ground_speed < INBOUND_SPEED_KTS {
            Self::Inbound
        } else {
            Self::Outbound
        }
    }
}

/// Direction of `entity` relative to `region`, from its flight plan endpoints.
#[must_use]
pub fn classify_direction(region: &RegionDefinition, entity: &NormalizedEntity) -> Direction {
    let matches = |endpoint: &Option<String>| {
        endpoint
            .as_deref()
            .is_some_and(|id| region.membership.matches_identifier(id))
    };

    match (matches(&entity.origin), matches(&entity.destination)) {
        (true, true) => Direction::Domestic,
        (true, false) => Direction::Outbound,
        (false, true) => Direction::Inbound,
        (false, false) => Direction::Unknown,
    }
}

/// Direction used for counting: endpoints when the entity has any, else motion.
#[must_use]
pub fn count_direction(region: &RegionDefinition, entity: &NormalizedEntity) -> Direction {
    if entity.has_endpoints() {
        classify_direction(region, entity)
    } else {
        entity
            .motion
            .as_ref()
            .map_or(Direction::Unknown, Direction::from_motion)
    }
}

/// A weather observation ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub station: String,
    pub condition: Condition,
    pub temperature: i32,
    pub dewpoint: i32,
    pub humidity: i32,
    pub wind_speed: i32,
    /// Compass label, or the text the report carried (`VRB`).
    pub wind_direction: String,
    pub visibility: i32,
    pub pressure: i32,
    /// First cloud layer code, `CLR` when there is none.
    pub clouds: String,
    /// The raw METAR truncated for display.
    pub metar_excerpt: String,
    pub raw_metar: String,
}

#[allow(clippy::cast_possible_truncation, reason = "weather readings are small")]
fn round(value: f64) -> i32 {
    value.round() as i32
}

impl WeatherReport {
    #[must_use]
    pub fn from_observation(obs: &WeatherObservation) -> Self {
        let wind_direction = match &obs.wind_direction {
            WindDirection::Degrees(degrees) => compass16(*degrees).to_string(),
            WindDirection::Text(text) => text.clone(),
        };

        Self {
            station: obs.station.clone(),
            condition: classify_condition(&obs.weather_codes, &obs.cloud_codes),
            temperature: round(obs.temperature),
            dewpoint: round(obs.dewpoint),
            humidity: humidity(obs.temperature, obs.dewpoint),
            wind_speed: round(obs.wind_speed),
            wind_direction,
            visibility: round(obs.visibility),
            pressure: round(obs.pressure),
            clouds: obs
                .cloud_codes
                .first()
                .cloned()
                .unwrap_or_else(|| "CLR".to_string()),
            metar_excerpt: excerpt(&obs.raw, EXCERPT_CHARS),
            raw_metar: obs.raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::region::MembershipRule;

    fn fir() -> RegionDefinition {
        RegionDefinition {
            key: "OJAC".to_string(),
            label: "Amman FIR".to_string(),
            country: "Jordan".to_string(),
            center_capable: true,
            membership: MembershipRule::Prefixes(vec!["OJAI".to_string(), "OJAM".to_string()]),
        }
    }

    fn flight(origin: Option<&str>, destination: Option<&str>) -> NormalizedEntity {
        let mut entity = NormalizedEntity::from_pilot(&crate::protocol::PilotClient::default());
        entity.origin = origin.map(str::to_string);
        entity.destination = destination.map(str::to_string);
        assert_eq!(entity.kind, EntityKind::Aircraft);
        entity
    }

    #[test]
    fn test_precipitation_beats_clouds() {
        assert_eq!(classify_condition(&["RA"], &["OVC"]), Condition::Rain);
        assert_eq!(classify_condition(&["-RA"], &["OVC"]), Condition::Rain);
        assert_eq!(classify_condition(&["BR", "SN"], &[]), Condition::Snow);
    }

    #[test]
    fn test_cloud_priority_most_severe_first() {
        let none: [&str; 0] = [];
        assert_eq!(classify_condition(&none, &["FEW", "BKN"]), Condition::MostlyCloudy);
        assert_eq!(classify_condition(&none, &["SCT", "OVC"]), Condition::Cloudy);
        assert_eq!(classify_condition(&none, &["FEW"]), Condition::FewClouds);
        assert_eq!(classify_condition(&["VCSH"], &["NSC"]), Condition::Clear);
        assert_eq!(classify_condition(&none, &none), Condition::Clear);
    }

    #[test]
    fn test_humidity_values() {
        assert_eq!(humidity(20.0, 20.0), 100);
        assert_eq!(humidity(28.0, 15.0), 45);
        assert_eq!(humidity(25.0, 20.0), humidity(25.0, 20.0));
    }

    #[test]
    fn test_compass_labels() {
        assert_eq!(compass16(270.0), "W");
        assert_eq!(compass16(0.0), "N");
        assert_eq!(compass16(355.0), "N");
        assert_eq!(compass16(320.0), "NW");
        assert_eq!(compass16(-22.5), "NNW");
        assert_eq!(compass8(90.0), "E");
        assert_eq!(compass8(135.0), "SE");
        assert_eq!(compass8(350.0), "N");
        assert_eq!(compass8(f64::NAN), "N");
    }

    #[test]
    fn test_direction_from_endpoints() {
        let region = fir();
        assert_eq!(
            classify_direction(&region, &flight(Some("OJAI"), Some("OMDB"))),
            Direction::Outbound
        );
        assert_eq!(
            classify_direction(&region, &flight(Some("LLBG"), Some("ojam"))),
            Direction::Inbound
        );
        assert_eq!(
            classify_direction(&region, &flight(Some("OJAI"), Some("OJAM"))),
            Direction::Domestic
        );
        assert_eq!(
            classify_direction(&region, &flight(Some("EGLL"), None)),
            Direction::Unknown
        );
    }

    #[test]
    fn test_count_direction_falls_back_to_motion() {
        let region = fir();
        let mut entity = flight(None, None);
        entity.motion = Some(Motion {
            ground_speed: 420,
            ..Motion::default()
        });
        assert_eq!(count_direction(&region, &entity), Direction::Outbound);

        entity.motion = Some(Motion {
            ground_speed: 120,
            on_ground: true,
            ..Motion::default()
        });
        assert_eq!(count_direction(&region, &entity), Direction::Inbound);

        entity.motion = Some(Motion {
            ground_speed: 49,
            ..Motion::default()
        });
        assert_eq!(count_direction(&region, &entity), Direction::Inbound);
    }

    #[test]
    fn test_weather_report_from_observation() {
        let obs = WeatherObservation {
            station: "OJAI".to_string(),
            raw: "OJAI 281200Z 32012KT 10SM CLR 28/15 Q1013 NOSIG TEMPO 30015G25KT".to_string(),
            temperature: 28.4,
            dewpoint: 15.0,
            wind_speed: 12.0,
            wind_direction: WindDirection::Degrees(320.0),
            visibility: 10.0,
            pressure: 1013.2,
            weather_codes: vec![],
            cloud_codes: vec![],
        };
        let report = WeatherReport::from_observation(&obs);
        assert_eq!(report.condition, Condition::Clear);
        assert_eq!(report.temperature, 28);
        assert_eq!(report.wind_direction, "NW");
        assert_eq!(report.clouds, "CLR");
        assert_eq!(report.pressure, 1013);
        assert!(report.metar_excerpt.ends_with("..."));
        assert_eq!(report.metar_excerpt.chars().count(), EXCERPT_CHARS + 3);
    }
}
