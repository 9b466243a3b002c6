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

//! AVWX METAR report decoding.
//!
//! AVWX reports a reading either as a bare number, a bare string, or an
//! object carrying a `value`. [`Reading`] captures all three once at decode
//! time and [`MetarReport::observe`] resolves every field to a concrete
//! value, substituting the documented defaults below.

use log::debug;
use serde::Deserialize;

use super::FeedError;

/// Temperature used when the report carries none, in °C.
pub const DEFAULT_TEMPERATURE: f64 = 25.0;
/// Dew point default is the temperature minus this offset.
pub const DEWPOINT_OFFSET: f64 = 5.0;
/// Wind speed used when the report carries none, in knots.
pub const DEFAULT_WIND_SPEED: f64 = 5.0;
/// Visibility used when the report carries none.
pub const DEFAULT_VISIBILITY: f64 = 10.0;
/// Altimeter setting used when the report carries none, in hPa.
pub const DEFAULT_PRESSURE: f64 = 1013.0;

const VARIABLE_WIND: &str = "VRB";

/// A bare reading value.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

/// A reading as AVWX sends it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Reading {
    Bare(Scalar),
    Wrapped { value: Option<Scalar> },
}

impl Reading {
    fn scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Bare(scalar) => Some(scalar),
            Self::Wrapped { value } => value.as_ref(),
        }
    }

    /// Numeric value of the reading, if it has one.
    ///
    /// Numeric strings are accepted; other text is not a number.
    #[must_use]
    pub fn number(&self) -> Option<f64> {
        let value = match self.scalar()? {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(t) => t.trim().parse::<f64>().ok(),
        };
        value.filter(|n| n.is_finite())
    }
}

/// Weather or cloud layer code entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodeEntry {
    pub code: String,
}

/// The `info` block of a report.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetarInfo {
    pub temperature: Option<Reading>,
    pub dewpoint: Option<Reading>,
    pub wind_speed: Option<Reading>,
    pub wind_direction: Option<Reading>,
    pub visibility: Option<Reading>,
    pub altimeter: Option<Reading>,
    pub weather: Vec<CodeEntry>,
    pub clouds: Vec<CodeEntry>,
}

/// METAR report as returned by AVWX.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetarReport {
    pub raw: Option<String>,
    pub info: Option<MetarInfo>,
}

/// Wind direction after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum WindDirection {
    /// True direction in degrees.
    Degrees(f64),
    /// Non-numeric direction such as `VRB`.
    Text(String),
}

/// A fully resolved observation. Every field has a value.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub station: String,
    pub raw: String,
    pub temperature: f64,
    pub dewpoint: f64,
    pub wind_speed: f64,
    pub wind_direction: WindDirection,
    pub visibility: f64,
    pub pressure: f64,
    pub weather_codes: Vec<String>,
    pub cloud_codes: Vec<String>,
}

fn reading_or(station: &str, field: &str, reading: Option<&Reading>, fallback: f64) -> f64 {
    reading.and_then(Reading::number).unwrap_or_else(|| {
        debug!("{station}: no {field} in report, using {fallback}");
        fallback
    })
}

impl MetarReport {
    /// Decode one AVWX response body.
    pub fn decode(payload: &str) -> Result<Self, FeedError> {
        serde_json::from_str(payload)
            .map_err(|e| FeedError::MalformedFeed(format!("METAR report: {e}")))
    }

    /// Resolve the report into an observation for `station`.
    #[must_use]
    pub fn observe(&self, station: &str) -> WeatherObservation {
        let empty = MetarInfo::default();
        let info = self.info.as_ref().unwrap_or(&empty);

        let temperature = reading_or(
            station,
            "temperature",
            info.temperature.as_ref(),
            DEFAULT_TEMPERATURE,
        );
        let dewpoint = reading_or(
            station,
            "dew point",
            info.dewpoint.as_ref(),
            temperature - DEWPOINT_OFFSET,
        );

        let wind_direction = match info.wind_direction.as_ref().and_then(Reading::scalar) {
            Some(Scalar::Number(deg)) => WindDirection::Degrees(*deg),
            Some(Scalar::Text(text)) if !text.trim().is_empty() => {
                text.trim().parse::<f64>().map_or_else(
                    |_| WindDirection::Text(text.trim().to_string()),
                    WindDirection::Degrees,
                )
            }
            _ => {
                debug!("{station}: no wind direction in report, using {VARIABLE_WIND}");
                WindDirection::Text(VARIABLE_WIND.to_string())
            }
        };

        WeatherObservation {
            station: station.to_string(),
            raw: self.raw.clone().unwrap_or_default(),
            temperature,
            dewpoint,
            wind_speed: reading_or(station, "wind speed", info.wind_speed.as_ref(), DEFAULT_WIND_SPEED),
            wind_direction,
            visibility: reading_or(station, "visibility", info.visibility.as_ref(), DEFAULT_VISIBILITY),
            pressure: reading_or(station, "altimeter", info.altimeter.as_ref(), DEFAULT_PRESSURE),
            weather_codes: info.weather.iter().map(|w| w.code.clone()).collect(),
            cloud_codes: info.clouds.iter().map(|c| c.code.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_shapes() {
        let bare: Reading = serde_json::from_str("21").unwrap();
        let wrapped: Reading = serde_json::from_str(r#"{"value": 18}"#).unwrap();
        let text: Reading = serde_json::from_str(r#""VRB""#).unwrap();
        let null_value: Reading = serde_json::from_str(r#"{"value": null}"#).unwrap();

        assert_eq!(bare.number(), Some(21.0));
        assert_eq!(wrapped.number(), Some(18.0));
        assert_eq!(text.number(), None);
        assert_eq!(null_value.number(), None);
    }

    #[test]
    fn test_observe_full_report() {
        let report = MetarReport::decode(
            r#"{
                "raw": "OJAI 281200Z 27012KT 9999 -RA OVC020 18/12 Q1009",
                "info": {
                    "temperature": {"value": 18},
                    "dewpoint": 12,
                    "wind_speed": {"value": 12},
                    "wind_direction": {"value": 270},
                    "visibility": {"value": 10},
                    "altimeter": 1009,
                    "weather": [{"code": "-RA"}],
                    "clouds": [{"code": "OVC"}]
                }
            }"#,
        )
        .unwrap();

        let obs = report.observe("OJAI");
        assert_eq!(obs.station, "OJAI");
        assert!((obs.temperature - 18.0).abs() < f64::EPSILON);
        assert!((obs.dewpoint - 12.0).abs() < f64::EPSILON);
        assert!((obs.wind_speed - 12.0).abs() < f64::EPSILON);
        assert_eq!(obs.wind_direction, WindDirection::Degrees(270.0));
        assert!((obs.pressure - 1009.0).abs() < f64::EPSILON);
        assert_eq!(obs.weather_codes, ["-RA"]);
        assert_eq!(obs.cloud_codes, ["OVC"]);
    }

    #[test]
    fn test_observe_empty_report_uses_defaults() {
        let obs = MetarReport::decode("{}").unwrap().observe("ORBI");
        assert!((obs.temperature - DEFAULT_TEMPERATURE).abs() < f64::EPSILON);
        assert!((obs.dewpoint - (DEFAULT_TEMPERATURE - DEWPOINT_OFFSET)).abs() < f64::EPSILON);
        assert!((obs.wind_speed - DEFAULT_WIND_SPEED).abs() < f64::EPSILON);
        assert_eq!(obs.wind_direction, WindDirection::Text("VRB".to_string()));
        assert!((obs.visibility - DEFAULT_VISIBILITY).abs() < f64::EPSILON);
        assert!((obs.pressure - DEFAULT_PRESSURE).abs() < f64::EPSILON);
        assert!(obs.raw.is_empty());
        assert!(obs.weather_codes.is_empty());
    }

    #[test]
    fn test_dewpoint_default_follows_temperature() {
        let obs = MetarReport::decode(r#"{"info": {"temperature": 31}}"#)
            .unwrap()
            .observe("OSDI");
        assert!((obs.dewpoint - 26.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_numeric_text_wind_direction() {
        let obs = MetarReport::decode(r#"{"info": {"wind_direction": {"value": "090"}}}"#)
            .unwrap()
            .observe("OJAI");
        assert_eq!(obs.wind_direction, WindDirection::Degrees(90.0));
    }

    #[test]
    fn test_non_json_is_malformed() {
        assert!(matches!(
            MetarReport::decode("Unauthorized"),
            Err(FeedError::MalformedFeed(_))
        ));
    }
}
