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

//! Legacy whazzup text parser.
//!
//! The text file is line oriented. A `!CLIENTS:` marker line opens the
//! client section and the first blank line closes it. Every client line is
//! colon delimited:
//!
//! ```text
//! <callsign>:<type>:<..>:<..>:<..>:<lat>:<lon>:<alt>:<gs>:<hdg>:<on_ground>:<squawk>
//! ```

use log::debug;

use super::{FeedError, FeedParser};

/// Marker line that opens the client section.
pub const CLIENTS_MARKER: &str = "!CLIENTS:";

/// Client lines with fewer fields than this are skipped.
pub const MIN_LEGACY_FIELDS: usize = 10;

/// Parser for the legacy whazzup text file.
#[derive(Debug, Default)]
pub struct LegacyTextParser;

impl LegacyTextParser {
    /// Create a new legacy text parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// One client line from the legacy text file.
///
/// Numeric fields that fail to parse are zero; missing trailing fields are
/// `false` / empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyClient {
    pub callsign: String,
    /// Client type column, upper-cased (`PILOT`, `ATC`, ...).
    pub client_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: i32,
    pub ground_speed: i32,
    pub heading: i32,
    pub on_ground: bool,
    pub squawk: String,
    /// The line as received, kept for display.
    pub line: String,
}

impl LegacyClient {
    #[must_use]
    pub fn is_pilot(&self) -> bool {
        self.client_type == "PILOT"
    }

    #[must_use]
    pub fn is_atc(&self) -> bool {
        self.client_type == "ATC"
    }
}

impl FeedParser for LegacyTextParser {
    type Record = LegacyClient;

    fn parse(&mut self, payload: &str) -> Result<Vec<LegacyClient>, FeedError> {
        parse_clients_section(payload)
    }
}

/// Leading `[+-]digits[.digits]` of a field; trailing text such as a unit
/// suffix is ignored.
fn numeric_prefix(field: &str) -> &str {
    let field = field.trim();
    let bytes = field.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    end += digits(end);
    if bytes.get(end) == Some(&b'.') {
        end += 1 + digits(end + 1);
    }
    &field[..end]
}

/// Parse a float field from its numeric prefix, zero when there is none.
fn parse_float_field(field: &str) -> f64 {
    numeric_prefix(field)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse an integer field from its numeric prefix. Fractional values are
/// truncated; a field without a numeric prefix is zero.
#[allow(clippy::cast_possible_truncation, reason = "value is clamped to the i32 range first")]
fn parse_int_field(field: &str) -> i32 {
    let number = numeric_prefix(field);
    number.parse::<i32>().unwrap_or_else(|_| {
        number
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map_or(0, |v| v.trunc().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
    })
}

fn parse_client_line(line: &str) -> Option<LegacyClient> {
    let parts: Vec<&str> = line.split(':').collect();

    if parts.len() < MIN_LEGACY_FIELDS {
        return None;
    }

    Some(LegacyClient {
        callsign: parts[0].trim().to_string(),
        client_type: parts[1].trim().to_ascii_uppercase(),
        latitude: parse_float_field(parts[5]),
        longitude: parse_float_field(parts[6]),
        altitude: parse_int_field(parts[7]),
        ground_speed: parse_int_field(parts[8]),
        heading: parse_int_field(parts[9]),
        on_ground: parts.get(10).is_some_and(|f| f.trim() == "1"),
        squawk: parts.get(11).map(|f| f.trim().to_string()).unwrap_or_default(),
        line: line.to_string(),
    })
}

fn parse_clients_section(payload: &str) -> Result<Vec<LegacyClient>, FeedError> {
    let mut lines = payload.lines().map(|l| l.trim_end_matches('\r'));

    if !lines.by_ref().any(|l| l.starts_with(CLIENTS_MARKER)) {
        return Err(FeedError::MalformedFeed(format!(
            "no {CLIENTS_MARKER} section in whazzup text"
        )));
    }

    let mut clients = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        match parse_client_line(line) {
            Some(client) => clients.push(client),
            None => debug!("Skipping short whazzup line: {line}"),
        }
    }

    Ok(clients)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PILOT_LINE: &str = "RJA123:PILOT:1:2:3:31.72:35.99:12000:280:90:0:2000";

    #[test]
    fn test_parse_pilot_line() {
        let payload = format!("!GENERAL:\nVERSION = 1\n\n{CLIENTS_MARKER}\n{PILOT_LINE}\n\n");
        let clients = LegacyTextParser::new().parse(&payload).unwrap();
        assert_eq!(clients.len(), 1);
        let client = &clients[0];
        assert_eq!(client.callsign, "RJA123");
        assert!(client.is_pilot());
        assert!((client.latitude - 31.72).abs() < 1e-9);
        assert!((client.longitude - 35.99).abs() < 1e-9);
        assert_eq!(client.altitude, 12000);
        assert_eq!(client.ground_speed, 280);
        assert_eq!(client.heading, 90);
        assert!(!client.on_ground);
        assert_eq!(client.squawk, "2000");
        assert_eq!(client.line, PILOT_LINE);
    }

    #[test]
    fn test_missing_marker_is_malformed() {
        let result = LegacyTextParser::new().parse("!GENERAL:\nVERSION = 1\n");
        assert!(matches!(result, Err(FeedError::MalformedFeed(_))));
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let payload = format!(
            "{CLIENTS_MARKER}\nSHORT:PILOT:1\n{PILOT_LINE}\nALSO:ATC:short\nOJAI_TWR:ATC:::::31.7:35.9:0:0\n"
        );
        let clients = LegacyTextParser::new().parse(&payload).unwrap();
        let callsigns: Vec<_> = clients.iter().map(|c| c.callsign.as_str()).collect();
        assert_eq!(callsigns, ["RJA123", "OJAI_TWR"]);
    }

    #[test]
    fn test_section_ends_at_blank_line() {
        let payload = format!("{CLIENTS_MARKER}\n{PILOT_LINE}\n   \nAFTER:PILOT:1:2:3:4:5:6:7:8\n");
        let clients = LegacyTextParser::new().parse(&payload).unwrap();
        assert_eq!(clients.len(), 1);
    }

    #[test]
    fn test_non_numeric_fields_default_to_zero() {
        let payload = format!("{CLIENTS_MARKER}\nXXX:PILOT:a:b:c:north:east:high:fast:9.7\n");
        let clients = LegacyTextParser::new().parse(&payload).unwrap();
        let client = &clients[0];
        assert!(client.latitude.abs() < f64::EPSILON);
        assert!(client.longitude.abs() < f64::EPSILON);
        assert_eq!(client.altitude, 0);
        assert_eq!(client.ground_speed, 0);
        assert_eq!(client.heading, 9);
        assert!(!client.on_ground);
        assert!(client.squawk.is_empty());
    }

    #[test]
    fn test_on_ground_flag_and_crlf() {
        let payload = format!("{CLIENTS_MARKER}\r\nGND1:PILOT:1:2:3:31.7:35.9:2500:0:180:1:7000\r\n\r\n");
        let clients = LegacyTextParser::new().parse(&payload).unwrap();
        assert_eq!(clients.len(), 1);
        assert!(clients[0].on_ground);
        assert_eq!(clients[0].squawk, "7000");
    }

    #[test]
    fn test_empty_section() {
        let clients = LegacyTextParser::new().parse(CLIENTS_MARKER).unwrap();
        assert!(clients.is_empty());
    }

    #[test]
    fn test_parse_int_field_values() {
        assert_eq!(parse_int_field("35000"), 35000);
        assert_eq!(parse_int_field(" 35000.9 "), 35000);
        assert_eq!(parse_int_field(""), 0);
        assert_eq!(parse_int_field("FL350"), 0);
        assert_eq!(parse_int_field("12000A"), 12000);
        assert_eq!(parse_int_field("-40ft"), -40);
    }

    #[test]
    fn test_parse_float_field_reads_leading_number() {
        assert!((parse_float_field("31.7N") - 31.7).abs() < 1e-9);
        assert!((parse_float_field(" -35.25 ") + 35.25).abs() < 1e-9);
        assert!((parse_float_field("118.") - 118.0).abs() < 1e-9);
        assert!(parse_float_field("N31.7").abs() < f64::EPSILON);
        assert!(parse_float_field("-").abs() < f64::EPSILON);
    }

    #[test]
    fn test_unit_suffixes_do_not_zero_the_record() {
        let feed = format!("{CLIENTS_MARKER}\nRJA9:PILOT:9:IVAO:0:31.7N:35.9E:12000A:250kt:90:0:2000\n");
        let clients = LegacyTextParser::new().parse(&feed).unwrap();
        assert_eq!(clients[0].altitude, 12000);
        assert_eq!(clients[0].ground_speed, 250);
        assert!((clients[0].latitude - 31.7).abs() < 1e-9);
        assert!((clients[0].longitude - 35.9).abs() < 1e-9);
    }
}
