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

//! Terminal rendering of widget state.
//!
//! Every renderer takes a [`PollState`] snapshot and returns plain text, so
//! nothing here touches the pollers or the terminal directly.

use chrono::{DateTime, Utc};
use whazzup_feed::pipelines::ControllerBoard;
use whazzup_feed::{PollState, RegionSummary, WeatherReport};

const NOT_AVAILABLE: &str = "N/A";

const RATINGS: [&str; 7] = [
    "Observer",
    "ATC Applicant",
    "ATC Trainee",
    "ATC Advanced",
    "ATC Instructor",
    "ATC Senior Instructor",
    "ATC Supervisor",
];

/// `850ft` below 1000 ft, flight level above.
pub fn format_altitude(altitude: i32) -> String {
    if altitude < 1000 {
        format!("{altitude}ft")
    } else {
        format!("FL{}", altitude / 100)
    }
}

pub fn format_speed(knots: i32) -> String {
    format!("{knots}kts")
}

/// Zero means the controller has not tuned a frequency.
pub fn format_frequency(mhz: f64) -> String {
    if mhz.abs() < f64::EPSILON {
        NOT_AVAILABLE.to_string()
    } else {
        format!("{mhz:.3} MHz")
    }
}

pub fn format_session(secs: u64) -> String {
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

pub fn rating_name(rating: u8) -> &'static str {
    RATINGS.get(usize::from(rating)).copied().unwrap_or("Unknown")
}

fn endpoint(airport: Option<&str>) -> &str {
    airport.unwrap_or(NOT_AVAILABLE)
}

pub fn last_updated_line(last_updated: Option<DateTime<Utc>>) -> String {
    match last_updated {
        Some(at) => format!("Last updated: {}", at.format("%H:%M:%SZ")),
        None => "Never updated".to_string(),
    }
}

pub fn header(now: DateTime<Utc>) -> String {
    format!("=== FIR BOARD  {} ===", now.format("%Y-%m-%d %H:%MZ"))
}

/// Error banner with the operator hint, or nothing when there is no error.
pub fn banner<O>(state: &PollState<O>) -> Option<String> {
    let error = state.last_error.as_ref()?;
    let mut line = format!("!! {error}  [r] retry  [d] dismiss");
    if state.from_fallback {
        line.push_str("  (showing built-in data)");
    }
    Some(line)
}

fn frame<O>(title: &str, state: &PollState<O>, body: Vec<String>) -> String {
    let mut lines = vec![format!("--- {title} ---")];
    lines.extend(banner(state));
    if state.data.is_none() {
        lines.push("  loading...".to_string());
    }
    lines.extend(body);
    lines.push(format!("  {}", last_updated_line(state.last_updated)));
    lines.join("\n")
}

pub fn render_sectors(state: &PollState<Vec<RegionSummary>>) -> String {
    let body = state
        .data
        .iter()
        .flatten()
        .map(|sector| {
            let counts = &sector.counts;
            let roles = if counts.by_role.is_empty() {
                "no ATC".to_string()
            } else {
                counts
                    .by_role
                    .iter()
                    .map(|(role, n)| format!("{role} {n}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "  {:<18} IN {:>3}  OUT {:>3}  ONLINE {:>3}  {roles}",
                sector.label, counts.inbound, counts.outbound, counts.online
            )
        })
        .collect();
    frame("Sector traffic", state, body)
}

pub fn render_traffic(state: &PollState<Vec<RegionSummary>>) -> String {
    let mut body = Vec::new();
    for fir in state.data.iter().flatten() {
        body.push(format!("  {} ({})", fir.label, fir.key));
        if fir.entities.is_empty() {
            body.push("    no traffic".to_string());
        }
        for listed in &fir.entities {
            let flight = &listed.entity;
            let motion = flight.motion.unwrap_or_default();
            body.push(format!(
                "    {:<9} {:>4} -> {:<4} {:>7} {:>7}  {:<8} {}",
                flight.callsign,
                endpoint(flight.origin.as_deref()),
                endpoint(flight.destination.as_deref()),
                format_altitude(motion.altitude),
                format_speed(motion.ground_speed),
                listed.direction.map_or("", |d| d.label()),
                flight.aircraft_model,
            ));
        }
    }
    frame("Live traffic", state, body)
}

pub fn render_controllers(state: &PollState<ControllerBoard>) -> String {
    let mut body = Vec::new();
    if let Some(board) = &state.data {
        if board.controllers.is_empty() {
            body.push("  no controllers online".to_string());
        }
        for controller in &board.controllers {
            body.push(format!(
                "  {:<12} {:>12}  {:<5} {:<22} {}",
                controller.callsign,
                format_frequency(controller.frequency),
                controller.role.map_or("", |r| r.code()),
                rating_name(controller.rating),
                format_session(controller.session_secs),
            ));
        }
        let staffed = board.stations.iter().filter(|s| !s.is_empty()).count();
        body.push(format!("  staffed: {staffed}/{} stations", board.stations.len()));
    }
    frame("Live controllers", state, body)
}

pub fn render_weather(state: &PollState<Vec<WeatherReport>>) -> String {
    let mut body = Vec::new();
    for report in state.data.iter().flatten() {
        body.push(format!(
            "  {}  {:<14} {:>3}C/{:>3}C  RH {:>3}%  {} {}kt  vis {}  Q{}  {}",
            report.station,
            report.condition.label(),
            report.temperature,
            report.dewpoint,
            report.humidity,
            report.wind_direction,
            report.wind_speed,
            report.visibility,
            report.pressure,
            report.clouds,
        ));
        body.push(format!("        {}", report.metar_excerpt));
    }
    frame("Airport weather", state, body)
}
