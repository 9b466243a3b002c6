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

//! The four board pipelines.
//!
//! Each one is a [`Transform`] that the generic poller drives:
//!
//! | Pipeline          | Feed          | Regions               | Mode            |
//! |-------------------|---------------|-----------------------|-----------------|
//! | [`SectorTraffic`] | legacy text   | `sector_boxes`        | counts          |
//! | [`LiveTraffic`]   | tracker JSON  | `traffic_firs`        | list, capped    |
//! | [`LiveControllers`] | tracker JSON | `controller_stations` | list, uncapped |
//! | [`AirportWeather`] | AVWX METAR   | n/a                   | per station     |

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{error, warn};

use crate::aggregate::{aggregate, AggregateMode, RegionSummary};
use crate::classify::WeatherReport;
use crate::entity::{normalize_all, EntityKind, NormalizedEntity};
use crate::filter::retain_relevant;
use crate::mock;
use crate::poller::Transform;
use crate::protocol::{
    FeedError, FeedParser, LegacyTextParser, MetarReport, RawFeedRecord, TrackerJsonParser,
};
use crate::region::RegionTable;
use crate::source::StationPayload;

/// Legacy sector counts refresh interval.
pub const SECTOR_TRAFFIC_INTERVAL: Duration = Duration::from_secs(60);
/// Live traffic list refresh interval.
pub const LIVE_TRAFFIC_INTERVAL: Duration = Duration::from_secs(30);
/// Live controller list refresh interval.
pub const LIVE_CONTROLLERS_INTERVAL: Duration = Duration::from_secs(30);
/// METAR refresh interval.
pub const AIRPORT_WEATHER_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Stations shown by the weather widget unless configured otherwise.
pub const DEFAULT_WEATHER_STATIONS: [&str; 3] = ["OJAI", "OSDI", "ORBI"];

/// Run the built-in payload through `apply`. A broken mock yields `empty`.
fn fallback_from<O>(
    name: &str,
    result: Result<O, FeedError>,
    empty: impl FnOnce() -> O,
) -> O {
    result.unwrap_or_else(|e| {
        error!("{name}: built-in data failed to load: {e}");
        empty()
    })
}

fn tracker_entities(payload: &str, kind: EntityKind) -> Result<Vec<NormalizedEntity>, FeedError> {
    let records = TrackerJsonParser::new().parse(payload)?;
    let mut entities = normalize_all(&records);
    entities.retain(|e| e.kind == kind);
    Ok(entities)
}

/// Inbound / outbound / online / controller counts per sector box.
#[derive(Debug, Clone)]
pub struct SectorTraffic {
    regions: Arc<RegionTable>,
}

impl SectorTraffic {
    #[must_use]
    pub fn new(regions: Arc<RegionTable>) -> Self {
        Self { regions }
    }
}

impl Transform for SectorTraffic {
    type Payload = String;
    type Output = Vec<RegionSummary>;

    fn apply(&self, payload: String) -> Result<Vec<RegionSummary>, FeedError> {
        let records: Vec<_> = LegacyTextParser::new()
            .parse(&payload)?
            .into_iter()
            .map(RawFeedRecord::Legacy)
            .collect();
        let entities = normalize_all(&records);
        Ok(aggregate(&entities, &self.regions.sector_boxes, AggregateMode::Counts))
    }

    fn fallback(&self) -> Vec<RegionSummary> {
        fallback_from("sectors", self.apply(mock::WHAZZUP_TEXT.to_string()), || {
            aggregate(&[], &self.regions.sector_boxes, AggregateMode::Counts)
        })
    }
}

/// Flights departing or arriving in each FIR, sorted and capped.
#[derive(Debug, Clone)]
pub struct LiveTraffic {
    regions: Arc<RegionTable>,
    cap: usize,
}

impl LiveTraffic {
    #[must_use]
    pub fn new(regions: Arc<RegionTable>, cap: usize) -> Self {
        Self { regions, cap }
    }
}

impl Transform for LiveTraffic {
    type Payload = String;
    type Output = Vec<RegionSummary>;

    fn apply(&self, payload: String) -> Result<Vec<RegionSummary>, FeedError> {
        let flights = tracker_entities(&payload, EntityKind::Aircraft)?;
        Ok(aggregate(
            &flights,
            &self.regions.traffic_firs,
            AggregateMode::List { cap: self.cap },
        ))
    }

    fn fallback(&self) -> Vec<RegionSummary> {
        fallback_from("traffic", self.apply(mock::TRACKER_JSON.to_string()), || {
            aggregate(&[], &self.regions.traffic_firs, AggregateMode::Counts)
        })
    }
}

/// Output of [`LiveControllers`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerBoard {
    /// One summary per station, all listed controllers included.
    pub stations: Vec<RegionSummary>,
    /// Every relevant controller once, sorted by callsign.
    pub controllers: Vec<NormalizedEntity>,
}

/// Operational controllers per station.
#[derive(Debug, Clone)]
pub struct LiveControllers {
    regions: Arc<RegionTable>,
}

impl LiveControllers {
    #[must_use]
    pub fn new(regions: Arc<RegionTable>) -> Self {
        Self { regions }
    }
}

impl Transform for LiveControllers {
    type Payload = String;
    type Output = ControllerBoard;

    fn apply(&self, payload: String) -> Result<ControllerBoard, FeedError> {
        let stations = &self.regions.controller_stations;
        let controllers = tracker_entities(&payload, EntityKind::Controller)?;

        let mut relevant = retain_relevant(controllers, stations);
        relevant.sort_by(|a, b| a.callsign.cmp(&b.callsign).then(a.id.cmp(&b.id)));

        Ok(ControllerBoard {
            stations: aggregate(&relevant, stations, AggregateMode::List { cap: usize::MAX }),
            controllers: relevant,
        })
    }

    fn fallback(&self) -> ControllerBoard {
        fallback_from("controllers", self.apply(mock::TRACKER_JSON.to_string()), || {
            ControllerBoard {
                stations: aggregate(&[], &self.regions.controller_stations, AggregateMode::Counts),
                controllers: Vec::new(),
            }
        })
    }
}

/// Current conditions per station.
///
/// Remembers the last live report of every station so a station that fails
/// on a later cycle keeps showing real data.
#[derive(Debug)]
pub struct AirportWeather {
    stations: Vec<String>,
    last_good: Mutex<HashMap<String, WeatherReport>>,
}

impl AirportWeather {
    #[must_use]
    pub fn new(stations: Vec<String>) -> Self {
        Self {
            stations,
            last_good: Mutex::new(HashMap::new()),
        }
    }

    fn mock_report(station: &str) -> Result<WeatherReport, FeedError> {
        let report = MetarReport::decode(mock::metar_json(station))?;
        Ok(WeatherReport::from_observation(&report.observe(station)))
    }

    fn decode(station: &str, body: Result<String, FeedError>) -> Result<WeatherReport, FeedError> {
        let report = MetarReport::decode(&body?)?;
        Ok(WeatherReport::from_observation(&report.observe(station)))
    }
}

impl Transform for AirportWeather {
    type Payload = Vec<StationPayload>;
    type Output = Vec<WeatherReport>;

    fn apply(&self, payload: Vec<StationPayload>) -> Result<Vec<WeatherReport>, FeedError> {
        self.apply_partial(payload).map(|(reports, _)| reports)
    }

    /// A failed station shows its previous live report, or its built-in one
    /// if it never had one. The first station error is reported alongside
    /// the reports. The cycle only fails when every station failed.
    fn apply_partial(
        &self,
        payload: Vec<StationPayload>,
    ) -> Result<(Vec<WeatherReport>, Option<FeedError>), FeedError> {
        let mut last_good = self.last_good.lock().unwrap_or_else(PoisonError::into_inner);
        let mut reports = Vec::with_capacity(payload.len());
        let mut first_error = None;
        let mut any_live = false;

        for StationPayload { station, body } in payload {
            match Self::decode(&station, body) {
                Ok(report) => {
                    any_live = true;
                    last_good.insert(station, report.clone());
                    reports.push(report);
                }
                Err(e) => {
                    let report = match last_good.get(&station) {
                        Some(previous) => {
                            warn!("{station}: {e}, keeping previous report");
                            previous.clone()
                        }
                        None => {
                            warn!("{station}: {e}, using built-in report");
                            Self::mock_report(&station)?
                        }
                    };
                    reports.push(report);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if !any_live => Err(e),
            partial => Ok((reports, partial)),
        }
    }

    fn fallback(&self) -> Vec<WeatherReport> {
        self.stations
            .iter()
            .filter_map(|station| match Self::mock_report(station) {
                Ok(report) => Some(report),
                Err(e) => {
                    error!("{station}: built-in report failed to load: {e}");
                    None
                }
            })
            .collect()
    }
}
