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

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use whazzup_feed::pipelines::{
    AirportWeather, ControllerBoard, LiveControllers, LiveTraffic, SectorTraffic,
};
use whazzup_feed::{
    ControllerRoster, FeedError, HttpFeed, MetarFeed, Phase, PollState, Poller, PollerConfig,
    RegionSummary, RegionTable, RosterEvent, WeatherReport,
};

use crate::board;
use crate::config::AppConfig;

/// The four board widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Sectors,
    Traffic,
    Controllers,
    Weather,
}

impl Widget {
    pub const ALL: [Widget; 4] = [Self::Sectors, Self::Traffic, Self::Controllers, Self::Weather];
}

fn poller_config(name: &str, interval_secs: u64) -> PollerConfig {
    PollerConfig {
        name: name.to_string(),
        interval: Duration::from_secs(interval_secs),
        ..Default::default()
    }
}

/// Wait until `poller` has finished one cycle, successful or not.
async fn first_cycle<O: Clone + Send + Sync + 'static>(poller: &Poller<O>) {
    let mut rx = poller.subscribe();
    if rx
        .wait_for(|s| s.cycles > 0 || s.phase == Phase::Stopped)
        .await
        .is_err()
    {
        debug!("{}: state channel closed before first cycle", poller.name());
    }
}

/// Print `render(state)` on every settled state change until cancelled.
fn spawn_watcher<O, F>(poller: &Poller<O>, cancel: CancellationToken, mut render: F) -> JoinHandle<()>
where
    O: Clone + Send + Sync + 'static,
    F: FnMut(&PollState<O>) -> String + Send + 'static,
{
    let mut rx = poller.subscribe();
    let name = poller.name().to_string();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        debug!("{name}: poller gone, watcher exiting");
                        break;
                    }
                    let state = rx.borrow_and_update().clone();
                    if matches!(state.phase, Phase::Fetching | Phase::Stopped) {
                        continue;
                    }
                    println!("{}\n{}\n", board::header(Utc::now()), render(&state));
                }
            }
        }
    })
}

/// Roster announcements for one controller update. Fallback data is not a
/// real roster, so it is never merged.
fn announce(roster: &mut ControllerRoster, state: &PollState<ControllerBoard>) -> Vec<String> {
    let Some(board) = state.data.as_ref().filter(|_| !state.from_fallback) else {
        return Vec::new();
    };

    let mut events = roster.subscribe();
    roster.merge(&board.controllers);

    let mut lines = Vec::new();
    loop {
        match events.try_recv() {
            Ok(RosterEvent::Online(callsign)) => lines.push(format!("+ {callsign} online")),
            Ok(RosterEvent::Offline(callsign)) => lines.push(format!("- {callsign} offline")),
            Ok(RosterEvent::Updated(callsign)) => lines.push(format!("~ {callsign} changed")),
            Err(TryRecvError::Lagged(n)) => debug!("roster: skipped {n} events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    lines
}

/// Owns one poller per selected widget and the tasks that render them.
pub struct WidgetManager {
    sectors: Option<Poller<Vec<RegionSummary>>>,
    traffic: Option<Poller<Vec<RegionSummary>>>,
    controllers: Option<Poller<ControllerBoard>>,
    weather: Option<Poller<Vec<WeatherReport>>>,

    /// Stops the render tasks; pollers stop on their own handles
    cancel_token: CancellationToken,
    watchers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for WidgetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetManager")
            .field("widgets", &self.active())
            .field("watchers", &self.watchers.len())
            .finish_non_exhaustive()
    }
}

impl WidgetManager {
    /// Spawn a poller for each widget in `widgets`. Must be called inside a runtime.
    pub fn start(
        config: &AppConfig,
        regions: &Arc<RegionTable>,
        widgets: &[Widget],
    ) -> Result<Self, FeedError> {
        let timeout = config.request_timeout();
        let mut manager = Self {
            sectors: None,
            traffic: None,
            controllers: None,
            weather: None,
            cancel_token: CancellationToken::new(),
            watchers: Vec::new(),
        };

        for widget in widgets {
            info!("Starting widget {widget:?}");
            match widget {
                Widget::Sectors => {
                    manager.sectors = Some(Poller::spawn(
                        poller_config("sectors", config.sector_interval_secs),
                        HttpFeed::legacy(&config.legacy_url, timeout)?,
                        SectorTraffic::new(Arc::clone(regions)),
                    ));
                }
                Widget::Traffic => {
                    manager.traffic = Some(Poller::spawn(
                        poller_config("traffic", config.traffic_interval_secs),
                        HttpFeed::tracker(&config.tracker_url, timeout)?,
                        LiveTraffic::new(Arc::clone(regions), config.display_cap),
                    ));
                }
                Widget::Controllers => {
                    manager.controllers = Some(Poller::spawn(
                        poller_config("controllers", config.controllers_interval_secs),
                        HttpFeed::tracker(&config.tracker_url, timeout)?,
                        LiveControllers::new(Arc::clone(regions)),
                    ));
                }
                Widget::Weather => {
                    if let Some(source) = config.avwx_token_source() {
                        info!("Using AVWX token from {source}");
                    }
                    manager.weather = Some(Poller::spawn(
                        poller_config("weather", config.weather_interval_secs),
                        MetarFeed::new(
                            &config.avwx_url,
                            config.weather_stations.clone(),
                            config.resolve_avwx_token(),
                            timeout,
                        )?,
                        AirportWeather::new(config.weather_stations.clone()),
                    ));
                }
            }
        }

        Ok(manager)
    }

    /// Widgets with a running poller
    pub fn active(&self) -> Vec<Widget> {
        let running = [
            self.sectors.is_some(),
            self.traffic.is_some(),
            self.controllers.is_some(),
            self.weather.is_some(),
        ];
        Widget::ALL
            .into_iter()
            .zip(running)
            .filter_map(|(widget, on)| on.then_some(widget))
            .collect()
    }

    /// Print every widget whenever its state settles
    pub fn start_watchers(&mut self) {
        let cancel = &self.cancel_token;
        if let Some(poller) = &self.sectors {
            self.watchers
                .push(spawn_watcher(poller, cancel.clone(), board::render_sectors));
        }
        if let Some(poller) = &self.traffic {
            self.watchers
                .push(spawn_watcher(poller, cancel.clone(), board::render_traffic));
        }
        if let Some(poller) = &self.controllers {
            let mut roster = ControllerRoster::new();
            let mut last_cycle = 0;
            self.watchers.push(spawn_watcher(poller, cancel.clone(), move |state| {
                let mut text = board::render_controllers(state);
                if state.cycles != last_cycle {
                    last_cycle = state.cycles;
                    for line in announce(&mut roster, state) {
                        text.push_str("\n  ");
                        text.push_str(&line);
                    }
                }
                text
            }));
        }
        if let Some(poller) = &self.weather {
            self.watchers
                .push(spawn_watcher(poller, cancel.clone(), board::render_weather));
        }
    }

    /// Current state of every widget as one block of text
    pub fn render_all(&self) -> String {
        let mut blocks = vec![board::header(Utc::now())];
        if let Some(poller) = &self.sectors {
            blocks.push(board::render_sectors(&poller.state()));
        }
        if let Some(poller) = &self.traffic {
            blocks.push(board::render_traffic(&poller.state()));
        }
        if let Some(poller) = &self.controllers {
            blocks.push(board::render_controllers(&poller.state()));
        }
        if let Some(poller) = &self.weather {
            blocks.push(board::render_weather(&poller.state()));
        }
        blocks.join("\n\n")
    }

    /// Resolve once every poller has completed its first cycle
    pub async fn wait_first_cycle(&self) {
        if let Some(poller) = &self.sectors {
            first_cycle(poller).await;
        }
        if let Some(poller) = &self.traffic {
            first_cycle(poller).await;
        }
        if let Some(poller) = &self.controllers {
            first_cycle(poller).await;
        }
        if let Some(poller) = &self.weather {
            first_cycle(poller).await;
        }
    }

    pub fn refresh_all(&self) {
        info!("Refreshing all widgets");
        self.for_each(Poller::refresh, Poller::refresh, Poller::refresh);
    }

    pub fn dismiss_all(&self) {
        debug!("Dismissing error banners");
        self.for_each(Poller::dismiss_error, Poller::dismiss_error, Poller::dismiss_error);
    }

    pub fn stop_all(&self) {
        self.for_each(Poller::stop, Poller::stop, Poller::stop);
        self.cancel_token.cancel();
    }

    /// Apply one operation to every poller; the output types differ per widget.
    fn for_each(
        &self,
        regions: fn(&Poller<Vec<RegionSummary>>),
        controllers: fn(&Poller<ControllerBoard>),
        weather: fn(&Poller<Vec<WeatherReport>>),
    ) {
        self.sectors.iter().chain(&self.traffic).for_each(regions);
        self.controllers.iter().for_each(controllers);
        self.weather.iter().for_each(weather);
    }
}

impl Drop for WidgetManager {
    fn drop(&mut self) {
        info!("Shutting down WidgetManager - stopping all widgets");
        self.stop_all();
    }
}
