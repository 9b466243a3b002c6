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

//! Generic polling pipeline.
//!
//! A [`Poller`] owns one background task that fetches a payload from a
//! [`FeedSource`], runs it through a [`Transform`] and publishes the result as
//! a [`PollState`] on a watch channel. Cycles are strictly sequential: timer
//! ticks that fall inside a running cycle are skipped and refresh requests
//! received during a fetch are folded into it.
//!
//! Failure policy:
//! - first cycle fails: publish the transform's fallback so there is always
//!   something to show;
//! - later cycle fails: keep the last good data and surface the error.
//!
//! Stopping the poller (or dropping the handle) drops any in-flight fetch;
//! its result is never applied.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::protocol::FeedError;

/// Lifecycle phase of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Spawned, first cycle not started.
    Idle,
    Fetching,
    Succeeded,
    Failed,
    /// Terminal. No further transitions.
    Stopped,
}

/// Everything the presentation side needs to render one widget.
#[derive(Debug, Clone)]
pub struct PollState<O> {
    pub phase: Phase,
    /// Last good output, or the fallback after a failed first cycle.
    pub data: Option<O>,
    /// Time of the last successful cycle. None until one succeeds.
    pub last_updated: Option<DateTime<Utc>>,
    /// Error of the last failed or partly failed cycle, until dismissed or a
    /// clean cycle replaces it.
    pub last_error: Option<FeedError>,
    /// Whether `data` is the built-in fallback rather than live data.
    pub from_fallback: bool,
    /// Completed cycles, successful or not.
    pub cycles: u64,
}

impl<O> PollState<O> {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            data: None,
            last_updated: None,
            last_error: None,
            from_fallback: false,
            cycles: 0,
        }
    }
}

/// Commands accepted by a running poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a cycle now.
    Refresh,
    /// Clear the error banner.
    DismissError,
}

/// Configuration for one poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Name used in log lines.
    pub name: String,
    /// Time between cycles.
    pub interval: Duration,
    /// Command channel capacity.
    pub command_buffer: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            name: "feed".to_string(),
            interval: Duration::from_secs(30),
            command_buffer: 16,
        }
    }
}

/// Where a pipeline's payload comes from.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    type Payload: Send + 'static;

    async fn fetch(&self) -> Result<Self::Payload, FeedError>;
}

/// Turns a payload into the widget's output.
pub trait Transform: Send + Sync + 'static {
    type Payload;
    type Output: Clone + Send + Sync + 'static;

    fn apply(&self, payload: Self::Payload) -> Result<Self::Output, FeedError>;

    /// Like [`apply`](Self::apply), but may succeed while still reporting an
    /// error for part of the payload. The poller publishes the output and
    /// keeps the error on the banner.
    fn apply_partial(
        &self,
        payload: Self::Payload,
    ) -> Result<(Self::Output, Option<FeedError>), FeedError> {
        self.apply(payload).map(|output| (output, None))
    }

    /// Output shown when the very first cycle fails. Must be deterministic.
    fn fallback(&self) -> Self::Output;
}

/// Handle to a running poller.
///
/// Dropping the handle stops the poller.
pub struct Poller<O> {
    name: String,
    state_rx: watch::Receiver<PollState<O>>,
    command_tx: mpsc::Sender<Command>,
    cancel_token: CancellationToken,
}

impl<O> std::fmt::Debug for Poller<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("name", &self.name)
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl<O: Clone + Send + Sync + 'static> Poller<O> {
    /// Spawn the poller task. The first cycle starts immediately.
    #[must_use]
    pub fn spawn<S, T>(config: PollerConfig, source: S, transform: T) -> Self
    where
        S: FeedSource,
        T: Transform<Payload = S::Payload, Output = O>,
    {
        let (state_tx, state_rx) = watch::channel(PollState::new());
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let cancel_token = CancellationToken::new();
        let name = config.name.clone();

        let task = PollTask {
            config,
            source,
            transform,
            state_tx,
            command_rx,
            cancel_token: cancel_token.clone(),
        };
        tokio::spawn(task.run());

        Self {
            name,
            state_rx,
            command_tx,
            cancel_token,
        }
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState<O>> {
        self.state_rx.clone()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> PollState<O> {
        self.state_rx.borrow().clone()
    }

    /// Request an immediate cycle.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Clear the current error banner.
    pub fn dismiss_error(&self) {
        self.send(Command::DismissError);
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.command_tx.try_send(command) {
            debug!("{}: dropping {command:?}: {e}", self.name);
        }
    }

    /// Stop the poller. Idempotent.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<O> Drop for Poller<O> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

struct PollTask<S, T: Transform> {
    config: PollerConfig,
    source: S,
    transform: T,
    state_tx: watch::Sender<PollState<T::Output>>,
    command_rx: mpsc::Receiver<Command>,
    cancel_token: CancellationToken,
}

enum Trigger {
    Tick,
    Refresh,
    Stop,
}

impl<S, T> PollTask<S, T>
where
    S: FeedSource,
    T: Transform<Payload = S::Payload>,
{
    async fn run(mut self) {
        let name = self.config.name.clone();
        info!("{name}: polling every {}s", self.config.interval.as_secs());

        // interval() panics on a zero period
        let mut ticker = interval(self.config.interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let trigger = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => Trigger::Stop,
                command = self.command_rx.recv() => match command {
                    Some(Command::Refresh) => Trigger::Refresh,
                    Some(Command::DismissError) => {
                        self.dismiss_error();
                        continue;
                    }
                    None => Trigger::Stop,
                },
                _ = ticker.tick() => Trigger::Tick,
            };

            match trigger {
                Trigger::Stop => break,
                Trigger::Refresh => {
                    debug!("{name}: manual refresh");
                    ticker.reset();
                }
                Trigger::Tick => {}
            }

            if !self.cycle().await {
                break;
            }
        }

        self.state_tx.send_modify(|s| s.phase = Phase::Stopped);
        info!("{name}: stopped");
    }

    /// Run one fetch-transform cycle. Returns false when stopped mid-cycle.
    async fn cycle(&mut self) -> bool {
        let name = &self.config.name;
        self.state_tx.send_modify(|s| s.phase = Phase::Fetching);

        let mut fetch = self.source.fetch();
        let fetched = loop {
            tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    info!("{name}: stopping with a fetch in flight, discarding it");
                    return false;
                }
                result = &mut fetch => break result,
                Some(command) = self.command_rx.recv() => match command {
                    Command::Refresh => debug!("{name}: refresh during fetch, coalesced"),
                    Command::DismissError => {
                        self.state_tx.send_modify(|s| s.last_error = None);
                    }
                },
            }
        };

        match fetched.and_then(|payload| self.transform.apply_partial(payload)) {
            Ok((output, partial)) => {
                match &partial {
                    Some(error) => warn!("{name}: cycle succeeded in part ({error})"),
                    None => debug!("{name}: cycle succeeded"),
                }
                self.state_tx.send_modify(|s| {
                    s.phase = Phase::Succeeded;
                    s.data = Some(output);
                    s.last_updated = Some(Utc::now());
                    s.last_error = partial;
                    s.from_fallback = false;
                    s.cycles += 1;
                });
            }
            Err(error) => {
                let transform = &self.transform;
                self.state_tx.send_modify(|s| {
                    if s.data.is_none() {
                        warn!("{name}: first cycle failed ({error}), showing built-in data");
                        s.data = Some(transform.fallback());
                        s.from_fallback = true;
                    } else {
                        warn!("{name}: cycle failed ({error}), keeping last data");
                    }
                    s.phase = Phase::Failed;
                    s.last_error = Some(error);
                    s.cycles += 1;
                });
            }
        }

        true
    }

    fn dismiss_error(&self) {
        self.state_tx.send_modify(|s| s.last_error = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::time::{sleep, Instant};

    #[derive(Default)]
    struct Counters {
        started: AtomicUsize,
        completed: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    struct ScriptedSource {
        script: Mutex<VecDeque<Result<String, FeedError>>>,
        delay: Duration,
        counters: Arc<Counters>,
    }

    impl ScriptedSource {
        fn new(
            delay: Duration,
            script: Vec<Result<String, FeedError>>,
        ) -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            let source = Self {
                script: Mutex::new(script.into()),
                delay,
                counters: Arc::clone(&counters),
            };
            (source, counters)
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedSource {
        type Payload = String;

        async fn fetch(&self) -> Result<String, FeedError> {
            self.counters.started.fetch_add(1, Ordering::SeqCst);
            let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

            sleep(self.delay).await;

            self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.counters.completed.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("live".to_string()))
        }
    }

    struct Echo;

    impl Transform for Echo {
        type Payload = String;
        type Output = String;

        fn apply(&self, payload: String) -> Result<String, FeedError> {
            if payload == "garbage" {
                Err(FeedError::MalformedFeed("garbage".to_string()))
            } else {
                Ok(payload)
            }
        }

        fn fallback(&self) -> String {
            "mock".to_string()
        }
    }

    fn config(secs: u64) -> PollerConfig {
        PollerConfig {
            name: "test".to_string(),
            interval: Duration::from_secs(secs),
            ..Default::default()
        }
    }

    fn network_down() -> Result<String, FeedError> {
        Err(FeedError::NetworkFailure("connection refused".to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_publishes_data() {
        let (source, _) = ScriptedSource::new(Duration::from_secs(1), vec![]);
        let poller = Poller::spawn(config(30), source, Echo);
        let mut rx = poller.subscribe();

        let state = rx.wait_for(|s| s.cycles == 1).await.unwrap().clone();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.data.as_deref(), Some("live"));
        assert!(state.last_updated.is_some());
        assert!(!state.from_fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_failure_shows_fallback_and_refresh_failure_keeps_it() {
        let (source, _) = ScriptedSource::new(
            Duration::from_secs(1),
            vec![network_down(), Err(FeedError::NetworkFailure("timeout".to_string()))],
        );
        let poller = Poller::spawn(config(300), source, Echo);
        let mut rx = poller.subscribe();

        let state = rx.wait_for(|s| s.cycles == 1).await.unwrap().clone();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.data.as_deref(), Some("mock"));
        assert!(state.from_fallback);
        assert!(state.last_updated.is_none());
        assert_eq!(
            state.last_error,
            Some(FeedError::NetworkFailure("connection refused".to_string()))
        );

        poller.refresh();
        let state = rx.wait_for(|s| s.cycles == 2).await.unwrap().clone();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.data.as_deref(), Some("mock"));
        assert_eq!(state.last_error, Some(FeedError::NetworkFailure("timeout".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_success_keeps_last_good() {
        let (source, _) = ScriptedSource::new(
            Duration::from_secs(1),
            vec![Ok("first".to_string()), Ok("garbage".to_string())],
        );
        let poller = Poller::spawn(config(30), source, Echo);
        let mut rx = poller.subscribe();

        let state = rx.wait_for(|s| s.cycles == 2).await.unwrap().clone();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.data.as_deref(), Some("first"));
        assert!(!state.from_fallback);
        assert!(state.last_updated.is_some());
        assert!(matches!(state.last_error, Some(FeedError::MalformedFeed(_))));

        poller.dismiss_error();
        let state = rx.wait_for(|s| s.last_error.is_none()).await.unwrap().clone();
        assert_eq!(state.data.as_deref(), Some("first"));

        let state = rx.wait_for(|s| s.cycles == 3).await.unwrap().clone();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.data.as_deref(), Some("live"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_abandons_in_flight_fetch() {
        let (source, counters) = ScriptedSource::new(Duration::from_secs(60), vec![]);
        let poller = Poller::spawn(config(30), source, Echo);
        let mut rx = poller.subscribe();
        let start = Instant::now();

        rx.wait_for(|s| s.phase == Phase::Fetching).await.unwrap();
        poller.stop();
        rx.wait_for(|s| s.phase == Phase::Stopped).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(60));

        sleep(Duration::from_secs(120)).await;
        let state = poller.state();
        assert_eq!(state.phase, Phase::Stopped);
        assert!(state.data.is_none());
        assert_eq!(state.cycles, 0);
        assert_eq!(counters.started.load(Ordering::SeqCst), 1);
        assert_eq!(counters.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_task() {
        let (source, counters) = ScriptedSource::new(Duration::from_secs(1), vec![]);
        let poller = Poller::spawn(config(10), source, Echo);
        let mut rx = poller.subscribe();
        rx.wait_for(|s| s.cycles == 1).await.unwrap();

        drop(poller);
        rx.wait_for(|s| s.phase == Phase::Stopped).await.unwrap();
        sleep(Duration::from_secs(100)).await;
        assert_eq!(counters.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetches_never_overlap() {
        let (source, counters) = ScriptedSource::new(Duration::from_secs(25), vec![]);
        let poller = Poller::spawn(config(10), source, Echo);

        sleep(Duration::from_secs(120)).await;
        poller.refresh();
        sleep(Duration::from_secs(60)).await;

        assert_eq!(counters.max_in_flight.load(Ordering::SeqCst), 1);
        let started = counters.started.load(Ordering::SeqCst);
        assert!(started >= 4, "started {started}");
        assert!(started <= 10, "started {started}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_fetch_is_coalesced() {
        let (source, counters) = ScriptedSource::new(Duration::from_secs(5), vec![]);
        let poller = Poller::spawn(config(600), source, Echo);
        let mut rx = poller.subscribe();

        rx.wait_for(|s| s.phase == Phase::Fetching).await.unwrap();
        poller.refresh();
        poller.refresh();
        rx.wait_for(|s| s.cycles == 1).await.unwrap();
        sleep(Duration::from_secs(30)).await;
        assert_eq!(counters.started.load(Ordering::SeqCst), 1);

        poller.refresh();
        rx.wait_for(|s| s.cycles == 2).await.unwrap();
        assert_eq!(counters.started.load(Ordering::SeqCst), 2);
    }

    /// Echo that reports lines starting with `!` as a partial failure.
    struct Lenient;

    impl Transform for Lenient {
        type Payload = String;
        type Output = String;

        fn apply(&self, payload: String) -> Result<String, FeedError> {
            self.apply_partial(payload).map(|(output, _)| output)
        }

        fn apply_partial(&self, payload: String) -> Result<(String, Option<FeedError>), FeedError> {
            match payload.strip_prefix('!') {
                Some(rest) => Ok((rest.to_string(), Some(FeedError::MalformedFeed(rest.to_string())))),
                None => Ok((payload, None)),
            }
        }

        fn fallback(&self) -> String {
            "mock".to_string()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_success_publishes_data_with_error() {
        let (source, _) = ScriptedSource::new(
            Duration::from_secs(1),
            vec![Ok("!half".to_string()), Ok("whole".to_string())],
        );
        let poller = Poller::spawn(config(30), source, Lenient);
        let mut rx = poller.subscribe();

        let state = rx.wait_for(|s| s.cycles == 1).await.unwrap().clone();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.data.as_deref(), Some("half"));
        assert!(state.last_updated.is_some());
        assert!(!state.from_fallback);
        assert_eq!(state.last_error, Some(FeedError::MalformedFeed("half".to_string())));

        poller.refresh();
        let state = rx.wait_for(|s| s.cycles == 2).await.unwrap().clone();
        assert_eq!(state.data.as_deref(), Some("whole"));
        assert_eq!(state.last_error, None);
    }
}
