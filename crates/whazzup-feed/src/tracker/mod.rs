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

//! Controller roster with merge-by-callsign semantics.
//!
//! Each merge takes the latest controller list as the full truth: entries are
//! upserted by callsign and callsigns absent from the list are removed.
//! Changes are emitted as [`RosterEvent`]s on a broadcast channel.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::info;
use tokio::sync::broadcast;

use crate::entity::NormalizedEntity;

/// Broadcast channel capacity for roster events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted when the roster changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    /// A callsign appeared.
    Online(String),
    /// A known callsign changed role, frequency or rating.
    Updated(String),
    /// A callsign disappeared from the latest list.
    Offline(String),
}

/// A controller on the roster.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub controller: NormalizedEntity,
    /// First merge that saw this callsign.
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl RosterEntry {
    fn differs_from(&self, latest: &NormalizedEntity) -> bool {
        let current = &self.controller;
        current.role != latest.role
            || current.rating != latest.rating
            || (current.frequency - latest.frequency).abs() > f64::EPSILON
    }
}

/// Controllers currently online, keyed by callsign.
pub struct ControllerRoster {
    entries: HashMap<String, RosterEntry>,
    event_tx: broadcast::Sender<RosterEvent>,
}

impl std::fmt::Debug for ControllerRoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerRoster")
            .field("controller_count", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl Default for ControllerRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerRoster {
    #[must_use]
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: HashMap::new(),
            event_tx,
        }
    }

    /// Merge the latest controller list and return the roster sorted by callsign.
    pub fn merge(&mut self, latest: &[NormalizedEntity]) -> Vec<RosterEntry> {
        self.merge_at(latest, Utc::now())
    }

    fn merge_at(&mut self, latest: &[NormalizedEntity], now: DateTime<Utc>) -> Vec<RosterEntry> {
        for controller in latest {
            let callsign = controller.callsign.clone();
            match self.entries.get_mut(&callsign) {
                Some(entry) => {
                    let changed = entry.differs_from(controller);
                    entry.controller = controller.clone();
                    entry.last_seen = now;
                    if changed {
                        let _ = self.event_tx.send(RosterEvent::Updated(callsign));
                    }
                }
                None => {
                    info!("{callsign} online");
                    self.entries.insert(
                        callsign.clone(),
                        RosterEntry {
                            controller: controller.clone(),
                            first_seen: now,
                            last_seen: now,
                        },
                    );
                    let _ = self.event_tx.send(RosterEvent::Online(callsign));
                }
            }
        }

        let gone: Vec<_> = self
            .entries
            .keys()
            .filter(|callsign| !latest.iter().any(|c| &c.callsign == *callsign))
            .cloned()
            .collect();

        for callsign in gone {
            self.entries.remove(&callsign);
            info!("{callsign} offline");
            let _ = self.event_tx.send(RosterEvent::Offline(callsign));
        }

        self.sorted()
    }

    /// The roster sorted by callsign.
    #[must_use]
    pub fn sorted(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<_> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.controller.callsign.cmp(&b.controller.callsign));
        entries
    }

    #[must_use]
    pub fn get(&self, callsign: &str) -> Option<&RosterEntry> {
        self.entries.get(callsign)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribe to roster events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.event_tx.subscribe()
    }
}
