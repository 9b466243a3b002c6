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

//! Ingestion library for IVAO whazzup and AVWX METAR feeds.
//!
//! The crate is layered so each stage can be used on its own:
//!
//! - **Protocol layer**: parsers for the legacy whazzup text file, the v2
//!   tracker JSON document and AVWX METAR reports
//! - **Entity layer**: one canonical record shape with documented defaults
//! - **Region layer**: static FIR, station and sector tables loaded as data
//! - **Filter / classify / aggregate**: region membership, derived display
//!   fields and per-region summaries
//! - **Poller**: a generic fetch-transform loop with fallback and error state
//!
//! # Quick Start
//!
//! Spawn a poller for the live controller list:
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use whazzup_feed::pipelines::LiveControllers;
//! use whazzup_feed::{HttpFeed, Poller, PollerConfig, RegionTable, TRACKER_URL};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let regions = Arc::new(RegionTable::builtin()?);
//!     let source = HttpFeed::tracker(TRACKER_URL, Duration::from_secs(15))?;
//!     let poller = Poller::spawn(
//!         PollerConfig {
//!             name: "controllers".to_string(),
//!             ..Default::default()
//!         },
//!         source,
//!         LiveControllers::new(regions),
//!     );
//!
//!     let mut updates = poller.subscribe();
//!     while updates.changed().await.is_ok() {
//!         let state = updates.borrow_and_update().clone();
//!         if let Some(board) = state.data {
//!             for controller in &board.controllers {
//!                 println!("{} {:.3}", controller.callsign, controller.frequency);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ```
//! use whazzup_feed::protocol::{FeedParser, LegacyTextParser, RawFeedRecord};
//! use whazzup_feed::{aggregate, normalize_all, AggregateMode, RegionTable};
//!
//! let text = "!CLIENTS:\nRJA1:PILOT:1:2:3:31.7:35.9:12000:280:90:0:2000\n\n";
//! let records: Vec<_> = LegacyTextParser::new()
//!     .parse(text)
//!     .unwrap()
//!     .into_iter()
//!     .map(RawFeedRecord::Legacy)
//!     .collect();
//!
//! let regions = RegionTable::builtin().unwrap();
//! let summaries = aggregate(&normalize_all(&records), &regions.sector_boxes, AggregateMode::Counts);
//! assert_eq!(summaries[0].counts.online, 1);
//! ```

pub mod aggregate;
pub mod classify;
pub mod entity;
pub mod filter;
pub mod mock;
pub mod pipelines;
pub mod poller;
pub mod protocol;
pub mod region;
pub mod source;
pub mod tracker;

pub use aggregate::{aggregate, AggregateMode, ListedEntity, RegionCounts, RegionSummary};
pub use classify::{Condition, Direction, WeatherReport};
pub use entity::{normalize_all, ControllerRole, EntityKind, NormalizedEntity};
pub use poller::{Command, FeedSource, Phase, PollState, Poller, PollerConfig, Transform};
pub use protocol::{FeedError, FeedParser, RawFeedRecord};
pub use region::{MembershipRule, RegionDefinition, RegionError, RegionTable};
pub use source::{HttpFeed, MetarFeed, StationPayload, AVWX_METAR_URL, LEGACY_URL, TRACKER_URL};
pub use tracker::{ControllerRoster, RosterEntry, RosterEvent};
