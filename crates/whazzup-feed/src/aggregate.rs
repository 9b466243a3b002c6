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

//! Per-region aggregation.
//!
//! Summaries are rebuilt from scratch on every cycle. Every region in the
//! table yields a summary, in table order, whether or not anything matched.

use std::collections::BTreeMap;

use crate::classify::{classify_direction, count_direction, Direction};
use crate::entity::{ControllerRole, EntityKind, NormalizedEntity};
use crate::filter::belongs_to;
use crate::region::RegionDefinition;

/// Default number of entries kept per region in list mode.
pub const DEFAULT_DISPLAY_CAP: usize = 10;

/// How entities are rolled up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateMode {
    /// Counters only.
    Counts,
    /// Counters plus a sorted entity list of at most `cap` entries.
    List { cap: usize },
}

/// Counters for one region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionCounts {
    pub inbound: usize,
    pub outbound: usize,
    pub domestic: usize,
    /// Aircraft online in the region.
    pub online: usize,
    pub controllers: usize,
    pub by_role: BTreeMap<ControllerRole, usize>,
}

/// An entity listed under a region, with its direction for that region.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedEntity {
    pub entity: NormalizedEntity,
    /// Set for aircraft only.
    pub direction: Option<Direction>,
}

/// Aggregate output for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub key: String,
    pub label: String,
    pub counts: RegionCounts,
    /// Empty in counts mode.
    pub entities: Vec<ListedEntity>,
}

impl RegionSummary {
    fn empty(region: &RegionDefinition) -> Self {
        Self {
            key: region.key.clone(),
            label: region.label.clone(),
            counts: RegionCounts::default(),
            entities: Vec::new(),
        }
    }

    /// Whether nothing matched this region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.online == 0 && self.counts.controllers == 0
    }
}

impl RegionCounts {
    fn record(&mut self, region: &RegionDefinition, entity: &NormalizedEntity) {
        match entity.kind {
            EntityKind::Aircraft => {
                self.online += 1;
                match count_direction(region, entity) {
                    Direction::Inbound => self.inbound += 1,
                    Direction::Outbound => self.outbound += 1,
                    Direction::Domestic => self.domestic += 1,
                    Direction::Unknown => {}
                }
            }
            EntityKind::Controller => {
                self.controllers += 1;
                let role = entity.role.unwrap_or(ControllerRole::Other);
                *self.by_role.entry(role).or_default() += 1;
            }
        }
    }
}

/// Roll `entities` up into one summary per region.
#[must_use]
pub fn aggregate(
    entities: &[NormalizedEntity],
    regions: &[RegionDefinition],
    mode: AggregateMode,
) -> Vec<RegionSummary> {
    regions
        .iter()
        .map(|region| {
            let mut summary = RegionSummary::empty(region);

            for entity in entities.iter().filter(|e| belongs_to(e, region)) {
                summary.counts.record(region, entity);
                if let AggregateMode::List { .. } = mode {
                    let direction = (entity.kind == EntityKind::Aircraft)
                        .then(|| classify_direction(region, entity));
                    summary.entities.push(ListedEntity {
                        entity: entity.clone(),
                        direction,
                    });
                }
            }

            if let AggregateMode::List { cap } = mode {
                summary.entities.sort_by(|a, b| {
                    a.entity
                        .callsign
                        .cmp(&b.entity.callsign)
                        .then(a.entity.id.cmp(&b.entity.id))
                });
                summary.entities.truncate(cap);
            }

            summary
        })
        .collect()
}
