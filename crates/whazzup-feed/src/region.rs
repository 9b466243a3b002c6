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

//! Static region configuration.
//!
//! Regions are data, not code: the airport and station identifier sets live
//! in `data/regions.json`, which is embedded at build time and may be
//! replaced by a file on disk. The table is loaded once at startup and
//! shared read-only.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUILTIN_REGIONS: &str = include_str!("../data/regions.json");

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("failed to read region table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid region table: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("region table '{table}' is empty")]
    EmptyTable { table: &'static str },
}

/// Inclusive latitude/longitude bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }
}

/// How an entity qualifies for a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRule {
    /// An identifier starting with or equal to any entry (case-insensitive).
    Prefixes(Vec<String>),
    /// A position inside the box.
    BoundingBox(BoundingBox),
}

impl MembershipRule {
    /// Whether `identifier` satisfies a prefix rule. Always false for boxes.
    #[must_use]
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        let Self::Prefixes(prefixes) = self else {
            return false;
        };
        let identifier = identifier.trim().to_ascii_uppercase();
        !identifier.is_empty()
            && prefixes
                .iter()
                .any(|prefix| identifier.starts_with(&prefix.to_ascii_uppercase()))
    }
}

/// One region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub country: String,
    /// Only center-capable regions may host a CTR position.
    #[serde(default)]
    pub center_capable: bool,
    pub membership: MembershipRule,
}

/// The full set of region tables, one per widget family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTable {
    /// FIRs keyed by their airport identifier sets.
    pub traffic_firs: Vec<RegionDefinition>,
    /// Controller stations keyed by callsign prefix.
    pub controller_stations: Vec<RegionDefinition>,
    /// Sectors keyed by bounding box.
    pub sector_boxes: Vec<RegionDefinition>,
}

impl RegionTable {
    /// The table compiled into the crate.
    pub fn builtin() -> Result<Self, RegionError> {
        Self::from_json(BUILTIN_REGIONS)
    }

    pub fn from_json(json: &str) -> Result<Self, RegionError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a table from disk.
    pub fn load(path: &Path) -> Result<Self, RegionError> {
        let json = std::fs::read_to_string(path).map_err(|source| RegionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json(&json)?;
        info!(
            "Loaded region table from {} ({} FIRs, {} stations, {} sectors)",
            path.display(),
            table.traffic_firs.len(),
            table.controller_stations.len(),
            table.sector_boxes.len()
        );
        Ok(table)
    }

    /// Load from `path` when given, otherwise use the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, RegionError> {
        path.map_or_else(Self::builtin, Self::load)
    }

    fn validate(&self) -> Result<(), RegionError> {
        for (table, regions) in [
            ("traffic_firs", &self.traffic_firs),
            ("controller_stations", &self.controller_stations),
            ("sector_boxes", &self.sector_boxes),
        ] {
            if regions.is_empty() {
                return Err(RegionError::EmptyTable { table });
            }
        }
        Ok(())
    }
}
