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

//! Relevance filter: which regions does an entity belong to?

use crate::entity::{ControllerRole, EntityKind, NormalizedEntity};
use crate::region::{MembershipRule, RegionDefinition};

/// Whether a controller role may be shown for `region`.
///
/// Non-operational roles never qualify; a center role needs a
/// center-capable region.
#[must_use]
pub fn role_eligible(role: ControllerRole, region: &RegionDefinition) -> bool {
    match role {
        ControllerRole::Other => false,
        ControllerRole::Center => region.center_capable,
        ControllerRole::Delivery
        | ControllerRole::Ground
        | ControllerRole::Tower
        | ControllerRole::Approach => true,
    }
}

fn in_membership(entity: &NormalizedEntity, rule: &MembershipRule) -> bool {
    match rule {
        MembershipRule::Prefixes(_) => entity
            .membership_identifiers()
            .into_iter()
            .any(|id| rule.matches_identifier(id)),
        MembershipRule::BoundingBox(bbox) => entity
            .position
            .is_some_and(|p| bbox.contains(p.latitude, p.longitude)),
    }
}

/// Whether `entity` belongs to `region`.
#[must_use]
pub fn belongs_to(entity: &NormalizedEntity, region: &RegionDefinition) -> bool {
    if entity.kind == EntityKind::Controller {
        let role = entity.role.unwrap_or(ControllerRole::Other);
        if !role_eligible(role, region) {
            return false;
        }
    }
    in_membership(entity, &region.membership)
}

/// Every region `entity` belongs to, in table order. Empty when none match.
#[must_use]
pub fn regions_for<'a>(
    entity: &NormalizedEntity,
    regions: &'a [RegionDefinition],
) -> Vec<&'a RegionDefinition> {
    regions.iter().filter(|r| belongs_to(entity, r)).collect()
}

/// Drop entities that match no region.
#[must_use]
pub fn retain_relevant(
    entities: Vec<NormalizedEntity>,
    regions: &[RegionDefinition],
) -> Vec<NormalizedEntity> {
    entities
        .into_iter()
        .filter(|e| regions.iter().any(|r| belongs_to(e, r)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Position;
    use crate::protocol::{AtcClient, AtcSession, PilotClient};
    use crate::region::{BoundingBox, RegionTable};

    fn controller(callsign: &str, position: &str) -> NormalizedEntity {
        NormalizedEntity::from_controller(&AtcClient {
            callsign: Some(callsign.to_string()),
            atc_session: Some(AtcSession {
                frequency: 124.1,
                position: Some(position.to_string()),
            }),
            ..Default::default()
        })
    }

    fn station(key: &str, center_capable: bool) -> RegionDefinition {
        RegionDefinition {
            key: key.to_string(),
            label: key.to_string(),
            country: String::new(),
            center_capable,
            membership: MembershipRule::Prefixes(vec![key.to_string()]),
        }
    }

    #[test]
    fn test_center_only_for_center_capable_region() {
        let regions = [station("OJAC", true), station("XYZZ", false)];

        let ojac = controller("OJAC_N_CTR", "CTR");
        let keys: Vec<_> = regions_for(&ojac, &regions).iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["OJAC"]);

        let xyzz = controller("XYZZ_CTR", "CTR");
        assert!(regions_for(&xyzz, &regions).is_empty());

        let tower = controller("XYZZ_TWR", "TWR");
        assert_eq!(regions_for(&tower, &regions).len(), 1);
    }

    #[test]
    fn test_non_operational_roles_never_match() {
        let regions = [station("OJAI", false)];
        assert!(regions_for(&controller("OJAI_ATIS", "ATIS"), &regions).is_empty());
        assert!(regions_for(&controller("OJAI_FSS", "FSS"), &regions).is_empty());
    }

    #[test]
    fn test_all_matching_regions_reported() {
        let table = RegionTable::builtin().unwrap();
        let mut entity = NormalizedEntity::from_pilot(&PilotClient::default());
        entity.origin = Some("OJAI".to_string());
        entity.destination = Some("ORBI".to_string());

        let keys: Vec<_> = regions_for(&entity, &table.traffic_firs)
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(keys, ["OJAC", "ORBB"]);
    }

    #[test]
    fn test_bounding_box_membership() {
        let sector = RegionDefinition {
            key: "OSDI".to_string(),
            label: "Damascus Control".to_string(),
            country: "Syria".to_string(),
            center_capable: false,
            membership: MembershipRule::BoundingBox(BoundingBox {
                min_lat: 29.0,
                max_lat: 37.0,
                min_lon: 38.0,
                max_lon: 50.0,
            }),
        };
        let mut entity = NormalizedEntity::from_pilot(&PilotClient::default());
        assert!(!belongs_to(&entity, &sector));

        entity.position = Some(Position {
            latitude: 33.3,
            longitude: 44.2,
        });
        assert!(belongs_to(&entity, &sector));

        entity.position = Some(Position {
            latitude: 31.7,
            longitude: 35.9,
        });
        assert!(!belongs_to(&entity, &sector));
    }

    #[test]
    fn test_unmatched_entities_are_dropped() {
        let regions = [station("OJAI", false)];
        let kept = retain_relevant(
            vec![controller("OJAI_TWR", "TWR"), controller("EGLL_TWR", "TWR")],
            &regions,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].callsign, "OJAI_TWR");
    }
}
