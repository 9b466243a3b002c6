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

//! Built-in payloads shown when a widget's first cycle fails.
//!
//! These are raw feed documents, not prepared output, so they go through
//! exactly the same parse/filter/aggregate path as live data.

/// Legacy whazzup text with traffic in every sector box.
pub const WHAZZUP_TEXT: &str = "\
!GENERAL:
VERSION = 1
RELOAD = 1
UPDATE = 20250601120000
CONNECTED CLIENTS = 10

!CLIENTS:
RJA501:PILOT:501:IVAO:0:31.20:37.90:35000:460:135:0:2000
RJA117:PILOT:117:IVAO:0:31.72:35.99:0:12:270:1:2000
IAW221:PILOT:221:IVAO:0:33.26:44.23:28000:430:300:0:4312
IAW118:PILOT:118:IVAO:0:36.19:44.01:1200:0:90:1:7000
SYR402:PILOT:402:IVAO:0:33.41:36.51:3000:140:240:0:1200
OJAI_TWR:ATC:901:IVAO:118.100:31.72:35.99:0:0:0:0:0
OJAC_CTR:ATC:902:IVAO:124.700:31.50:36.50:0:0:0:0:0
ORBI_APP:ATC:903:IVAO:119.100:33.26:44.23:0:0:0:0:0
ORBB_CTR:ATC:904:IVAO:127.500:33.30:44.40:0:0:0:0:0
OJAI_ATIS:ATC:905:IVAO:127.200:31.72:35.99:0:0:0:0:0

!SERVERS:
EU1:eu1.ivao.aero:Europe:EU1:1:
";

/// Tracker JSON with flights and controllers across the three FIRs.
pub const TRACKER_JSON: &str = r#"{
  "updatedAt": "2025-06-01T12:00:00.000Z",
  "clients": {
    "pilots": [
      {
        "id": 501, "callsign": "RJA501", "serverId": "EU1", "time": 5400,
        "lastTrack": {"altitude": 35000, "groundSpeed": 460, "heading": 135,
                      "latitude": 31.20, "longitude": 37.90, "onGround": false,
                      "state": "En Route", "timestamp": "2025-06-01T11:59:40.000Z"},
        "flightPlan": {"aircraftId": "A320", "departureId": "OJAI", "arrivalId": "OMDB",
                       "aircraft": {"model": "Airbus A320"}}
      },
      {
        "id": 221, "callsign": "IAW221", "serverId": "EU1", "time": 3600,
        "lastTrack": {"altitude": 24000, "groundSpeed": 410, "heading": 250,
                      "latitude": 32.40, "longitude": 40.10, "onGround": false,
                      "state": "En Route", "timestamp": "2025-06-01T11:59:45.000Z"},
        "flightPlan": {"aircraftId": "B738", "departureId": "ORBI", "arrivalId": "OJAI",
                       "aircraft": {"model": "Boeing 737-800"}}
      },
      {
        "id": 402, "callsign": "SYR402", "serverId": "EU2", "time": 1200,
        "lastTrack": {"altitude": 9000, "groundSpeed": 250, "heading": 315,
                      "latitude": 34.60, "longitude": 36.20, "onGround": false,
                      "state": "Climbing", "timestamp": "2025-06-01T11:59:50.000Z"},
        "flightPlan": {"aircraftId": "A320", "departureId": "OSDI", "arrivalId": "OSLK"}
      },
      {
        "id": 117, "callsign": "RJA117", "serverId": "EU1", "time": 2400,
        "lastTrack": {"altitude": 800, "groundSpeed": 15, "heading": 90,
                      "latitude": 31.98, "longitude": 35.99, "onGround": true,
                      "state": "On Blocks", "timestamp": "2025-06-01T11:59:55.000Z"},
        "flightPlan": {"aircraftId": "E195", "departureId": "LLBG", "arrivalId": "OJAM"}
      },
      {
        "id": 12, "callsign": "UAE12", "serverId": "EU2", "time": 9000,
        "lastTrack": {"altitude": 38000, "groundSpeed": 490, "heading": 300,
                      "latitude": 29.10, "longitude": 47.90, "onGround": false,
                      "state": "En Route", "timestamp": "2025-06-01T11:59:30.000Z"},
        "flightPlan": {"aircraftId": "A388", "departureId": "OMDB", "arrivalId": "EGLL",
                       "aircraft": {"model": "Airbus A380-800"}}
      }
    ],
    "atcs": [
      {"id": 901, "callsign": "OJAI_TWR", "serverId": "EU1", "rating": 4, "time": 3900,
       "createdAt": "2025-06-01T10:55:00.000Z",
       "atcSession": {"frequency": 118.1, "position": "TWR"},
       "atis": {"lines": ["OJAI_TWR", "Queen Alia Tower information A, runway 26L in use, QNH 1013"],
                "revision": "A", "timestamp": "2025-06-01T11:50:00.000Z"}},
      {"id": 902, "callsign": "OJAC_N_CTR", "serverId": "EU1", "rating": 5, "time": 7260,
       "createdAt": "2025-06-01T09:59:00.000Z",
       "atcSession": {"frequency": 124.7, "position": "CTR"}},
      {"id": 903, "callsign": "ORBI_APP", "serverId": "EU2", "rating": 3, "time": 1800,
       "createdAt": "2025-06-01T11:30:00.000Z",
       "atcSession": {"frequency": 119.1, "position": "APP"}},
      {"id": 904, "callsign": "OSDI_GND", "serverId": "EU2", "rating": 2, "time": 600,
       "createdAt": "2025-06-01T11:50:00.000Z",
       "atcSession": {"frequency": 121.9, "position": "GND"}},
      {"id": 905, "callsign": "ORBS_CTR", "serverId": "EU2", "rating": 3, "time": 900,
       "atcSession": {"frequency": 126.3, "position": "CTR"}},
      {"id": 906, "callsign": "OJAI_ATIS", "serverId": "EU1", "rating": 4, "time": 3900,
       "atcSession": {"frequency": 127.2, "position": "ATIS"}},
      {"id": 907, "callsign": "LLBG_TWR", "serverId": "EU1", "rating": 4, "time": 300,
       "atcSession": {"frequency": 118.3, "position": "TWR"}}
    ]
  }
}"#;

const METAR_OJAI: &str = r#"{
  "raw": "OJAI 281200Z 32012KT 10SM CLR 28/15 Q1013 NOSIG",
  "info": {
    "temperature": {"value": 28}, "dewpoint": {"value": 15},
    "wind_speed": {"value": 12}, "wind_direction": {"value": 320},
    "visibility": {"value": 10}, "altimeter": {"value": 1013},
    "weather": [], "clouds": []
  }
}"#;

const METAR_OSDI: &str = r#"{
  "raw": "OSDI 281200Z 04008KT 8SM SCT030 32/18 Q1015 NOSIG",
  "info": {
    "temperature": {"value": 32}, "dewpoint": {"value": 18},
    "wind_speed": {"value": 8}, "wind_direction": {"value": 40},
    "visibility": {"value": 8}, "altimeter": {"value": 1015},
    "weather": [], "clouds": [{"code": "SCT"}]
  }
}"#;

const METAR_ORBI: &str = r#"{
  "raw": "ORBI 281200Z 23015KT 12SM CLR 25/20 Q1012 NOSIG",
  "info": {
    "temperature": {"value": 25}, "dewpoint": {"value": 20},
    "wind_speed": {"value": 15}, "wind_direction": {"value": 230},
    "visibility": {"value": 12}, "altimeter": {"value": 1012},
    "weather": [], "clouds": []
  }
}"#;

/// AVWX METAR document for `station`. Stations without their own mock share OJAI's.
#[must_use]
pub fn metar_json(station: &str) -> &'static str {
    match station.trim().to_ascii_uppercase().as_str() {
        "OSDI" => METAR_OSDI,
        "ORBI" => METAR_ORBI,
        _ => METAR_OJAI,
    }
}
