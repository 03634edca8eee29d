use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use campus_engine::app::sprites::CharacterStatus;
use campus_engine::assets::BuildingType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Building used when an e-mail domain maps to nothing.
pub(crate) const DEFAULT_BUILDING_ID: &str = "hub-main";
const FALLBACK_ROOM_ID: &str = "hub-lobby";

#[derive(Debug, Error)]
pub(crate) enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse roster {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("roster id '{id}' is used more than once")]
    DuplicateId { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct Position {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

const fn at(x: f32, y: f32) -> Position {
    Position { x, y }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Occupant {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default, rename = "isAI", alias = "isAi")]
    pub(crate) is_ai: bool,
    #[serde(default)]
    pub(crate) status: CharacterStatus,
    pub(crate) position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Room {
    pub(crate) id: String,
    pub(crate) position: Position,
    #[serde(default)]
    pub(crate) characters: Vec<Occupant>,
}

impl Room {
    pub(crate) fn is_active(&self) -> bool {
        self.characters
            .iter()
            .any(|occupant| occupant.status == CharacterStatus::Working)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Building {
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) building_type: BuildingType,
    pub(crate) position: Position,
    #[serde(default)]
    pub(crate) rooms: Vec<Room>,
}

/// Campus contents: buildings with their rooms and occupants, the NPCs
/// wandering the world map, and the e-mail domain to building table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Roster {
    pub(crate) buildings: Vec<Building>,
    #[serde(default)]
    pub(crate) ambient: Vec<Occupant>,
    #[serde(default)]
    pub(crate) domains: BTreeMap<String, String>,
}

impl Roster {
    pub(crate) fn load(path: &Path) -> Result<Self, RosterError> {
        let raw = fs::read_to_string(path).map_err(|source| RosterError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::parse(&raw).map_err(|message| RosterError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        roster.validate()?;
        Ok(roster)
    }

    fn parse(raw: &str) -> Result<Self, String> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, Roster>(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                format!("parse roster json: {source}")
            } else {
                format!("parse roster json at {path}: {source}")
            }
        })
    }

    /// Building, room and character ids share one namespace because the
    /// bridge reports clicks by id alone.
    fn validate(&self) -> Result<(), RosterError> {
        let mut seen = HashSet::new();
        let ids = self.buildings.iter().flat_map(|building| {
            std::iter::once(building.id.as_str()).chain(building.rooms.iter().flat_map(|room| {
                std::iter::once(room.id.as_str())
                    .chain(room.characters.iter().map(|occupant| occupant.id.as_str()))
            }))
        });
        for id in ids.chain(self.ambient.iter().map(|npc| npc.id.as_str())) {
            if !seen.insert(id) {
                return Err(RosterError::DuplicateId { id: id.to_string() });
            }
        }
        Ok(())
    }

    pub(crate) fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|building| building.id == id)
    }

    pub(crate) fn room(&self, id: &str) -> Option<(&Building, &Room)> {
        self.buildings.iter().find_map(|building| {
            building
                .rooms
                .iter()
                .find(|room| room.id == id)
                .map(|room| (building, room))
        })
    }

    pub(crate) fn character(&self, id: &str) -> Option<&Occupant> {
        self.buildings
            .iter()
            .flat_map(|building| building.rooms.iter())
            .flat_map(|room| room.characters.iter())
            .find(|occupant| occupant.id == id)
    }

    /// Home building for an e-mail address, by its lower-cased domain.
    pub(crate) fn building_for_email(&self, email: &str) -> String {
        email
            .split('@')
            .nth(1)
            .map(str::to_lowercase)
            .and_then(|domain| self.domains.get(&domain).cloned())
            .unwrap_or_else(|| DEFAULT_BUILDING_ID.to_string())
    }

    pub(crate) fn default_room(&self, building_id: &str) -> String {
        self.building(building_id)
            .and_then(|building| building.rooms.first())
            .map(|room| room.id.clone())
            .unwrap_or_else(|| FALLBACK_ROOM_ID.to_string())
    }

    /// The demo campus.
    pub(crate) fn builtin() -> Self {
        let buildings = vec![
            building(
                "hub-main",
                BuildingType::Hub,
                at(170.0, 170.0),
                vec![
                    room(
                        "hub-lobby",
                        vec![
                            person("char-001", "Alex", false, CharacterStatus::Idle, at(100.0, 200.0)),
                            person("char-002", "Jordan", true, CharacterStatus::Working, at(200.0, 180.0)),
                        ],
                    )
                    .placed(200.0, 150.0),
                    room(
                        "hub-lounge",
                        vec![person("char-003", "Sam", true, CharacterStatus::Done, at(150.0, 220.0))],
                    )
                    .placed(350.0, 150.0),
                ],
            ),
            building(
                "workshop-1",
                BuildingType::Workshop,
                at(470.0, 175.0),
                vec![room(
                    "workshop-floor",
                    vec![
                        person("char-004", "Riley", false, CharacterStatus::Working, at(120.0, 200.0)),
                        person("char-005", "Casey", true, CharacterStatus::Working, at(280.0, 180.0)),
                        person("char-006", "Morgan", false, CharacterStatus::Waiting, at(200.0, 250.0)),
                    ],
                )],
            ),
            building(
                "library-1",
                BuildingType::Library,
                at(720.0, 190.0),
                vec![room(
                    "library-reading",
                    vec![person("char-007", "Quinn", true, CharacterStatus::Idle, at(150.0, 200.0))],
                )],
            ),
            building(
                "cafe-1",
                BuildingType::Cafe,
                at(220.0, 420.0),
                vec![room(
                    "cafe-floor",
                    vec![
                        person("char-008", "Taylor", false, CharacterStatus::Idle, at(100.0, 200.0)),
                        person("char-009", "Avery", true, CharacterStatus::Done, at(250.0, 180.0)),
                    ],
                )],
            ),
            building(
                "greenhouse-1",
                BuildingType::Greenhouse,
                at(480.0, 420.0),
                vec![room(
                    "greenhouse-floor",
                    vec![
                        person("char-010", "Drew", false, CharacterStatus::Working, at(180.0, 200.0)),
                        person("char-011", "Blake", true, CharacterStatus::Working, at(280.0, 220.0)),
                    ],
                )],
            ),
            building(
                "postoffice-1",
                BuildingType::Postoffice,
                at(740.0, 420.0),
                vec![room(
                    "postoffice-counter",
                    vec![person("char-012", "Reese", true, CharacterStatus::Waiting, at(200.0, 200.0))],
                )],
            ),
        ];

        let ambient = vec![
            person("npc-001", "", false, CharacterStatus::Idle, at(300.0, 280.0)),
            person("npc-002", "", true, CharacterStatus::Working, at(520.0, 320.0)),
            person("npc-003", "", false, CharacterStatus::Idle, at(280.0, 500.0)),
        ];

        let domains = [
            ("acme.com", "hub-main"),
            ("techcorp.io", "workshop-1"),
            ("startup.dev", "cafe-1"),
        ]
        .into_iter()
        .map(|(domain, building)| (domain.to_string(), building.to_string()))
        .collect();

        Self {
            buildings,
            ambient,
            domains,
        }
    }
}

/// Display name from the local part of an e-mail, first letter upper-cased.
pub(crate) fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "User".to_string(),
    }
}

fn building(id: &str, building_type: BuildingType, position: Position, rooms: Vec<Room>) -> Building {
    Building {
        id: id.to_string(),
        building_type,
        position,
        rooms,
    }
}

fn room(id: &str, characters: Vec<Occupant>) -> Room {
    Room {
        id: id.to_string(),
        position: at(200.0, 150.0),
        characters,
    }
}

impl Room {
    fn placed(mut self, x: f32, y: f32) -> Self {
        self.position = at(x, y);
        self
    }
}

fn person(id: &str, name: &str, is_ai: bool, status: CharacterStatus, position: Position) -> Occupant {
    Occupant {
        id: id.to_string(),
        name: name.to_string(),
        is_ai,
        status,
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_roster_has_unique_ids() {
        let roster = Roster::builtin();
        assert_eq!(roster.buildings.len(), 6);
        assert!(roster.validate().is_ok());
    }

    #[test]
    fn room_lookup_returns_owning_building() {
        let roster = Roster::builtin();
        let (building, room) = roster.room("workshop-floor").expect("room");
        assert_eq!(building.id, "workshop-1");
        assert_eq!(room.characters.len(), 3);
        assert!(roster.room("pod-3").is_none());
    }

    #[test]
    fn email_domain_picks_home_building() {
        let roster = Roster::builtin();
        assert_eq!(roster.building_for_email("kim@TechCorp.io"), "workshop-1");
        assert_eq!(roster.building_for_email("kim@unknown.org"), DEFAULT_BUILDING_ID);
        assert_eq!(roster.building_for_email("no-at-sign"), DEFAULT_BUILDING_ID);
        assert_eq!(roster.default_room("cafe-1"), "cafe-floor");
        assert_eq!(roster.default_room("missing"), "hub-lobby");
    }

    #[test]
    fn names_come_from_local_part() {
        assert_eq!(name_from_email("alex@acme.com"), "Alex");
        assert_eq!(name_from_email("@acme.com"), "User");
    }

    #[test]
    fn activity_follows_working_occupants() {
        let roster = Roster::builtin();
        assert!(roster.room("hub-lobby").map(|(_, room)| room.is_active()).unwrap_or(false));
        assert!(!roster.room("library-reading").map(|(_, room)| room.is_active()).unwrap_or(true));
    }

    #[test]
    fn load_reports_json_path_of_bad_field() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("roster.json");
        fs::write(
            &path,
            r#"{"buildings":[{"id":"b","type":"castle","position":{"x":0,"y":0}}]}"#,
        )
        .expect("write");

        let err = Roster::load(&path).expect_err("castle is not a building type");
        let message = err.to_string();
        assert!(message.contains("buildings[0].type"), "{message}");
    }

    #[test]
    fn load_rejects_duplicate_ids() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("roster.json");
        fs::write(
            &path,
            r#"{"buildings":[
                {"id":"b","type":"cafe","position":{"x":0,"y":0},
                 "rooms":[{"id":"b","position":{"x":0,"y":0}}]}
            ]}"#,
        )
        .expect("write");

        assert!(matches!(
            Roster::load(&path),
            Err(RosterError::DuplicateId { id }) if id == "b"
        ));
    }

    #[test]
    fn load_accepts_camel_case_occupants() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("roster.json");
        fs::write(
            &path,
            r#"{"buildings":[{"id":"b","type":"library","position":{"x":5,"y":6},
                "rooms":[{"id":"r","position":{"x":0,"y":0},"characters":[
                    {"id":"c","name":"Ada","isAI":false,"status":"waiting","position":{"x":1,"y":2}}
                ]}]}],
               "domains":{"ada.dev":"b"}}"#,
        )
        .expect("write");

        let roster = Roster::load(&path).expect("roster");
        let occupant = roster.character("c").expect("occupant");
        assert_eq!(occupant.status, CharacterStatus::Waiting);
        assert_eq!(roster.building_for_email("ada@ada.dev"), "b");
    }
}
