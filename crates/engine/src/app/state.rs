use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bridge::FocusPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    #[default]
    Login,
    World,
    #[serde(alias = "org")]
    Building,
    #[serde(alias = "pod")]
    Room,
}

impl SceneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SceneKind::Login => "login",
            SceneKind::World => "world",
            SceneKind::Building => "building",
            SceneKind::Room => "room",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scene '{0}'")]
pub struct UnknownSceneError(pub String);

impl FromStr for SceneKind {
    type Err = UnknownSceneError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "login" => Ok(SceneKind::Login),
            "world" => Ok(SceneKind::World),
            "building" | "org" => Ok(SceneKind::Building),
            "room" | "pod" => Ok(SceneKind::Room),
            other => Err(UnknownSceneError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    pub building_id: String,
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionState {
    pub is_transitioning: bool,
    /// Scene visibility in `[0, 1]`; the fade overlay is drawn at `1 - opacity`.
    pub opacity: f32,
    pub target_scene: Option<SceneKind>,
    pub target_id: Option<String>,
    pub focus_point: Option<FocusPoint>,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            is_transitioning: false,
            opacity: 1.0,
            target_scene: None,
            target_id: None,
            focus_point: None,
        }
    }
}

/// Application state owned by the UI layer and pushed into the renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldState {
    pub scene: SceneKind,
    pub building_id: Option<String>,
    pub room_id: Option<String>,
    pub user: Option<User>,
    pub camera: CameraPose,
    pub selected_character_id: Option<String>,
    pub transition: TransitionState,
}

impl WorldState {
    /// Target id matching the active scene kind.
    pub fn active_target(&self) -> Option<&str> {
        match self.scene {
            SceneKind::Building => self.building_id.as_deref(),
            SceneKind::Room => self.room_id.as_deref(),
            SceneKind::Login | SceneKind::World => None,
        }
    }
}
