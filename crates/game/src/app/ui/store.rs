use std::rc::Rc;

use campus_engine::app::bridge::FocusPoint;
use campus_engine::{SceneKind, TransitionState, User, WorldState};
use tracing::debug;

use crate::app::campus::{name_from_email, Roster};

/// Partial camera update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct CameraPatch {
    pub(crate) x: Option<f32>,
    pub(crate) y: Option<f32>,
    pub(crate) zoom: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Login {
        email: String,
    },
    Logout,
    Navigate {
        scene: SceneKind,
        target_id: Option<String>,
    },
    OpenCharacter(String),
    CloseCharacter,
    SetCamera(CameraPatch),
    StartTransition {
        scene: SceneKind,
        target_id: Option<String>,
        focus_point: Option<FocusPoint>,
    },
    CompleteTransition,
    SetTransitionOpacity(f32),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Login { .. } => "login",
            Action::Logout => "logout",
            Action::Navigate { .. } => "navigate",
            Action::OpenCharacter(_) => "open_character",
            Action::CloseCharacter => "close_character",
            Action::SetCamera(_) => "set_camera",
            Action::StartTransition { .. } => "start_transition",
            Action::CompleteTransition => "complete_transition",
            Action::SetTransitionOpacity(_) => "set_transition_opacity",
        }
    }
}

/// Pure state transition. Unknown building or room ids are kept as given;
/// scenes decide what to show for them.
pub(crate) fn reduce(state: &WorldState, action: Action, roster: &Roster) -> WorldState {
    match action {
        Action::Login { email } => {
            let building_id = roster.building_for_email(&email);
            let room_id = roster.default_room(&building_id);
            WorldState {
                user: Some(User {
                    name: name_from_email(&email),
                    email,
                    building_id: building_id.clone(),
                    room_id: room_id.clone(),
                }),
                building_id: Some(building_id),
                room_id: Some(room_id),
                ..state.clone()
            }
        }
        Action::Logout => WorldState::default(),
        Action::Navigate { scene, target_id } => {
            let mut next = state.clone();
            next.scene = scene;
            match scene {
                SceneKind::Building => {
                    next.building_id = target_id.or_else(|| state.building_id.clone());
                }
                SceneKind::Room => {
                    next.room_id = target_id.or_else(|| state.room_id.clone());
                }
                SceneKind::Login | SceneKind::World => {}
            }
            next.selected_character_id = None;
            next
        }
        Action::OpenCharacter(id) => WorldState {
            selected_character_id: Some(id),
            ..state.clone()
        },
        Action::CloseCharacter => WorldState {
            selected_character_id: None,
            ..state.clone()
        },
        Action::SetCamera(patch) => {
            let mut next = state.clone();
            next.camera.x = patch.x.unwrap_or(state.camera.x);
            next.camera.y = patch.y.unwrap_or(state.camera.y);
            next.camera.zoom = patch.zoom.unwrap_or(state.camera.zoom);
            next
        }
        Action::StartTransition {
            scene,
            target_id,
            focus_point,
        } => WorldState {
            transition: TransitionState {
                is_transitioning: true,
                opacity: 1.0,
                target_scene: Some(scene),
                target_id,
                focus_point,
            },
            ..state.clone()
        },
        Action::CompleteTransition => WorldState {
            transition: TransitionState::default(),
            ..state.clone()
        },
        Action::SetTransitionOpacity(opacity) => {
            let mut next = state.clone();
            next.transition.opacity = opacity.clamp(0.0, 1.0);
            next
        }
    }
}

/// Owns the application state and remembers whether it changed since the
/// renderer last saw it.
#[derive(Debug)]
pub(crate) struct WorldStore {
    roster: Rc<Roster>,
    state: WorldState,
    dirty: bool,
}

impl WorldStore {
    pub(crate) fn new(roster: Rc<Roster>) -> Self {
        Self {
            roster,
            state: WorldState::default(),
            dirty: true,
        }
    }

    pub(crate) fn state(&self) -> &WorldState {
        &self.state
    }

    pub(crate) fn roster(&self) -> &Roster {
        &self.roster
    }

    pub(crate) fn dispatch(&mut self, action: Action) {
        let name = action.name();
        let next = reduce(&self.state, action, &self.roster);
        if next != self.state {
            debug!(action = name, scene = %next.scene, "state_changed");
            self.state = next;
            self.dirty = true;
        }
    }

    /// Returns true once per batch of changes.
    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
