//! Concrete campus scenes: the world map and the building/room interiors.

mod ambient;
mod interior;
mod world;


use std::rc::Rc;

use campus_engine::app::display::NodeId;
use campus_engine::app::sprites::{CharacterOptions, CharacterSprite};
use campus_engine::{Scene, SceneContext, SceneError, SceneFactory, SceneKind};

use super::campus::Roster;

pub(crate) use interior::{door_anchor, InteriorMode, InteriorScene};
pub(crate) use world::WorldScene;

const PLAYER_SCALE: f32 = 1.8;

/// Scene id for the signed-in user's sprite; style follows the e-mail.
pub(crate) fn player_character_id(email: &str) -> String {
    format!("user-{email}")
}

fn spawn_player(
    ctx: &mut SceneContext<'_>,
    layer: NodeId,
    email: &str,
    (x, y): (f32, f32),
) -> Result<CharacterSprite, SceneError> {
    let sprite = ctx.factory.create(
        ctx.tree,
        layer,
        &player_character_id(email),
        CharacterOptions {
            scale: PLAYER_SCALE,
            interactive: false,
        },
        ctx.textures,
    )?;
    sprite.set_position(ctx.tree, x, y);
    Ok(sprite)
}

/// Builds campus scenes from the shared roster.
#[derive(Debug, Clone)]
pub(crate) struct CampusSceneFactory {
    roster: Rc<Roster>,
}

impl CampusSceneFactory {
    pub(crate) fn new(roster: Rc<Roster>) -> Self {
        Self { roster }
    }
}

impl SceneFactory for CampusSceneFactory {
    fn create(&self, kind: SceneKind, target_id: Option<&str>) -> Option<Box<dyn Scene>> {
        let roster = Rc::clone(&self.roster);
        let target = target_id.map(str::to_string);
        match kind {
            SceneKind::Login => None,
            SceneKind::World => Some(Box::new(WorldScene::new(roster))),
            SceneKind::Building => Some(Box::new(InteriorScene::new(
                roster,
                InteriorMode::Building,
                target,
            ))),
            SceneKind::Room => Some(Box::new(InteriorScene::new(
                roster,
                InteriorMode::Room,
                target,
            ))),
        }
    }
}
