use std::cell::Cell;
use std::rc::Rc;

use campus_engine::app::bridge::{PlayerMoved, PlayerMovedChannel};
use campus_engine::app::display::{DisplayTree, Node, NodeId};
use campus_engine::app::sprites::{BuildingSprite, CharacterOptions, CharacterSprite, PropSprite};
use campus_engine::{Scene, SceneBase, SceneContext, SceneError, TilemapLayer, WorldState};
use tracing::{debug, warn};

use super::ambient::AmbientEffects;
use super::spawn_player;
use crate::app::campus::{
    world_tiles, Roster, TREES, WORLD_HEIGHT, WORLD_PLAYER_SPAWN, WORLD_PROPS, WORLD_TILE_SIZE,
    WORLD_WIDTH,
};

const NPC_SCALE: f32 = 1.2;

/// Bird's-eye campus: ground tiles, trees and props, clickable buildings,
/// wandering NPCs and drifting clouds.
pub(crate) struct WorldScene {
    roster: Rc<Roster>,
    base: SceneBase,
    entity_layer: Option<NodeId>,
    characters: Vec<CharacterSprite>,
    player: Option<CharacterSprite>,
    ambient: Option<AmbientEffects>,
    pending_move: Rc<Cell<Option<PlayerMoved>>>,
}

impl WorldScene {
    pub(crate) fn new(roster: Rc<Roster>) -> Self {
        Self {
            roster,
            base: SceneBase::new(),
            entity_layer: None,
            characters: Vec::new(),
            player: None,
            ambient: None,
            pending_move: Rc::new(Cell::new(None)),
        }
    }

    pub(super) fn entity_layer(&self) -> Option<NodeId> {
        self.entity_layer
    }

    pub(super) fn player(&self) -> Option<&CharacterSprite> {
        self.player.as_ref()
    }

    pub(super) fn characters(&self) -> &[CharacterSprite] {
        &self.characters
    }
}

impl Scene for WorldScene {
    fn setup(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        let container = self.base.attach(ctx.tree, ctx.layer);
        let ground = ctx.tree.add_child(container, Node::group());
        let entities = ctx.tree.add_child(container, Node::group());
        let effects = ctx.tree.add_child(container, Node::group());
        self.entity_layer = Some(entities);

        TilemapLayer::build(ctx.tree, ground, &world_tiles(), WORLD_TILE_SIZE, ctx.textures)?;

        for &(kind, x, y) in TREES.iter().chain(WORLD_PROPS) {
            PropSprite::spawn(ctx.tree, entities, kind, x, y, ctx.textures)?;
        }

        for building in &self.roster.buildings {
            BuildingSprite::spawn(
                ctx.tree,
                entities,
                &building.id,
                building.building_type,
                building.position.x,
                building.position.y,
                ctx.textures,
            )?;
        }

        for npc in &self.roster.ambient {
            let options = CharacterOptions {
                scale: NPC_SCALE,
                interactive: false,
            };
            let mut sprite = ctx
                .factory
                .create(ctx.tree, entities, &npc.id, options, ctx.textures)?;
            sprite.set_position(ctx.tree, npc.position.x, npc.position.y);
            sprite.set_status(ctx.tree, npc.status);
            self.characters.push(sprite);
        }

        self.ambient = Some(AmbientEffects::spawn(ctx.tree, effects, WORLD_WIDTH));

        let pending = Rc::clone(&self.pending_move);
        self.base.track(
            ctx.bridge
                .on::<PlayerMovedChannel, _>(move |moved: &PlayerMoved| pending.set(Some(*moved))),
        );

        debug!(
            buildings = self.roster.buildings.len(),
            npcs = self.characters.len(),
            "world_scene_built"
        );
        Ok(())
    }

    fn update(&mut self, dt: f32, ctx: &mut SceneContext<'_>) {
        if let Some(moved) = self.pending_move.take() {
            if let Some(player) = &self.player {
                player.set_position(ctx.tree, moved.x, moved.y);
            }
        }
        if let Some(layer) = self.entity_layer {
            ctx.tree.sort_children_by_y(layer);
        }
        for character in &mut self.characters {
            character.update_animation(dt, ctx.tree);
        }
        if let Some(player) = self.player.as_mut() {
            player.update_animation(dt, ctx.tree);
        }
        if let Some(ambient) = self.ambient.as_mut() {
            ambient.update(dt, ctx.tree);
        }
    }

    fn sync_state(&mut self, state: &WorldState, ctx: &mut SceneContext<'_>) {
        let (Some(user), None, Some(layer)) = (&state.user, &self.player, self.entity_layer) else {
            return;
        };
        match spawn_player(ctx, layer, &user.email, WORLD_PLAYER_SPAWN) {
            Ok(player) => self.player = Some(player),
            Err(err) => warn!(error = %err, scene = "world", "player_spawn_failed"),
        }
    }

    fn teardown(&mut self, tree: &mut DisplayTree) {
        self.characters.clear();
        self.player = None;
        self.ambient = None;
        self.entity_layer = None;
        self.pending_move.set(None);
        self.base.teardown(tree, "world");
    }

    fn scene_size(&self) -> (f32, f32) {
        (WORLD_WIDTH, WORLD_HEIGHT)
    }

    fn container(&self) -> Option<NodeId> {
        self.base.container()
    }

    fn debug_name(&self) -> &'static str {
        "world"
    }
}
