use std::rc::Rc;

use campus_engine::app::bridge::EntityType;
use campus_engine::app::display::{
    rgb, with_alpha, Color, DisplayTree, HitRect, Interaction, Node, NodeId,
};
use campus_engine::app::sprites::{
    CharacterOptions, CharacterSprite, PropSprite, HOVER_OUTLINE_COLOR,
};
use campus_engine::assets::{BuildingType, PropKind};
use campus_engine::{Scene, SceneBase, SceneContext, SceneError, TilemapLayer, WorldState};
use tracing::{debug, warn};

use super::spawn_player;
use crate::app::campus::{
    desk_positions, interior_floor, room_door_positions, Building, Roster, Room,
};

const BUILDING_SIZE: (f32, f32) = (600.0, 450.0);
const ROOM_SIZE: (f32, f32) = (500.0, 400.0);
const FLOOR_TILE_SIZE: f32 = 16.0;
const OCCUPANT_SCALE: f32 = 1.6;
const PLAYER_FLOOR_OFFSET: f32 = 70.0;

const WALL_EDGE: Color = rgb(0xB0A898);
const INK: Color = rgb(0x2B2B2B);
const ACTIVE_PIP: Color = rgb(0x60A060);
const IDLE_PIP: Color = rgb(0xB0A898);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Theme {
    pub(crate) wall: Color,
    pub(crate) floor: Color,
    pub(crate) accent: Color,
}

pub(crate) fn theme(building_type: BuildingType) -> Theme {
    let (wall, floor, accent) = match building_type {
        BuildingType::Hub => (0xF0D8B0, 0xF0E8D8, 0xFF9060),
        BuildingType::Workshop => (0xC0D0E0, 0xE0E8F0, 0x5088C0),
        BuildingType::Library => (0xD8C8E8, 0xF0E8F8, 0xA070C0),
        BuildingType::Cafe => (0xF0D0C0, 0xF8E8E0, 0xE07050),
        BuildingType::Greenhouse => (0xC0D8C0, 0xE0F0E0, 0x60A060),
        BuildingType::Postoffice => (0xC0D8D8, 0xE0F0F0, 0x50B8B8),
    };
    Theme {
        wall: rgb(wall),
        floor: rgb(floor),
        accent: rgb(accent),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteriorMode {
    Building,
    Room,
}

impl InteriorMode {
    fn size(self) -> (f32, f32) {
        match self {
            InteriorMode::Building => BUILDING_SIZE,
            InteriorMode::Room => ROOM_SIZE,
        }
    }

    fn name(self) -> &'static str {
        match self {
            InteriorMode::Building => "building",
            InteriorMode::Room => "room",
        }
    }
}

/// World-space point of the door leading to `room_id` inside its building.
pub(crate) fn door_anchor(roster: &Roster, room_id: &str) -> Option<(f32, f32)> {
    let (building, _) = roster.room(room_id)?;
    let index = building.rooms.iter().position(|room| room.id == room_id)?;
    let (width, height) = BUILDING_SIZE;
    room_door_positions(building.rooms.len(), width, height)
        .get(index)
        .map(|&(x, y)| (x, y - 10.0))
}

/// Inside view of a building (one door per room) or of a single room (one
/// desk per occupant). An unknown target builds an empty scene.
pub(crate) struct InteriorScene {
    roster: Rc<Roster>,
    mode: InteriorMode,
    target_id: Option<String>,
    base: SceneBase,
    entity_layer: Option<NodeId>,
    characters: Vec<CharacterSprite>,
    player: Option<CharacterSprite>,
    doors: Vec<NodeId>,
    activity_pip: Option<NodeId>,
}

impl InteriorScene {
    pub(crate) fn new(roster: Rc<Roster>, mode: InteriorMode, target_id: Option<String>) -> Self {
        Self {
            roster,
            mode,
            target_id,
            base: SceneBase::new(),
            entity_layer: None,
            characters: Vec::new(),
            player: None,
            doors: Vec::new(),
            activity_pip: None,
        }
    }

    pub(super) fn doors(&self) -> &[NodeId] {
        &self.doors
    }

    pub(super) fn characters(&self) -> &[CharacterSprite] {
        &self.characters
    }

    pub(super) fn player(&self) -> Option<&CharacterSprite> {
        self.player.as_ref()
    }

    pub(super) fn activity_pip(&self) -> Option<NodeId> {
        self.activity_pip
    }

    pub(super) fn entity_layer(&self) -> Option<NodeId> {
        self.entity_layer
    }

    fn build_shell(
        &self,
        ctx: &mut SceneContext<'_>,
        container: NodeId,
        theme: Theme,
        inset: f32,
        trim_alpha: f32,
    ) -> Result<(), SceneError> {
        let (w, h) = self.mode.size();
        let floor = interior_floor(w, h, FLOOR_TILE_SIZE);
        TilemapLayer::build(ctx.tree, container, &floor, FLOOR_TILE_SIZE, ctx.textures)?;
        ctx.tree.add_child(
            container,
            Node::rect(inset, inset, w - inset * 2.0, h - inset * 2.0, theme.wall)
                .with_stroke(WALL_EDGE),
        );
        let trim = inset + 10.0;
        ctx.tree.add_child(
            container,
            Node::outline(
                trim,
                trim,
                w - trim * 2.0,
                h - trim * 2.0,
                with_alpha(theme.accent, trim_alpha),
            ),
        );
        Ok(())
    }

    fn setup_building(
        &mut self,
        ctx: &mut SceneContext<'_>,
        container: NodeId,
        building: &Building,
    ) -> Result<(), SceneError> {
        let theme = theme(building.building_type);
        let (w, h) = BUILDING_SIZE;
        self.build_shell(ctx, container, theme, 30.0, 0.25)?;

        ctx.tree.add_child(
            container,
            Node::rect(w / 2.0 - 60.0, h / 2.0 - 40.0, 120.0, 80.0, with_alpha(theme.accent, 0.08)),
        );
        for (x, y) in [(70.0, 100.0), (w - 70.0, 100.0), (70.0, h - 50.0), (w - 70.0, h - 50.0)] {
            PropSprite::spawn(ctx.tree, container, PropKind::TreeSmall, x, y, ctx.textures)?;
        }
        PropSprite::spawn(ctx.tree, container, PropKind::Bookshelf, 120.0, h - 80.0, ctx.textures)?;
        PropSprite::spawn(ctx.tree, container, PropKind::Shelf, w - 120.0, h - 90.0, ctx.textures)?;

        ctx.tree.add_child(
            container,
            Node::rect(w / 2.0 - 20.0, 10.0, 40.0, 28.0, with_alpha(theme.accent, 0.2))
                .with_stroke(with_alpha(theme.accent, 0.4)),
        );
        let initial: String = building
            .building_type
            .as_str()
            .chars()
            .take(1)
            .flat_map(char::to_uppercase)
            .collect();
        ctx.tree
            .add_child(container, Node::label(initial, theme.accent).at(w / 2.0, 24.0));

        let entities = ctx.tree.add_child(container, Node::group());
        self.entity_layer = Some(entities);

        let anchors = room_door_positions(building.rooms.len(), w, h);
        for (room, &(x, y)) in building.rooms.iter().zip(anchors.iter()) {
            let door = spawn_door(ctx.tree, entities, room, theme, x, y);
            self.doors.push(door);
        }
        Ok(())
    }

    fn setup_room(
        &mut self,
        ctx: &mut SceneContext<'_>,
        container: NodeId,
        building: &Building,
        room: &Room,
    ) -> Result<(), SceneError> {
        let theme = theme(building.building_type);
        let (w, h) = ROOM_SIZE;
        self.build_shell(ctx, container, theme, 25.0, 0.2)?;
        PropSprite::spawn(ctx.tree, container, PropKind::Whiteboard, w / 2.0, 65.0, ctx.textures)?;

        let entities = ctx.tree.add_child(container, Node::group());
        self.entity_layer = Some(entities);

        let desks = desk_positions(room.characters.len(), w, h);
        for (occupant, &(x, y)) in room.characters.iter().zip(desks.iter()) {
            let desk = PropSprite::spawn(ctx.tree, entities, PropKind::Desk, x, y, ctx.textures)?;
            // Parented to the desk so depth sorting keeps it on the desktop.
            PropSprite::spawn(ctx.tree, desk.node, PropKind::Computer, 0.0, -6.0, ctx.textures)?;

            let mut sprite = ctx.factory.create(
                ctx.tree,
                entities,
                &occupant.id,
                CharacterOptions::interactive(OCCUPANT_SCALE),
                ctx.textures,
            )?;
            sprite.set_position(ctx.tree, x, y + 35.0);
            sprite.set_status(ctx.tree, occupant.status);
            self.characters.push(sprite);
        }

        let pip = if room.is_active() { ACTIVE_PIP } else { IDLE_PIP };
        self.activity_pip = Some(
            ctx.tree
                .add_child(container, Node::rect(w - 30.0, 10.0, 6.0, 6.0, pip)),
        );
        Ok(())
    }
}

fn spawn_door(
    tree: &mut DisplayTree,
    parent: NodeId,
    room: &Room,
    theme: Theme,
    x: f32,
    y: f32,
) -> NodeId {
    let door = tree.add_child(parent, Node::group().at(x, y));
    tree.add_child(door, Node::rect(-20.0, -30.0, 40.0, 40.0, theme.accent).with_stroke(INK));
    tree.add_child(
        door,
        Node::rect(-14.0, -24.0, 28.0, 28.0, with_alpha(theme.accent, 0.7)),
    );
    let occupants = room.characters.len();
    if occupants > 0 {
        tree.add_child(door, Node::rect(10.0, -32.0, 14.0, 14.0, INK));
        tree.add_child(
            door,
            Node::label(occupants.to_string(), rgb(0xFFFFFF)).at(17.0, -25.0),
        );
    }
    let outline = tree.add_child(
        door,
        Node::outline(-23.0, -33.0, 46.0, 46.0, rgb(HOVER_OUTLINE_COLOR)).hidden(),
    );
    if let Some(node) = tree.get_mut(door) {
        node.interaction = Some(Interaction {
            id: room.id.clone(),
            entity_type: EntityType::Door,
            hit: HitRect {
                x: -20.0,
                y: -30.0,
                width: 40.0,
                height: 40.0,
            },
            hover_outline: Some(outline),
        });
    }
    door
}

impl Scene for InteriorScene {
    fn setup(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        let container = self.base.attach(ctx.tree, ctx.layer);
        let roster = Rc::clone(&self.roster);
        let target = self.target_id.as_deref();
        match self.mode {
            InteriorMode::Building => match target.and_then(|id| roster.building(id)) {
                Some(building) => self.setup_building(ctx, container, building)?,
                None => warn!(target = ?target, "building_not_found"),
            },
            InteriorMode::Room => match target.and_then(|id| roster.room(id)) {
                Some((building, room)) => self.setup_room(ctx, container, building, room)?,
                None => warn!(target = ?target, "room_not_found"),
            },
        }
        debug!(
            mode = self.mode.name(),
            doors = self.doors.len(),
            occupants = self.characters.len(),
            "interior_scene_built"
        );
        Ok(())
    }

    fn update(&mut self, dt: f32, ctx: &mut SceneContext<'_>) {
        if let Some(layer) = self.entity_layer {
            ctx.tree.sort_children_by_y(layer);
        }
        for character in &mut self.characters {
            character.update_animation(dt, ctx.tree);
        }
        if let Some(player) = self.player.as_mut() {
            player.update_animation(dt, ctx.tree);
        }
    }

    fn sync_state(&mut self, state: &WorldState, ctx: &mut SceneContext<'_>) {
        let (Some(user), None, Some(layer)) = (&state.user, &self.player, self.entity_layer) else {
            return;
        };
        let (w, h) = self.mode.size();
        match spawn_player(ctx, layer, &user.email, (w / 2.0, h - PLAYER_FLOOR_OFFSET)) {
            Ok(player) => self.player = Some(player),
            Err(err) => warn!(error = %err, scene = self.mode.name(), "player_spawn_failed"),
        }
    }

    fn teardown(&mut self, tree: &mut DisplayTree) {
        self.characters.clear();
        self.player = None;
        self.doors.clear();
        self.activity_pip = None;
        self.entity_layer = None;
        self.base.teardown(tree, self.mode.name());
    }

    fn scene_size(&self) -> (f32, f32) {
        self.mode.size()
    }

    fn container(&self) -> Option<NodeId> {
        self.base.container()
    }

    fn debug_name(&self) -> &'static str {
        self.mode.name()
    }
}
