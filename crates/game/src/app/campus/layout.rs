use campus_engine::app::sprites::SeededRandom;
use campus_engine::assets::{PropKind, TileId};

pub(crate) const WORLD_TILE_SIZE: f32 = 16.0;
pub(crate) const WORLD_COLS: usize = 56;
pub(crate) const WORLD_ROWS: usize = 34;
pub(crate) const WORLD_WIDTH: f32 = WORLD_COLS as f32 * WORLD_TILE_SIZE;
pub(crate) const WORLD_HEIGHT: f32 = WORLD_ROWS as f32 * WORLD_TILE_SIZE;

const BASE_SEED: u32 = 42;
const GRASS_THRESHOLD: f64 = 0.2;

pub(crate) const TREES: &[(PropKind, f32, f32)] = &[
    (PropKind::TreeSmall, 80.0, 140.0),
    (PropKind::TreeMedium, 120.0, 470.0),
    (PropKind::TreeLarge, 760.0, 150.0),
    (PropKind::TreeMedium, 740.0, 480.0),
    (PropKind::TreeSmall, 340.0, 520.0),
    (PropKind::TreeSmall, 560.0, 110.0),
];

pub(crate) const WORLD_PROPS: &[(PropKind, f32, f32)] = &[
    (PropKind::Bench, 210.0, 250.0),
    (PropKind::Lamp, 80.0, 250.0),
    (PropKind::Lamp, 140.0, 420.0),
    (PropKind::Fence, 160.0, 440.0),
    (PropKind::Fence, 192.0, 440.0),
    (PropKind::Fence, 230.0, 440.0),
    (PropKind::Fence, 170.0, 460.0),
    (PropKind::Fence, 210.0, 460.0),
    (PropKind::Fence, 250.0, 460.0),
    (PropKind::Fountain, 130.0, 380.0),
    (PropKind::Bush1, 300.0, 300.0),
    (PropKind::Bush2, 340.0, 320.0),
    (PropKind::Bush1, 610.0, 260.0),
    (PropKind::Bush2, 650.0, 240.0),
    (PropKind::FlowersPatch, 420.0, 340.0),
    (PropKind::FlowersPatch, 460.0, 360.0),
];

/// Where the player stands when the world scene first shows them.
pub(crate) const WORLD_PLAYER_SPAWN: (f32, f32) = (400.0, 320.0);

/// The campus ground: seeded grass, painted paths, a plaza, a pond and
/// three seeded flower patches. Same output on every call.
pub(crate) fn world_tiles() -> Vec<Vec<TileId>> {
    let mut rng = SeededRandom::new(BASE_SEED);
    let mut tiles: Vec<Vec<TileId>> = (0..WORLD_ROWS)
        .map(|_| {
            (0..WORLD_COLS)
                .map(|_| {
                    if rng.next_f64() > GRASS_THRESHOLD {
                        TileId::Grass
                    } else {
                        TileId::GrassAlt
                    }
                })
                .collect()
        })
        .collect();

    paint_rect(&mut tiles, TileId::Path, 6, 13, 44, 3);
    paint_rect(&mut tiles, TileId::Path, 18, 8, 3, 20);
    paint_rect(&mut tiles, TileId::Path, 32, 10, 3, 18);
    paint_rect(&mut tiles, TileId::Path, 44, 12, 3, 16);

    paint_rect(&mut tiles, TileId::PathEdge, 8, 22, 10, 6);
    paint_rect(&mut tiles, TileId::Water, 6, 24, 6, 5);

    scatter(&mut tiles, TileId::Flower, (2, 2, 12, 10), 0.12, 1337);
    scatter(&mut tiles, TileId::Flower, (42, 2, 12, 10), 0.12, 7331);
    scatter(&mut tiles, TileId::Flower, (20, 22, 14, 8), 0.1, 9001);

    tiles
}

fn paint_rect(tiles: &mut [Vec<TileId>], tile: TileId, x0: usize, y0: usize, w: usize, h: usize) {
    for row in tiles.iter_mut().skip(y0).take(h) {
        for cell in row.iter_mut().skip(x0).take(w) {
            *cell = tile;
        }
    }
}

/// One draw per cell of the region, in or out of the grid, so the pattern
/// never depends on grid size.
fn scatter(
    tiles: &mut [Vec<TileId>],
    tile: TileId,
    (x0, y0, w, h): (usize, usize, usize, usize),
    density: f64,
    seed: u32,
) {
    let mut rng = SeededRandom::new(seed);
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            if rng.next_f64() < density {
                if let Some(cell) = tiles.get_mut(y).and_then(|row| row.get_mut(x)) {
                    *cell = tile;
                }
            }
        }
    }
}

/// Checkerboard of floor tiles covering `width` x `height` world pixels.
pub(crate) fn interior_floor(width: f32, height: f32, tile_size: f32) -> Vec<Vec<TileId>> {
    let cols = (width / tile_size).ceil() as usize;
    let rows = (height / tile_size).ceil() as usize;
    (0..rows)
        .map(|y| {
            (0..cols)
                .map(|x| {
                    if (x + y) % 2 == 0 {
                        TileId::Floor
                    } else {
                        TileId::FloorAlt
                    }
                })
                .collect()
        })
        .collect()
}

/// Door anchors for a building interior: one centred door, a fixed pair,
/// or up to three columns spread over `[150, w-150] x [150, h-150]`.
pub(crate) fn room_door_positions(count: usize, width: f32, height: f32) -> Vec<(f32, f32)> {
    match count {
        0 => Vec::new(),
        1 => vec![(width / 2.0, 200.0)],
        2 => vec![(180.0, 180.0), (width - 180.0, 180.0)],
        _ => {
            let cols = count.min(3);
            let rows = count.div_ceil(cols);
            let (start_x, end_x) = (150.0, width - 150.0);
            let (start_y, end_y) = (150.0, height - 150.0);
            let step_x = if cols > 1 {
                (end_x - start_x) / (cols - 1) as f32
            } else {
                0.0
            };
            let step_y = if rows > 1 {
                (end_y - start_y) / (rows - 1) as f32
            } else {
                0.0
            };
            (0..count)
                .map(|index| {
                    let col = index % cols;
                    let row = index / cols;
                    (start_x + col as f32 * step_x, start_y + row as f32 * step_y)
                })
                .collect()
        }
    }
}

const DESK_SPACING: f32 = 130.0;
const DESKS_PER_ROW: usize = 3;

/// Desk anchors for a room: rows of up to three desks 130 px apart, each
/// row centred, rows spread over `[130, h-100]`.
pub(crate) fn desk_positions(count: usize, width: f32, height: f32) -> Vec<(f32, f32)> {
    let rows = count.div_ceil(DESKS_PER_ROW);
    let (start_y, end_y) = (130.0, height - 100.0);
    let row_height = if rows > 1 {
        (end_y - start_y) / (rows - 1) as f32
    } else {
        0.0
    };
    (0..count)
        .map(|index| {
            let row = index / DESKS_PER_ROW;
            let col = index % DESKS_PER_ROW;
            let in_row = DESKS_PER_ROW.min(count - row * DESKS_PER_ROW);
            let start_x = (width - in_row as f32 * DESK_SPACING) / 2.0 + DESK_SPACING / 2.0;
            (
                start_x + col as f32 * DESK_SPACING,
                start_y + row as f32 * row_height,
            )
        })
        .collect()
}
