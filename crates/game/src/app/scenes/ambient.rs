use campus_engine::app::display::{rgb, with_alpha, DisplayTree, Node, NodeId};

const WRAP_MARGIN: f32 = 100.0;

/// (x, y, width, height, speed in px per 60 Hz frame)
const CLOUDS: [(f32, f32, f32, f32, f32); 4] = [
    (80.0, 30.0, 60.0, 12.0, 0.15),
    (300.0, 50.0, 80.0, 16.0, 0.1),
    (550.0, 20.0, 50.0, 10.0, 0.2),
    (700.0, 60.0, 70.0, 14.0, 0.12),
];

#[derive(Debug, Clone, Copy)]
struct Cloud {
    node: NodeId,
    speed: f32,
}

/// Blocky clouds drifting right across the world map, re-entering from the
/// left once they pass the far edge.
#[derive(Debug)]
pub(crate) struct AmbientEffects {
    clouds: Vec<Cloud>,
    wrap_x: f32,
}

impl AmbientEffects {
    pub(crate) fn spawn(tree: &mut DisplayTree, parent: NodeId, scene_width: f32) -> Self {
        let white = rgb(0xFFFFFF);
        let clouds = CLOUDS
            .iter()
            .map(|&(x, y, w, h, speed)| {
                let node = tree.add_child(parent, Node::group().at(x, y));
                tree.add_child(node, Node::rect(0.0, 0.0, w, h, with_alpha(white, 0.35)));
                tree.add_child(
                    node,
                    Node::rect(w * 0.15, -h * 0.4, w * 0.5, h * 0.5, with_alpha(white, 0.3)),
                );
                tree.add_child(
                    node,
                    Node::rect(w * 0.4, -h * 0.2, w * 0.4, h * 0.4, with_alpha(white, 0.25)),
                );
                Cloud { node, speed }
            })
            .collect();
        Self {
            clouds,
            wrap_x: scene_width + WRAP_MARGIN,
        }
    }

    pub(crate) fn update(&mut self, dt: f32, tree: &mut DisplayTree) {
        for cloud in &self.clouds {
            let Some(node) = tree.get_mut(cloud.node) else {
                continue;
            };
            node.x += cloud.speed * dt;
            if node.x > self.wrap_x {
                node.x = -WRAP_MARGIN;
            }
        }
    }
}
