#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tessera_layout::{
    Alignment, CanvasEdges, GridPanel, LayoutProps, LayoutTree, LeafContent, NodeId, Orientation,
    Panel, Size, StackPanel, Track, Visibility, WrapPanel,
};

#[derive(Debug, Arbitrary)]
enum PanelKind {
    Canvas,
    Stack(bool),
    Wrap(bool),
    Grid { columns: u8, rows: u8 },
    Host,
}

#[derive(Debug, Arbitrary)]
enum Op {
    AddLeaf { parent: u8, width: f32, height: f32 },
    AddPanel { parent: u8, kind: PanelKind },
    Move { node: u8, parent: u8, index: u8 },
    Remove { node: u8 },
    Width { node: u8, value: f32 },
    Height { node: u8, value: f32 },
    Margin { node: u8, value: f32 },
    Padding { node: u8, value: f32 },
    Visibility { node: u8, state: u8 },
    Align { node: u8, horizontal: u8, vertical: u8 },
    Canvas { node: u8, left: Option<f32>, bottom: Option<f32> },
    GridCell { node: u8, row: u8, column: u8 },
    Columns { node: u8, fixed: f32, factor: f32 },
    Viewport { width: f32, height: f32 },
    Update,
}

fn pick(nodes: &[NodeId], tree: &LayoutTree, index: u8) -> Option<NodeId> {
    let live: Vec<NodeId> = nodes.iter().copied().filter(|&id| tree.contains(id)).collect();
    if live.is_empty() {
        return None;
    }
    Some(live[index as usize % live.len()])
}

fn alignment(raw: u8) -> Alignment {
    match raw % 4 {
        0 => Alignment::Start,
        1 => Alignment::Center,
        2 => Alignment::End,
        _ => Alignment::Stretch,
    }
}

fn orientation(horizontal: bool) -> Orientation {
    if horizontal {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 256 {
        return;
    }
    let mut tree = LayoutTree::new(Size::new(320.0, 240.0));
    let root = tree.create_panel(Panel::Grid(GridPanel::new()), LayoutProps::default());
    tree.set_root(root).expect("root");
    let mut nodes = vec![root];
    let mut containers = vec![root];

    for op in ops {
        match op {
            Op::AddLeaf { parent, width, height } => {
                let leaf = tree.create_leaf(
                    LeafContent::Fixed(Size::new(width, height)),
                    LayoutProps::default(),
                );
                if let Some(parent) = pick(&containers, &tree, parent) {
                    let _ = tree.append_child(parent, leaf);
                }
                nodes.push(leaf);
            }
            Op::AddPanel { parent, kind } => {
                let props = LayoutProps::default();
                let panel = match kind {
                    PanelKind::Canvas => tree.create_panel(Panel::Canvas, props),
                    PanelKind::Stack(h) => {
                        tree.create_panel(Panel::Stack(StackPanel::new(orientation(h))), props)
                    }
                    PanelKind::Wrap(h) => {
                        tree.create_panel(Panel::Wrap(WrapPanel::new(orientation(h))), props)
                    }
                    PanelKind::Grid { columns, rows } => tree.create_panel(
                        Panel::Grid(
                            GridPanel::new()
                                .with_columns((0..columns % 5).map(|_| Track::auto()))
                                .with_rows((0..rows % 5).map(|_| Track::proportional(1.0))),
                        ),
                        props,
                    ),
                    PanelKind::Host => tree.create_content_host(props),
                };
                if let Some(parent) = pick(&containers, &tree, parent) {
                    let _ = tree.append_child(parent, panel);
                }
                nodes.push(panel);
                containers.push(panel);
            }
            Op::Move { node, parent, index } => {
                if let (Some(node), Some(parent)) =
                    (pick(&nodes, &tree, node), pick(&containers, &tree, parent))
                {
                    if node != root {
                        let _ = tree.insert_child(parent, index as usize, node);
                    }
                }
            }
            Op::Remove { node } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    if node != root {
                        let _ = tree.remove_node(node);
                    }
                }
            }
            Op::Width { node, value } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let _ = tree.set_width(node, value);
                }
            }
            Op::Height { node, value } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let _ = tree.set_height(node, value);
                }
            }
            Op::Margin { node, value } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let _ = tree.set_margin(node, value);
                }
            }
            Op::Padding { node, value } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let _ = tree.set_padding(node, value);
                }
            }
            Op::Visibility { node, state } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let visibility = match state % 3 {
                        0 => Visibility::Visible,
                        1 => Visibility::Hidden,
                        _ => Visibility::Collapsed,
                    };
                    let _ = tree.set_visibility(node, visibility);
                }
            }
            Op::Align { node, horizontal, vertical } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let _ = tree.set_horizontal_alignment(node, alignment(horizontal));
                    let _ = tree.set_vertical_alignment(node, alignment(vertical));
                }
            }
            Op::Canvas { node, left, bottom } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let edges = CanvasEdges {
                        left,
                        bottom,
                        ..CanvasEdges::default()
                    };
                    let _ = tree.set_canvas_edges(node, edges);
                }
            }
            Op::GridCell { node, row, column } => {
                if let Some(node) = pick(&nodes, &tree, node) {
                    let _ = tree.set_grid_row(node, row as usize);
                    let _ = tree.set_grid_column(node, column as usize);
                }
            }
            Op::Columns { node, fixed, factor } => {
                if let Some(node) = pick(&containers, &tree, node) {
                    let _ = tree.set_columns(
                        node,
                        vec![Track::fixed(fixed), Track::auto(), Track::proportional(factor)],
                    );
                }
            }
            Op::Viewport { width, height } => tree.set_viewport(Size::new(width, height)),
            Op::Update => tree.update_layout(),
        }
    }

    tree.update_layout();

    // Post-conditions that must always hold:
    assert!(!tree.needs_layout(), "queues not drained");
    for entry in tree.collect_visuals() {
        let rect = entry.screen_rect;
        assert!(!rect.x.is_nan() && !rect.y.is_nan(), "NaN position");
        assert!(rect.width >= 0.0 && rect.height >= 0.0, "negative extent");
    }
    tree.reset_stats();
    tree.update_layout();
    assert_eq!(tree.stats().measure_computations, 0, "idle pass measured");
    assert_eq!(tree.stats().arrange_computations, 0, "idle pass arranged");
});
