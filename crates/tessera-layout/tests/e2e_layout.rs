//! End-to-end layout scenarios with JSONL structured logging.
//!
//! Each test builds a small tree, runs one or more frame boundaries, and
//! checks the arranged geometry together with the work counters.
//!
//! Run: `cargo test -p tessera-layout --test e2e_layout -- --nocapture`

use std::cell::Cell as Flag;
use std::rc::Rc;
use std::sync::Mutex;

use serde_json::json;
use tessera_layout::{
    Alignment, CanvasEdges, GridPanel, LayoutError, LayoutProps, LayoutTree, LeafContent, NodeId,
    Orientation, Panel, Rect, Size, SolveMode, StackPanel, Track, Visibility, WrapPanel,
};

// ============================================================================
// JSONL Logging Infrastructure
// ============================================================================

struct JsonlLog {
    entries: Mutex<Vec<serde_json::Value>>,
}

impl JsonlLog {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, entry: serde_json::Value) {
        self.entries.lock().unwrap().push(entry);
    }

    fn flush(&self, test_name: &str) {
        let entries = self.entries.lock().unwrap();
        for entry in entries.iter() {
            eprintln!("[JSONL] {test_name}: {entry}");
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

fn log_stats(log: &JsonlLog, test: &str, phase: &str, tree: &LayoutTree) {
    log.emit(json!({
        "test": test,
        "phase": phase,
        "stats": tree.stats(),
    }));
}

// ============================================================================
// Helpers
// ============================================================================

fn fixed(tree: &mut LayoutTree, w: f32, h: f32) -> NodeId {
    tree.create_leaf(LeafContent::Fixed(Size::new(w, h)), LayoutProps::default())
}

fn fixed_with(tree: &mut LayoutTree, w: f32, h: f32, props: LayoutProps) -> NodeId {
    tree.create_leaf(LeafContent::Fixed(Size::new(w, h)), props)
}

fn grid(tree: &mut LayoutTree, columns: Vec<Track>, rows: Vec<Track>) -> NodeId {
    tree.create_panel(
        Panel::Grid(GridPanel::new().with_columns(columns).with_rows(rows)),
        LayoutProps::default(),
    )
}

fn stack(tree: &mut LayoutTree) -> NodeId {
    tree.create_panel(Panel::Stack(StackPanel::default()), LayoutProps::default())
}

/// Sidebar/content/footer application shell used by several tests.
fn app_shell(tree: &mut LayoutTree) -> (NodeId, Vec<NodeId>) {
    let root = grid(
        tree,
        vec![Track::fixed(60.0), Track::proportional(1.0)],
        vec![Track::proportional(1.0), Track::auto()],
    );
    let sidebar = tree.create_panel(
        Panel::Stack(StackPanel::default()),
        LayoutProps::default().with_grid(0, 0),
    );
    let content = tree.create_panel(
        Panel::Wrap(WrapPanel::default()),
        LayoutProps::default().with_grid(0, 1).with_padding(4.0),
    );
    let footer = fixed_with(tree, 10.0, 12.0, LayoutProps::default().with_grid(1, 1));
    tree.set_root(root).unwrap();
    for &child in &[sidebar, content, footer] {
        tree.append_child(root, child).unwrap();
    }
    let mut leaves = Vec::new();
    for _ in 0..3 {
        let item = fixed(tree, 60.0, 16.0);
        tree.append_child(sidebar, item).unwrap();
        leaves.push(item);
    }
    for _ in 0..5 {
        let tile = fixed_with(tree, 50.0, 30.0, LayoutProps::default().with_margin(2.0));
        tree.append_child(content, tile).unwrap();
        leaves.push(tile);
    }
    (root, leaves)
}

/// Text-like content: as wide as it may be, one more line per fold.
fn reflowing(natural: Size) -> LeafContent {
    LeafContent::measured(move |available: Size| {
        let width = natural.width.min(available.width);
        let lines = if width > 0.0 {
            (natural.width / width).ceil()
        } else {
            1.0
        };
        Size::new(width, natural.height * lines)
    })
}

fn all_rects(tree: &mut LayoutTree) -> Vec<(NodeId, Rect)> {
    tree.visuals()
        .into_iter()
        .map(|entry| (entry.node, entry.screen_rect))
        .collect()
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn e2e_second_update_does_no_work() {
    let log = JsonlLog::new();
    let mut tree = LayoutTree::new(Size::new(320.0, 200.0));
    app_shell(&mut tree);

    tree.update_layout();
    log_stats(&log, "second_update_does_no_work", "first", &tree);
    let before = all_rects(&mut tree);

    tree.reset_stats();
    tree.update_layout();
    log_stats(&log, "second_update_does_no_work", "second", &tree);

    assert_eq!(tree.stats().measure_computations, 0);
    assert_eq!(tree.stats().arrange_computations, 0);
    assert_eq!(all_rects(&mut tree), before);
    log.flush("second_update_does_no_work");
}

#[test]
fn e2e_force_full_matches_incremental() {
    let mut incremental = LayoutTree::new(Size::new(320.0, 200.0));
    let (_, leaves) = app_shell(&mut incremental);
    incremental.update_layout();
    incremental.set_height(leaves[0], 40.0).unwrap();
    incremental.update_layout();

    let mut full = LayoutTree::new(Size::new(320.0, 200.0));
    let (_, full_leaves) = app_shell(&mut full);
    full.set_force_full(true);
    full.set_height(full_leaves[0], 40.0).unwrap();
    full.update_layout();

    assert_eq!(all_rects(&mut incremental), all_rects(&mut full));
}

// ============================================================================
// Grid track sizing
// ============================================================================

#[test]
fn e2e_proportional_columns_split_by_factor() {
    let log = JsonlLog::new();
    let mut tree = LayoutTree::new(Size::new(300.0, 100.0));
    let root = grid(
        &mut tree,
        vec![Track::proportional(1.0), Track::proportional(2.0)],
        vec![],
    );
    let left = fixed_with(&mut tree, 0.0, 0.0, LayoutProps::default().with_grid(0, 0));
    let right = fixed_with(&mut tree, 0.0, 0.0, LayoutProps::default().with_grid(0, 1));
    tree.set_root(root).unwrap();
    tree.append_child(root, left).unwrap();
    tree.append_child(root, right).unwrap();
    tree.update_layout();

    let columns = tree.grid(root).unwrap().columns();
    log.emit(json!({
        "test": "proportional_columns_split_by_factor",
        "widths": columns.iter().map(|t| t.measured_size()).collect::<Vec<_>>(),
    }));
    assert_eq!(tree.final_rect(left), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    assert_eq!(tree.final_rect(right), Some(Rect::new(100.0, 0.0, 200.0, 100.0)));
    log.flush("proportional_columns_split_by_factor");
}

#[test]
fn e2e_auto_column_takes_widest_child() {
    let mut tree = LayoutTree::new(Size::new(300.0, 100.0));
    let root = grid(
        &mut tree,
        vec![Track::auto(), Track::proportional(1.0)],
        vec![Track::auto(), Track::auto()],
    );
    let narrow = fixed_with(&mut tree, 50.0, 10.0, LayoutProps::default().with_grid(0, 0));
    let wide = fixed_with(&mut tree, 80.0, 10.0, LayoutProps::default().with_grid(1, 0));
    tree.set_root(root).unwrap();
    tree.append_child(root, narrow).unwrap();
    tree.append_child(root, wide).unwrap();
    tree.update_layout();

    let grid = tree.grid(root).unwrap();
    assert_eq!(grid.cell(0, 0).unwrap().size(), Size::new(80.0, 10.0));
    assert_eq!(grid.cell(1, 1).unwrap().rect(), Rect::new(80.0, 10.0, 220.0, 10.0));
    // Stretch widens the narrow child to its cell.
    assert_eq!(tree.final_rect(narrow).unwrap().width, 80.0);
}

#[test]
fn e2e_non_stretch_child_does_not_size_auto_track() {
    let mut tree = LayoutTree::new(Size::new(300.0, 100.0));
    let root = grid(&mut tree, vec![Track::auto(), Track::proportional(1.0)], vec![]);
    let centered = fixed_with(
        &mut tree,
        70.0,
        10.0,
        LayoutProps::default().with_alignment(Alignment::Center, Alignment::Center),
    );
    tree.set_root(root).unwrap();
    tree.append_child(root, centered).unwrap();
    tree.update_layout();

    assert_eq!(tree.grid(root).unwrap().columns()[0].measured_size(), 0.0);
    assert!(tree.grid(root).unwrap().cell(0, 0).unwrap().requires_clip());

    // Switching to stretch lets it drive the track.
    tree.set_horizontal_alignment(centered, Alignment::Stretch).unwrap();
    tree.update_layout();
    assert_eq!(tree.grid(root).unwrap().columns()[0].measured_size(), 70.0);
    assert!(!tree.grid(root).unwrap().cell(0, 0).unwrap().requires_clip());
}

#[test]
fn e2e_out_of_range_indices_clamp_to_last_track() {
    let mut tree = LayoutTree::new(Size::new(100.0, 40.0));
    let root = grid(&mut tree, vec![Track::fixed(30.0), Track::fixed(70.0)], vec![]);
    let stray = fixed_with(&mut tree, 0.0, 0.0, LayoutProps::default().with_grid(5, 9));
    tree.set_root(root).unwrap();
    tree.append_child(root, stray).unwrap();
    tree.update_layout();

    assert_eq!(tree.final_rect(stray), Some(Rect::new(30.0, 0.0, 70.0, 40.0)));
    assert_eq!(tree.grid(root).unwrap().cell(0, 1).unwrap().elements(), &[stray]);
}

#[test]
fn e2e_grid_cell_clips_overflowing_child() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = grid(&mut tree, vec![Track::fixed(50.0), Track::proportional(1.0)], vec![]);
    let wide = fixed_with(
        &mut tree,
        80.0,
        10.0,
        LayoutProps::default().with_alignment(Alignment::Start, Alignment::Stretch),
    );
    tree.set_root(root).unwrap();
    tree.append_child(root, wide).unwrap();

    let visuals = tree.visuals();
    let cell = tree.grid(root).unwrap().cell(0, 0).unwrap();
    assert!(cell.requires_clip());
    assert!(!tree.grid(root).unwrap().cell(0, 1).unwrap().requires_clip());

    let entry = visuals.iter().find(|e| e.node == wide).unwrap();
    assert_eq!(entry.screen_rect, Rect::new(0.0, 0.0, 80.0, 100.0));
    assert_eq!(entry.clip, Some(Rect::new(0.0, 0.0, 50.0, 100.0)));
    assert_eq!(entry.visible_rect(), Rect::new(0.0, 0.0, 50.0, 100.0));
}

#[test]
fn e2e_track_definition_change_relayouts() {
    let mut tree = LayoutTree::new(Size::new(300.0, 100.0));
    let root = grid(
        &mut tree,
        vec![Track::proportional(1.0), Track::proportional(1.0)],
        vec![],
    );
    let right = fixed_with(&mut tree, 0.0, 0.0, LayoutProps::default().with_grid(0, 1));
    tree.set_root(root).unwrap();
    tree.append_child(root, right).unwrap();
    tree.update_layout();
    assert_eq!(tree.final_rect(right).unwrap().x, 150.0);

    tree.set_columns(root, vec![Track::fixed(100.0), Track::proportional(1.0)])
        .unwrap();
    tree.update_layout();
    assert_eq!(tree.final_rect(right), Some(Rect::new(100.0, 0.0, 200.0, 100.0)));

    tree.reset_stats();
    tree.set_columns(root, vec![Track::fixed(100.0), Track::proportional(1.0)])
        .unwrap();
    assert!(!tree.needs_layout());
}

#[test]
fn e2e_auto_column_follows_reflowing_content() {
    let build = |force_full: bool| {
        let mut tree = LayoutTree::new(Size::new(200.0, 100.0));
        tree.set_force_full(force_full);
        let root = grid(&mut tree, vec![Track::auto(), Track::proportional(1.0)], vec![]);
        let leaf = tree.create_leaf(reflowing(Size::new(50.0, 10.0)), LayoutProps::default());
        tree.set_root(root).unwrap();
        tree.append_child(root, leaf).unwrap();
        tree.update_layout();
        tree.set_leaf_content(leaf, reflowing(Size::new(90.0, 10.0))).unwrap();
        tree.update_layout();
        (tree, root, leaf)
    };
    let (mut incremental, root, leaf) = build(false);
    let (mut full, _, _) = build(true);

    assert_eq!(incremental.grid(root).unwrap().columns()[0].measured_size(), 90.0);
    assert_eq!(incremental.final_rect(leaf).unwrap().width, 90.0);
    assert_eq!(all_rects(&mut incremental), all_rects(&mut full));
}

#[test]
fn e2e_nested_reflow_reaches_the_grid() {
    let log = JsonlLog::new();
    let build = |force_full: bool| {
        let mut tree = LayoutTree::new(Size::new(200.0, 100.0));
        tree.set_force_full(force_full);
        let root = grid(&mut tree, vec![Track::auto(), Track::proportional(1.0)], vec![]);
        let column = stack(&mut tree);
        let leaf = tree.create_leaf(reflowing(Size::new(50.0, 10.0)), LayoutProps::default());
        tree.set_root(root).unwrap();
        tree.append_child(root, column).unwrap();
        tree.append_child(column, leaf).unwrap();
        tree.update_layout();
        tree.set_leaf_content(leaf, reflowing(Size::new(90.0, 10.0))).unwrap();
        tree.update_layout();
        (tree, column)
    };
    let (mut incremental, column) = build(false);
    let (mut full, _) = build(true);
    log_stats(&log, "nested_reflow_reaches_the_grid", "incremental", &incremental);

    assert_eq!(incremental.final_rect(column).unwrap().width, 90.0);
    assert_eq!(all_rects(&mut incremental), all_rects(&mut full));
    log.flush("nested_reflow_reaches_the_grid");
}

#[test]
fn e2e_grid_rearrange_keeps_measured_track_sizes() {
    // The reflowing child folds to two lines inside its 40-wide cell, but
    // the auto row was sized from the one-line height it measured at.
    let build = |force_full: bool| {
        let mut tree = LayoutTree::new(Size::new(200.0, 100.0));
        tree.set_force_full(force_full);
        let root = grid(
            &mut tree,
            vec![Track::auto().with_max(40.0)],
            vec![Track::auto(), Track::auto()],
        );
        let text = tree.create_leaf(reflowing(Size::new(80.0, 10.0)), LayoutProps::default());
        let below = fixed_with(&mut tree, 10.0, 10.0, LayoutProps::default().with_grid(1, 0));
        tree.set_root(root).unwrap();
        tree.append_child(root, text).unwrap();
        tree.append_child(root, below).unwrap();
        tree.update_layout();
        (tree, root, text, below)
    };
    let (mut incremental, root, text, below) = build(false);
    assert_eq!(incremental.final_rect(below).unwrap().y, 10.0);
    assert!(incremental.grid(root).unwrap().cell(0, 0).unwrap().requires_clip());

    incremental.invalidate_arrange(root).unwrap();
    incremental.update_layout();
    assert_eq!(incremental.final_rect(text).unwrap().height, 20.0);
    assert_eq!(incremental.final_rect(below).unwrap().y, 10.0);

    let (mut full, _, _, _) = build(true);
    assert_eq!(all_rects(&mut incremental), all_rects(&mut full));
}

// ============================================================================
// Canvas, stack, wrap
// ============================================================================

#[test]
fn e2e_canvas_dual_edges_stretch_child() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = tree.create_panel(Panel::Canvas, LayoutProps::default());
    let child = tree.create_leaf(
        LeafContent::Empty,
        LayoutProps::default().with_canvas(CanvasEdges {
            left: Some(10.0),
            right: Some(10.0),
            ..CanvasEdges::default()
        }),
    );
    tree.set_root(root).unwrap();
    tree.append_child(root, child).unwrap();
    tree.update_layout();

    let rect = tree.final_rect(child).unwrap();
    assert_eq!((rect.x, rect.width), (10.0, 80.0));
}

#[test]
fn e2e_canvas_edge_change_relayouts_child() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = tree.create_panel(Panel::Canvas, LayoutProps::default());
    let child = fixed(&mut tree, 20.0, 20.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, child).unwrap();
    tree.update_layout();
    assert_eq!(tree.final_rect(child), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));

    tree.set_canvas_edges(
        child,
        CanvasEdges {
            right: Some(5.0),
            bottom: Some(5.0),
            ..CanvasEdges::default()
        },
    )
    .unwrap();
    tree.update_layout();
    assert_eq!(tree.final_rect(child), Some(Rect::new(75.0, 75.0, 20.0, 20.0)));
}

#[test]
fn e2e_wrap_breaks_lines() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = tree.create_panel(Panel::Wrap(WrapPanel::default()), LayoutProps::default());
    let items: Vec<_> = (0..3).map(|_| fixed(&mut tree, 40.0, 10.0)).collect();
    tree.set_root(root).unwrap();
    for &item in &items {
        tree.append_child(root, item).unwrap();
    }
    tree.update_layout();

    assert_eq!(tree.final_rect(items[0]), Some(Rect::new(0.0, 0.0, 40.0, 10.0)));
    assert_eq!(tree.final_rect(items[1]), Some(Rect::new(40.0, 0.0, 40.0, 10.0)));
    assert_eq!(tree.final_rect(items[2]), Some(Rect::new(0.0, 10.0, 40.0, 10.0)));
    assert_eq!(tree.desired_size(root), Some(Size::new(80.0, 20.0)));
}

#[test]
fn e2e_orientation_change_restacks() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = stack(&mut tree);
    let a = fixed(&mut tree, 10.0, 10.0);
    let b = fixed(&mut tree, 10.0, 10.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, a).unwrap();
    tree.append_child(root, b).unwrap();
    tree.update_layout();
    assert_eq!(tree.final_rect(b), Some(Rect::new(0.0, 10.0, 100.0, 10.0)));

    tree.set_orientation(root, Orientation::Horizontal).unwrap();
    tree.update_layout();
    assert_eq!(tree.final_rect(b), Some(Rect::new(10.0, 0.0, 10.0, 100.0)));
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn e2e_collapsed_children_take_no_space() {
    let log = JsonlLog::new();
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = stack(&mut tree);
    let items: Vec<_> = (0..3).map(|_| fixed(&mut tree, 10.0, 10.0)).collect();
    tree.set_root(root).unwrap();
    for &item in &items {
        tree.append_child(root, item).unwrap();
    }
    tree.update_layout();
    assert_eq!(tree.final_rect(items[2]).unwrap().y, 20.0);

    tree.set_visibility(items[1], Visibility::Collapsed).unwrap();
    tree.update_layout();
    log_stats(&log, "collapsed_children_take_no_space", "collapsed", &tree);

    assert_eq!(tree.final_rect(items[2]).unwrap().y, 10.0);
    assert_eq!(tree.desired_size(root), Some(Size::new(10.0, 20.0)));
    assert!(tree.visuals().iter().all(|e| e.node != items[1]));

    tree.set_visibility(items[1], Visibility::Visible).unwrap();
    tree.update_layout();
    assert_eq!(tree.final_rect(items[2]).unwrap().y, 20.0);
    assert!(log.len() > 0);
    log.flush("collapsed_children_take_no_space");
}

#[test]
fn e2e_hidden_children_keep_their_slot() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = stack(&mut tree);
    let a = fixed(&mut tree, 10.0, 10.0);
    let b = fixed(&mut tree, 10.0, 10.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, a).unwrap();
    tree.append_child(root, b).unwrap();
    tree.update_layout();

    tree.reset_stats();
    tree.set_visibility(a, Visibility::Hidden).unwrap();
    tree.update_layout();
    assert_eq!(tree.stats().measure_computations, 0);
    assert_eq!(tree.final_rect(b).unwrap().y, 10.0);

    let entry = tree.visuals().into_iter().find(|e| e.node == a).unwrap();
    assert!(!entry.visible);
}

// ============================================================================
// Clipping
// ============================================================================

#[test]
fn e2e_nested_clips_only_shrink() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = tree.create_panel(Panel::Canvas, LayoutProps::default());
    let inner = tree.create_panel(
        Panel::Canvas,
        LayoutProps::default()
            .with_size(80.0, 80.0)
            .with_canvas(CanvasEdges {
                left: Some(40.0),
                ..CanvasEdges::default()
            }),
    );
    let leaf = tree.create_leaf(
        LeafContent::Fixed(Size::new(40.0, 10.0)),
        LayoutProps::default().with_canvas(CanvasEdges {
            left: Some(60.0),
            ..CanvasEdges::default()
        }),
    );
    tree.set_root(root).unwrap();
    tree.append_child(root, inner).unwrap();
    tree.append_child(inner, leaf).unwrap();

    let visuals = tree.visuals();
    assert!(tree.clip_region(root).unwrap().requires_clip);
    assert!(tree.clip_region(inner).unwrap().requires_clip);

    let inner_entry = visuals.iter().find(|e| e.node == inner).unwrap();
    let leaf_entry = visuals.iter().find(|e| e.node == leaf).unwrap();
    assert_eq!(inner_entry.clip, Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    assert_eq!(leaf_entry.clip, Some(Rect::new(40.0, 0.0, 60.0, 80.0)));
    assert!(inner_entry.clip.unwrap().contains_rect(&leaf_entry.clip.unwrap()));
}

#[test]
fn e2e_fitting_children_need_no_clip() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = stack(&mut tree);
    let a = fixed(&mut tree, 100.0, 40.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, a).unwrap();
    tree.update_layout();
    assert!(!tree.clip_region(root).unwrap().requires_clip);
    assert_eq!(tree.clip_region(root).unwrap().active(), None);
}

// ============================================================================
// Invalidation
// ============================================================================

#[test]
fn e2e_reentrant_invalidation_is_deferred() {
    let log = JsonlLog::new();
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let handle = tree.invalidation_handle();
    let target: Rc<Flag<Option<NodeId>>> = Rc::new(Flag::new(None));
    let armed = Rc::new(Flag::new(true));

    let oracle_target = Rc::clone(&target);
    let oracle_armed = Rc::clone(&armed);
    let noisy = tree.create_leaf(
        LeafContent::measured(move |_available: Size| {
            if oracle_armed.replace(false) {
                if let Some(id) = oracle_target.get() {
                    handle.invalidate_measure(id);
                }
            }
            Size::new(10.0, 10.0)
        }),
        LayoutProps::default(),
    );
    let root = stack(&mut tree);
    let quiet = fixed(&mut tree, 10.0, 10.0);
    target.set(Some(quiet));
    tree.set_root(root).unwrap();
    tree.append_child(root, noisy).unwrap();
    tree.append_child(root, quiet).unwrap();

    tree.update_layout();
    log_stats(&log, "reentrant_invalidation_is_deferred", "first", &tree);
    assert_eq!(tree.stats().deferred_invalidations, 1);
    assert!(tree.is_measure_valid(quiet));
    assert!(tree.needs_layout());

    tree.update_layout();
    log_stats(&log, "reentrant_invalidation_is_deferred", "second", &tree);
    assert_eq!(tree.stats().deferred_invalidations, 1);
    assert!(tree.stats().measure_drained >= 1);
    assert!(!tree.needs_layout());
    log.flush("reentrant_invalidation_is_deferred");
}

#[test]
fn e2e_handle_requests_apply_at_next_update() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = stack(&mut tree);
    let a = fixed(&mut tree, 10.0, 10.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, a).unwrap();
    tree.update_layout();

    let handle = tree.invalidation_handle();
    handle.invalidate_arrange(a);
    assert!(tree.needs_layout());
    assert!(tree.is_arrange_valid(a));

    tree.reset_stats();
    tree.update_layout();
    assert_eq!(tree.stats().measure_computations, 0);
    assert_eq!(tree.stats().arrange_computations, 1);
    assert_eq!(tree.stats().deferred_invalidations, 0);
}

#[test]
fn e2e_repeated_writes_coalesce() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = stack(&mut tree);
    let a = fixed(&mut tree, 10.0, 10.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, a).unwrap();
    tree.update_layout();

    tree.reset_stats();
    for h in [20.0, 30.0, 40.0] {
        tree.set_height(a, h).unwrap();
    }
    tree.update_layout();
    assert_eq!(tree.final_rect(a).unwrap().height, 40.0);
    assert_eq!(tree.stats().measure_computations, 2);
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn e2e_reparenting_moves_layout() {
    let mut tree = LayoutTree::new(Size::new(200.0, 100.0));
    let root = tree.create_panel(
        Panel::Stack(StackPanel::new(Orientation::Horizontal)),
        LayoutProps::default(),
    );
    let left = stack(&mut tree);
    let right = stack(&mut tree);
    let item = fixed(&mut tree, 30.0, 30.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, left).unwrap();
    tree.append_child(root, right).unwrap();
    tree.append_child(left, item).unwrap();
    tree.update_layout();
    assert_eq!(tree.desired_size(left), Some(Size::new(30.0, 30.0)));

    tree.append_child(right, item).unwrap();
    tree.update_layout();
    assert_eq!(tree.parent(item), Some(right));
    assert_eq!(tree.desired_size(left), Some(Size::ZERO));
    assert_eq!(tree.desired_size(right), Some(Size::new(30.0, 30.0)));
    assert_eq!(tree.screen_rect(item).unwrap().x, 0.0);
    assert_eq!(tree.screen_rect(right).unwrap().x, 0.0);
    assert_eq!(tree.final_rect(right).unwrap().width, 30.0);
}

#[test]
fn e2e_removed_nodes_become_stale() {
    let mut tree = LayoutTree::new(Size::new(100.0, 100.0));
    let root = stack(&mut tree);
    let a = fixed(&mut tree, 10.0, 10.0);
    let b = fixed(&mut tree, 10.0, 10.0);
    tree.set_root(root).unwrap();
    tree.append_child(root, a).unwrap();
    tree.append_child(root, b).unwrap();
    tree.update_layout();

    tree.set_height(a, 50.0).unwrap();
    tree.remove_node(a).unwrap();
    tree.update_layout();

    assert!(!tree.contains(a));
    assert!(matches!(tree.set_height(a, 1.0), Err(LayoutError::UnknownNode(_))));
    assert_eq!(tree.final_rect(b).unwrap().y, 0.0);

    let reused = fixed(&mut tree, 1.0, 1.0);
    assert_eq!(reused.index(), a.index());
    assert_ne!(reused, a);
}

// ============================================================================
// Debugging
// ============================================================================

#[test]
fn e2e_debugger_records_track_solves() {
    let log = JsonlLog::new();
    let mut tree = LayoutTree::new(Size::new(100.0, 50.0));
    tree.debugger_mut().set_enabled(true);
    let root = grid(&mut tree, vec![Track::fixed(80.0), Track::fixed(80.0)], vec![]);
    tree.set_root(root).unwrap();
    tree.update_layout();

    let records: Vec<_> = tree.debugger().records_for(root).collect();
    log.emit(json!({
        "test": "debugger_records_track_solves",
        "records": records.len(),
        "report": tree.debugger().report(),
    }));
    assert_eq!(records.len(), 4);
    assert!(records.iter().any(|r| r.mode == SolveMode::Arrange));

    let overflows = tree.debugger().overflows();
    assert_eq!(overflows.len(), 1);
    assert_eq!(overflows[0].total(), 160.0);
    assert!(tree.debugger().report().contains("Track Solve Report"));
    log.flush("debugger_records_track_solves");
}
