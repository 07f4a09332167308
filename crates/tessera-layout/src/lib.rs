#![forbid(unsafe_code)]

//! Retained-mode layout engine.
//!
//! Every node takes part in a two-pass protocol: **measure** asks a node how
//! big it wants to be given the space available, **arrange** hands it a
//! final rectangle. Panels (canvas, stack, wrap, grid) implement both halves
//! for their children; leaves answer measure from an opaque content oracle.
//!
//! Property writes go through [`LayoutTree`] setters that flip dirty flags
//! and enqueue the node. [`LayoutTree::update_layout`] is the frame
//! boundary: it drains the measure queue top-down, then the arrange queue.
//!
//! # Example
//!
//! ```
//! use tessera_core::{Rect, Size};
//! use tessera_layout::{GridPanel, LayoutProps, LayoutTree, LeafContent, Panel, Track};
//!
//! let mut tree = LayoutTree::new(Size::new(300.0, 100.0));
//! let grid = tree.create_panel(
//!     Panel::Grid(
//!         GridPanel::new().with_columns([Track::proportional(1.0), Track::proportional(2.0)]),
//!     ),
//!     LayoutProps::default(),
//! );
//! let right = tree.create_leaf(LeafContent::Empty, LayoutProps::default().with_grid(0, 1));
//! tree.set_root(grid).unwrap();
//! tree.append_child(grid, right).unwrap();
//! tree.update_layout();
//!
//! assert_eq!(tree.final_rect(right), Some(Rect::new(100.0, 0.0, 200.0, 100.0)));
//! ```

pub mod alignment;
pub mod axis;
pub mod clip;
pub mod config;
pub mod debug;
pub mod error;
pub mod invalidation;
pub mod node;
pub mod panels;
mod protocol;
pub mod stats;
pub mod track;
pub mod tree;
pub mod visual;

pub use alignment::Alignment;
pub use axis::Orientation;
pub use clip::ClipRegion;
pub use config::LayoutConfig;
pub use debug::{LayoutDebugger, TrackSolveRecord};
pub use error::{LayoutError, Result};
pub use invalidation::{InvalidationHandle, InvalidationKind};
pub use node::{
    Affects, CanvasEdges, ContentMeasure, GridPlacement, IndeterminateAxes, LayoutProps,
    LeafContent, NodeId, NodeKind, Visibility,
};
pub use panels::{Cell, GridPanel, Panel, StackPanel, WrapPanel};
pub use stats::LayoutStats;
pub use tessera_core::geometry::{Point, Rect, Size, Thickness};
pub use track::{SolveMode, Track, TrackSize, TrackSolution, solve_tracks};
pub use tree::LayoutTree;
pub use visual::VisualEntry;
