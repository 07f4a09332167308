#![forbid(unsafe_code)]

//! Core: geometry shared across the Tessera presentation stack.
//!
//! # Role in Tessera
//! `tessera-core` is the vocabulary crate. The layout engine
//! (`tessera-layout`) produces [`geometry::Rect`] values; the renderer and
//! hit-testing collaborators consume them read-only.

pub mod geometry;

pub use geometry::{Point, Rect, Size, Thickness};
