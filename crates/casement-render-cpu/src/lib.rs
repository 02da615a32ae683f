//! Software rendering for Casement windows.
//!
//! [`BackBuffer`] is the retained frame, [`PixmapCanvas`] draws into it with
//! tiny-skia, and [`FontRasterizer`] turns text into coverage with ab_glyph.

pub mod backbuffer;
pub mod canvas;
pub mod text;

pub use backbuffer::{BackBuffer, estimate_bytes};
pub use canvas::PixmapCanvas;
pub use text::{FontRasterizer, LineLayout};
