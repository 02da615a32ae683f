//! # Casement core
//!
//! Shared vocabulary for the Casement window engine:
//!
//! - geometry (`Point`, `Size`, `Rect`, `Insets`) and `Color`;
//! - mouse and keyboard events as elements receive them;
//! - the tick-driven [`AnimationEngine`] behind hover, ripple and tab
//!   transitions;
//! - the render API: the immediate-mode [`Canvas`], the recorded [`Scene`]
//!   consumed by GPU renderers, and the traits a backend implements;
//! - [`WindowHost`], the services the native window offers the engine;
//! - [`RenderConfig`] and [`RenderError`].
//!
//! ```rust
//! use casement_core::*;
//!
//! let mut fade = AnimationEngine::hover();
//! fade.start(Direction::In);
//! while fade.tick() == AnimationTick::Progressed {}
//! assert_eq!(fade.progress(), 1.0);
//! ```

pub mod animation;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod input;
pub mod render_api;
mod tests;

pub use animation::*;
pub use color::*;
pub use config::*;
pub use error::*;
pub use geometry::*;
pub use host::*;
pub use input::*;
pub use render_api::*;
