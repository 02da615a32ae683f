//! # Casement UI
//!
//! The window engine proper. A [`Window`] owns:
//!
//! - a [`SceneGraph`] of boxed [`Element`]s in a slotmap arena, ordered by
//!   z-order with insertion order breaking ties, laid out by dock and anchor
//!   rules ([`layout`]);
//! - an [`InputRouter`] holding the hovered, captured and focused ids;
//! - the custom title bar ([`WindowChrome`]) with its system boxes, tab
//!   strip, drag and snap;
//! - a [`RenderPipeline`] that paints through a GPU renderer when one is
//!   available and a retained software backbuffer otherwise.
//!
//! The platform crate drives a window from native events; everything here
//! runs on the loop thread and talks back through [`casement_core::WindowHost`].
//!
//! ```rust
//! use casement_core::{Color, Size};
//! use casement_ui::{Dock, ElementProps, Panel, SceneGraph};
//!
//! let mut scene = SceneGraph::new();
//! let side = scene.insert(None, ElementProps::docked(Dock::Left), Box::new(Panel::new(Color::WHITE)));
//! scene.update_props(side, |p| p.bounds.w = 120.0);
//! scene.perform_layout(casement_core::Rect::from_size(Size::new(400.0, 300.0)));
//! assert_eq!(scene.props(side).unwrap().bounds.h, 300.0);
//! ```

pub mod chrome;
pub mod element;
pub mod layout;
pub mod pipeline;
pub mod router;
pub mod scene;
pub mod widgets;
pub mod window;

pub use chrome::{
    ChromeAction, ChromeOptions, ChromePalette, HotZone, Tab, TabDesign, TabStrip, WindowChrome,
};
pub use element::{Anchor, Dock, Element, ElementId, ElementProps, EventCx, RenderCx, Request};
pub use pipeline::{PipelineStats, RenderPipeline};
pub use router::InputRouter;
pub use scene::SceneGraph;
pub use widgets::{Button, ClickHandler, Panel};
pub use window::Window;

#[cfg(test)]
mod tests;
