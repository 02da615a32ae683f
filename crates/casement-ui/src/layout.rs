//! Dock / Anchor layout.
//!
//! Siblings are laid out in reverse insertion order: the last element added
//! docks first and takes the outermost strip. `Fill` takes whatever is left
//! without consuming it, so several `Fill` siblings overlap.

use casement_core::{Rect, Size};

use crate::element::{Anchor, Dock};

/// Bounds for a docked element of `current` size, shrinking `remaining` by
/// the strip it consumes. `None` for [`Dock::None`].
pub fn dock_rect(dock: Dock, current: Size, remaining: &mut Rect) -> Option<Rect> {
    let r = *remaining;
    let rect = match dock {
        Dock::None => return None,
        Dock::Top => {
            let h = current.height.min(r.h).max(0.0);
            *remaining = Rect::new(r.x, r.y + h, r.w, r.h - h);
            Rect::new(r.x, r.y, r.w, current.height)
        }
        Dock::Bottom => {
            let h = current.height.min(r.h).max(0.0);
            *remaining = Rect::new(r.x, r.y, r.w, r.h - h);
            Rect::new(r.x, r.bottom() - current.height, r.w, current.height)
        }
        Dock::Left => {
            let w = current.width.min(r.w).max(0.0);
            *remaining = Rect::new(r.x + w, r.y, r.w - w, r.h);
            Rect::new(r.x, r.y, current.width, r.h)
        }
        Dock::Right => {
            let w = current.width.min(r.w).max(0.0);
            *remaining = Rect::new(r.x, r.y, r.w - w, r.h);
            Rect::new(r.right() - current.width, r.y, current.width, r.h)
        }
        Dock::Fill => r,
    };
    Some(rect)
}

/// Bounds of an element placed at `bounds` while its parent's client
/// rectangle was `reference`, now that the client is `client`. Only the
/// result is clamped, so any shrink followed by a regrow is lossless.
pub fn anchor_rect(anchor: Anchor, bounds: Rect, reference: Rect, client: Rect) -> Rect {
    let dw = client.w - reference.w;
    let dh = client.h - reference.h;
    let (x, w) = axis(
        anchor.contains(Anchor::LEFT),
        anchor.contains(Anchor::RIGHT),
        bounds.x,
        bounds.w,
        dw,
    );
    let (y, h) = axis(
        anchor.contains(Anchor::TOP),
        anchor.contains(Anchor::BOTTOM),
        bounds.y,
        bounds.h,
        dh,
    );
    Rect::new(x, y, w, h)
}

fn axis(near: bool, far: bool, pos: f32, len: f32, delta: f32) -> (f32, f32) {
    match (near, far) {
        (true, true) => (pos, (len + delta).max(0.0)),
        (true, false) => (pos, len),
        (false, true) => (pos + delta, len),
        // keep the centre
        (false, false) => (pos + delta * 0.5, len),
    }
}
