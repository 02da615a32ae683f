//! Translation from winit input to Casement events, plus click synthesis.

use std::time::Duration;

use casement_core::{CursorIcon, Key, Modifiers, MouseButton, Point, Rect};
use web_time::Instant;
use winit::keyboard::{Key as WinitKey, NamedKey};

pub const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
pub const DOUBLE_CLICK_SLOP: f32 = 4.0;
/// Pixels per wheel line for touchpads that report pixel deltas.
pub const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Synthesized {
    Click,
    DoubleClick,
}

/// Turns press/release pairs into clicks and double-clicks.
///
/// A press within [`DOUBLE_CLICK_TIME`] and [`DOUBLE_CLICK_SLOP`] of the
/// previous press with the same button counts as the second click. A
/// release close to its press completes a click.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last_press: Option<(Instant, Point, MouseButton)>,
    down: Option<(Point, MouseButton, u8)>,
}

fn near(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= DOUBLE_CLICK_SLOP && (a.y - b.y).abs() <= DOUBLE_CLICK_SLOP
}

impl ClickTracker {
    /// Records a press and returns its click count (1 or 2).
    pub fn press(&mut self, now: Instant, position: Point, button: MouseButton) -> u8 {
        let clicks = match self.last_press {
            Some((at, p, b))
                if b == button
                    && now.saturating_duration_since(at) <= DOUBLE_CLICK_TIME
                    && near(p, position) =>
            {
                2
            }
            _ => 1,
        };
        // a double-click consumes the pair; the next press starts over
        self.last_press = if clicks == 2 {
            None
        } else {
            Some((now, position, button))
        };
        self.down = Some((position, button, clicks));
        clicks
    }

    pub fn release(&mut self, position: Point, button: MouseButton) -> Option<Synthesized> {
        let (p, b, clicks) = self.down.take()?;
        if b != button || !near(p, position) {
            return None;
        }
        Some(if clicks >= 2 {
            Synthesized::DoubleClick
        } else {
            Synthesized::Click
        })
    }

    pub fn cancel(&mut self) {
        self.down = None;
        self.last_press = None;
    }
}

pub fn mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    use winit::event::MouseButton as W;
    match button {
        W::Left => Some(MouseButton::Left),
        W::Right => Some(MouseButton::Right),
        W::Middle => Some(MouseButton::Middle),
        W::Back => Some(MouseButton::Back),
        W::Forward => Some(MouseButton::Forward),
        W::Other(_) => None,
    }
}

pub fn modifiers(state: winit::keyboard::ModifiersState) -> Modifiers {
    Modifiers {
        shift: state.shift_key(),
        ctrl: state.control_key(),
        alt: state.alt_key(),
        meta: state.super_key(),
    }
}

/// Wheel delta in lines, positive scrolling up.
pub fn wheel_lines(delta: winit::event::MouseScrollDelta) -> f32 {
    match delta {
        winit::event::MouseScrollDelta::LineDelta(_, y) => y,
        winit::event::MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
    }
}

pub fn key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(named) => match named {
            NamedKey::Enter => Key::Enter,
            NamedKey::Tab => Key::Tab,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Delete => Key::Delete,
            NamedKey::Escape => Key::Escape,
            NamedKey::ArrowLeft => Key::ArrowLeft,
            NamedKey::ArrowRight => Key::ArrowRight,
            NamedKey::ArrowUp => Key::ArrowUp,
            NamedKey::ArrowDown => Key::ArrowDown,
            NamedKey::Home => Key::Home,
            NamedKey::End => Key::End,
            NamedKey::PageUp => Key::PageUp,
            NamedKey::PageDown => Key::PageDown,
            NamedKey::Space => Key::Space,
            NamedKey::F1 => Key::F(1),
            NamedKey::F2 => Key::F(2),
            NamedKey::F3 => Key::F(3),
            NamedKey::F4 => Key::F(4),
            NamedKey::F5 => Key::F(5),
            NamedKey::F6 => Key::F(6),
            NamedKey::F7 => Key::F(7),
            NamedKey::F8 => Key::F(8),
            NamedKey::F9 => Key::F(9),
            NamedKey::F10 => Key::F(10),
            NamedKey::F11 => Key::F(11),
            NamedKey::F12 => Key::F(12),
            _ => Key::Unidentified,
        },
        WinitKey::Character(s) => match s.chars().next() {
            Some(' ') => Key::Space,
            Some(c) => Key::Character(c),
            None => Key::Unidentified,
        },
        _ => Key::Unidentified,
    }
}

pub fn cursor_icon(icon: CursorIcon) -> winit::window::CursorIcon {
    use winit::window::CursorIcon as W;
    match icon {
        CursorIcon::Default => W::Default,
        CursorIcon::Pointer => W::Pointer,
        CursorIcon::Text => W::Text,
        CursorIcon::Move => W::Move,
        CursorIcon::Wait => W::Wait,
        CursorIcon::NotAllowed => W::NotAllowed,
        CursorIcon::ResizeHorizontal => W::EwResize,
        CursorIcon::ResizeVertical => W::NsResize,
    }
}

/// The monitor rect containing `point`, else the first one.
pub fn monitor_at(monitors: &[Rect], point: Point) -> Option<Rect> {
    monitors
        .iter()
        .copied()
        .find(|m| m.contains(point))
        .or_else(|| monitors.first().copied())
}
