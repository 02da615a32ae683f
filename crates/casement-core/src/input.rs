use crate::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool, // Cmd on Mac, Win key on Windows
}

/// A pointer event in the receiver's coordinate space.
///
/// The router creates the window-space event and hands each element a copy
/// shifted into its own local space through [`MouseEvent::translated`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseEvent {
    pub position: Point,
    /// Button that changed state; `None` for moves, enter/leave and wheel.
    pub button: Option<MouseButton>,
    /// 1 for a click, 2 for a double-click.
    pub clicks: u8,
    /// Vertical wheel delta in lines (positive scrolls up).
    pub wheel_delta: f32,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn moved(position: Point) -> Self {
        Self {
            position,
            button: None,
            clicks: 0,
            wheel_delta: 0.0,
            modifiers: Modifiers::default(),
        }
    }

    pub fn button(position: Point, button: MouseButton) -> Self {
        Self {
            button: Some(button),
            clicks: 1,
            ..Self::moved(position)
        }
    }

    pub fn wheel(position: Point, delta: f32) -> Self {
        Self {
            wheel_delta: delta,
            ..Self::moved(position)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_clicks(mut self, clicks: u8) -> Self {
        self.clicks = clicks;
        self
    }

    /// The same event expressed relative to `origin`.
    pub fn translated(&self, origin: Point) -> Self {
        Self {
            position: Point::new(self.position.x - origin.x, self.position.y - origin.y),
            ..*self
        }
    }

    pub fn is_left(&self) -> bool {
        self.button == Some(MouseButton::Left)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Space,
    F(u8), // F1-F12
    Unidentified,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub is_repeat: bool,
}
