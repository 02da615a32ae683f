//! Stock elements: a bordered [`Panel`] and a ripple [`Button`].

use std::rc::Rc;

use casement_core::{
    AnimationEngine, AnimationTick, Color, Direction, Easing, Key, KeyEvent, MouseEvent, Point,
    Rect, TextAlign,
};

use crate::chrome::merge_ticks;
use crate::element::{Element, EventCx, RenderCx};

/// Filled, optionally bordered rectangle. Usually a container for docked
/// children.
#[derive(Clone, Debug)]
pub struct Panel {
    pub back: Color,
    pub border: Color,
    pub border_width: f32,
    pub radius: f32,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            back: Color::from_rgb(243, 243, 243),
            border: Color::from_rgb(220, 220, 220),
            border_width: 0.0,
            radius: 0.0,
        }
    }
}

impl Panel {
    pub fn new(back: Color) -> Self {
        Self {
            back,
            ..Self::default()
        }
    }

    pub fn border(mut self, color: Color, width: f32) -> Self {
        self.border = color;
        self.border_width = width;
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

impl Element for Panel {
    fn render(&mut self, cx: &mut RenderCx<'_>) {
        let r = cx.bounds();
        let radius = self.radius * cx.scale;
        cx.canvas.fill_rect(r, self.back, radius);
        if self.border_width > 0.0 {
            let w = self.border_width * cx.scale;
            let inset = Rect::new(r.x + w / 2.0, r.y + w / 2.0, r.w - w, r.h - w);
            cx.canvas.stroke_rect(inset, self.border, w, radius);
        }
    }
}

pub type ClickHandler = Rc<dyn Fn()>;

const BUTTON_RADIUS: f32 = 6.0;
const BUTTON_FONT: f32 = 12.0;

/// Push button with a hover fade and concurrent click ripples.
///
/// A transparent `back` draws the hover overlay in the text colour.
pub struct Button {
    pub text: String,
    pub back: Color,
    pub fore: Color,
    pub radius: f32,
    hover: AnimationEngine,
    ripple: AnimationEngine,
    on_click: Option<ClickHandler>,
}

impl Button {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            back: Color::from_rgb(0, 120, 215),
            fore: Color::WHITE,
            radius: BUTTON_RADIUS,
            hover: AnimationEngine::new(0.07, Easing::Linear),
            ripple: AnimationEngine::new(0.03, Easing::EaseOut).singular(false),
            on_click: None,
        }
    }

    pub fn colors(mut self, back: Color, fore: Color) -> Self {
        self.back = back;
        self.fore = fore;
        self
    }

    pub fn on_click(mut self, handler: impl Fn() + 'static) -> Self {
        self.on_click = Some(Rc::new(handler));
        self
    }

    pub fn hover_progress(&self) -> f32 {
        self.hover.progress()
    }

    /// Ripples still expanding.
    pub fn ripple_count(&self) -> usize {
        self.ripple.count()
    }

    fn fire(&mut self, origin: Point, cx: &mut EventCx) {
        self.ripple.start_at(Direction::In, origin);
        if let Some(handler) = &self.on_click {
            handler();
        }
        cx.invalidate();
    }
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button")
            .field("text", &self.text)
            .field("hover", &self.hover.progress())
            .field("ripples", &self.ripple.count())
            .finish_non_exhaustive()
    }
}

impl Element for Button {
    fn render(&mut self, cx: &mut RenderCx<'_>) {
        let r = cx.bounds();
        let radius = self.radius * cx.scale;
        cx.canvas.fill_rect(r, self.back, radius);

        let hp = self.hover.progress();
        if hp > 0.0 {
            let overlay = if self.back.3 == 0 {
                self.fore.with_alpha((hp * self.fore.3 as f32) as u8)
            } else {
                self.fore.with_alpha((hp * 65.0) as u8)
            };
            cx.canvas.fill_rect(r, overlay, radius);
        }

        for i in 0..self.ripple.count() {
            let Some(origin) = self.ripple.origin_at(i) else {
                continue;
            };
            let p = self.ripple.progress_at(i);
            let alpha = (101.0 - p * 100.0).clamp(0.0, 255.0) as u8;
            let diameter = p * r.w * 2.0;
            cx.canvas
                .fill_circle(origin, diameter / 2.0, self.back.with_alpha(alpha));
        }

        let fore = if cx.enabled {
            self.fore
        } else {
            self.fore.fade(0.5)
        };
        cx.canvas
            .draw_text(&self.text, r, BUTTON_FONT * cx.scale, fore, TextAlign::Center);
        if cx.focused {
            cx.canvas.stroke_rect(r, fore.fade(0.6), cx.scale, radius);
        }
    }

    fn animate(&mut self) -> AnimationTick {
        merge_ticks(self.hover.tick(), self.ripple.tick())
    }

    fn on_mouse_enter(&mut self, cx: &mut EventCx) {
        self.hover.start(Direction::In);
        cx.invalidate();
    }

    fn on_mouse_leave(&mut self, cx: &mut EventCx) {
        self.hover.start(Direction::Out);
        cx.invalidate();
    }

    fn on_click(&mut self, e: &MouseEvent, cx: &mut EventCx) {
        if e.is_left() {
            self.fire(e.position, cx);
        }
    }

    fn on_key_down(&mut self, e: &KeyEvent, cx: &mut EventCx) {
        if matches!(e.key, Key::Enter | Key::Space) {
            let size = cx.size();
            self.fire(Point::new(size.width / 2.0, size.height / 2.0), cx);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use casement_core::{Modifiers, MouseButton};
    use slotmap::SlotMap;

    use super::*;
    use crate::element::ElementId;

    fn cx() -> EventCx {
        let mut ids: SlotMap<ElementId, ()> = SlotMap::with_key();
        EventCx::new(ids.insert(()), casement_core::Size::new(100.0, 30.0), 1.0)
    }

    #[test]
    fn click_runs_handler_and_adds_ripples() {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mut button = Button::new("OK").on_click(move || counter.set(counter.get() + 1));
        let mut cx = cx();

        let e = MouseEvent::button(Point::new(10.0, 10.0), MouseButton::Left);
        Element::on_click(&mut button, &e, &mut cx);
        Element::on_click(&mut button, &e, &mut cx);
        assert_eq!(clicks.get(), 2);
        assert_eq!(button.ripple_count(), 2);

        let right = MouseEvent::button(Point::new(10.0, 10.0), MouseButton::Right);
        Element::on_click(&mut button, &right, &mut cx);
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn ripples_finish_and_drop() {
        let mut button = Button::new("OK");
        let mut cx = cx();
        Element::on_click(
            &mut button,
            &MouseEvent::button(Point::ZERO, MouseButton::Left),
            &mut cx,
        );
        let mut ticks = 0;
        while button.animate() == AnimationTick::Progressed {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(button.ripple_count(), 0);
        assert_eq!(button.animate(), AnimationTick::Idle);
    }

    #[test]
    fn hover_fades_in_and_out() {
        let mut button = Button::new("OK");
        let mut cx = cx();
        button.on_mouse_enter(&mut cx);
        for _ in 0..5 {
            button.animate();
        }
        let mid = button.hover_progress();
        assert!(mid > 0.3 && mid < 0.4, "{mid}");

        button.on_mouse_leave(&mut cx);
        button.animate();
        assert!(button.hover_progress() < mid);
    }

    #[test]
    fn enter_key_activates() {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mut button = Button::new("OK").on_click(move || counter.set(counter.get() + 1));
        let mut cx = cx();
        let key = KeyEvent {
            key: Key::Enter,
            modifiers: Modifiers::default(),
            is_repeat: false,
        };
        button.on_key_down(&key, &mut cx);
        assert_eq!(clicks.get(), 1);
        assert_eq!(button.ripple.origin_at(0), Some(Point::new(50.0, 15.0)));
    }
}
