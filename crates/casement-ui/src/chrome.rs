//! Title bar: system boxes, tab strip, window drag and maximize/restore.
//!
//! Geometry is in physical window pixels; every metric in
//! [`ChromeOptions`] is logical and multiplied by the window scale.

use std::collections::VecDeque;

use casement_core::{
    AnimationEngine, AnimationTick, Canvas, Color, Direction, Insets, MouseButton, Point, Rect,
    Size, TextAlign, TextMeasurer, WindowHost,
};

use crate::element::ElementId;

const TAB_HEADER_PADDING: f32 = 9.0;
const TAB_INDICATOR_HEIGHT: f32 = 3.0;
const TAB_MAX_WIDTH: f32 = 250.0;
const TAB_STRIP_START: f32 = 44.0;
const TITLE_FONT: f32 = 12.0;
const CLOSE_HOVER: Color = Color::from_rgb(232, 17, 35);
const DEFAULT_RESTORE: Size = Size::new(800.0, 600.0);
const MIN_TITLE_HEIGHT: f32 = 31.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TabDesign {
    #[default]
    Rectangle,
    Rounded,
    Chromed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChromeOptions {
    pub title: String,
    pub show_title: bool,
    pub title_height: f32,
    pub icon_width: f32,
    /// Close box; without it no system box is shown.
    pub control_box: bool,
    pub maximize_box: bool,
    pub minimize_box: bool,
    pub extend_box: bool,
    pub form_menu: bool,
    pub tab_design: TabDesign,
    pub tab_close_button: bool,
    pub new_tab_button: bool,
    pub movable: bool,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            show_title: true,
            title_height: 32.0,
            icon_width: 42.0,
            control_box: true,
            maximize_box: true,
            minimize_box: true,
            extend_box: false,
            form_menu: false,
            tab_design: TabDesign::Rectangle,
            tab_close_button: false,
            new_tab_button: false,
            movable: true,
        }
    }
}

impl ChromeOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Title bars shorter than 31 px are raised to 31.
    pub fn with_title_height(mut self, height: f32) -> Self {
        self.title_height = height.max(MIN_TITLE_HEIGHT);
        self
    }

    /// A maximize box implies a minimize box.
    pub fn with_maximize_box(mut self, on: bool) -> Self {
        self.maximize_box = on;
        if on {
            self.minimize_box = true;
        }
        self
    }

    /// Dropping the minimize box drops the maximize box too.
    pub fn with_minimize_box(mut self, on: bool) -> Self {
        self.minimize_box = on;
        if !on {
            self.maximize_box = false;
        }
        self
    }

    pub fn with_tab_design(mut self, design: TabDesign) -> Self {
        self.tab_design = design;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChromePalette {
    pub back: Color,
    pub fore: Color,
    pub border: Color,
    /// Solid title bar colour; text switches to a contrasting colour.
    pub title: Option<Color>,
    pub indicator: Color,
}

impl Default for ChromePalette {
    fn default() -> Self {
        Self {
            back: Color::from_rgb(245, 245, 245),
            fore: Color::from_rgb(30, 30, 30),
            border: Color::from_rgb(218, 218, 218),
            title: None,
            indicator: Color::from_rgb(30, 144, 255),
        }
    }
}

impl ChromePalette {
    pub fn dark() -> Self {
        Self {
            back: Color::from_rgb(30, 30, 30),
            fore: Color::from_rgb(224, 224, 224),
            border: Color::from_rgb(60, 60, 60),
            ..Default::default()
        }
    }
}

/// Chrome areas with their own hover animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HotZone {
    Close,
    Maximize,
    Minimize,
    Extend,
    FormMenu,
    TabClose,
    NewTab,
}

impl HotZone {
    pub const ALL: [HotZone; 7] = [
        HotZone::Close,
        HotZone::Maximize,
        HotZone::Minimize,
        HotZone::Extend,
        HotZone::FormMenu,
        HotZone::TabClose,
        HotZone::NewTab,
    ];
}

/// Something the user did to the chrome, queued for the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChromeAction {
    Close,
    Minimize,
    ToggleMaximize,
    ExtendBox,
    FormMenu,
    CloseTab(usize),
    NewTab,
    SelectTab {
        index: usize,
        previous: Option<usize>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tab {
    pub title: String,
    /// Element shown while this tab is selected.
    pub page: Option<ElementId>,
}

/// Tabs drawn in the title bar, with the sliding selection indicator.
#[derive(Debug)]
pub struct TabStrip {
    tabs: Vec<Tab>,
    selected: Option<usize>,
    previous: Option<usize>,
    rects: Vec<Rect>,
    page_anim: AnimationEngine,
}

impl Default for TabStrip {
    fn default() -> Self {
        Self {
            tabs: Vec::new(),
            selected: None,
            previous: None,
            rects: Vec::new(),
            page_anim: AnimationEngine::page_transition(),
        }
    }
}

impl TabStrip {
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// The first tab added becomes the selection.
    pub fn push(&mut self, title: impl Into<String>, page: Option<ElementId>) -> usize {
        self.tabs.push(Tab {
            title: title.into(),
            page,
        });
        if self.tabs.len() == 1 {
            self.selected = Some(0);
        }
        self.tabs.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Tab> {
        if index >= self.tabs.len() {
            return None;
        }
        let tab = self.tabs.remove(index);
        self.previous = None;
        self.selected = match self.selected {
            _ if self.tabs.is_empty() => None,
            Some(s) if s >= self.tabs.len() => Some(self.tabs.len() - 1),
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        self.page_anim.reset();
        Some(tab)
    }

    /// Selects `index`, wrapping out-of-range values around. Returns the
    /// index actually selected and the previous selection when it changed.
    pub fn select(&mut self, index: isize, origin: Point) -> Option<(usize, Option<usize>)> {
        if self.tabs.is_empty() {
            return None;
        }
        let len = self.tabs.len() as isize;
        let index = if index < 0 {
            len - 1
        } else if index >= len {
            0
        } else {
            index
        } as usize;
        if self.selected == Some(index) {
            return None;
        }
        let previous = self.selected.replace(index);
        self.previous = previous;
        self.page_anim.set_progress(0.0);
        self.page_anim.start_at(Direction::In, origin);
        Some((index, previous))
    }

    /// Pages of every tab with whether they should be visible.
    pub fn page_visibility(&self) -> impl Iterator<Item = (ElementId, bool)> + '_ {
        self.tabs
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.page.map(|p| (p, Some(i) == self.selected)))
    }

    /// Selection highlight, sliding from the previous tab while the page
    /// animation runs.
    pub fn indicator(&self) -> Option<Rect> {
        let active = *self.rects.get(self.selected?)?;
        let prev = self
            .previous
            .and_then(|p| self.rects.get(p).copied())
            .unwrap_or(active);
        let t = self.page_anim.progress();
        Some(Rect::new(
            prev.x + (active.x - prev.x) * t,
            active.y,
            prev.w + (active.w - prev.w) * t,
            active.h,
        ))
    }

    fn layout(
        &mut self,
        start: f32,
        available: f32,
        title_height: f32,
        scale: f32,
        with_close: bool,
        text: &dyn TextMeasurer,
    ) {
        self.rects.clear();
        if self.tabs.is_empty() {
            return;
        }
        let desired: Vec<f32> = self
            .tabs
            .iter()
            .map(|t| {
                let mut w = text.measure(&t.title, TITLE_FONT * scale).width + 20.0 * scale;
                if with_close {
                    w += 24.0 * scale;
                }
                w
            })
            .collect();
        let total: f32 = desired.iter().sum();
        let (factor, extra) = if total > available && total > 0.0 {
            (available.max(0.0) / total, 0.0)
        } else {
            (1.0, (available - total) / desired.len() as f32)
        };
        let max = TAB_MAX_WIDTH * scale;
        let mut x = start;
        for d in desired {
            let w = (d * factor + extra).min(max);
            self.rects.push(Rect::new(x, 0.0, w, title_height));
            x += w;
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    start_location: Point,
    mouse_offset: Point,
    moved: bool,
}

/// The custom title bar of a window.
#[derive(Debug)]
pub struct WindowChrome {
    pub options: ChromeOptions,
    pub palette: ChromePalette,
    pub tabs: TabStrip,
    size: Size,
    scale: f32,
    boxes: [Option<Rect>; 5],
    hover: [bool; 7],
    hover_anim: [AnimationEngine; 7],
    maximized: bool,
    restore: Option<Rect>,
    drag: Option<DragState>,
    last_drag_moved: bool,
    actions: VecDeque<ChromeAction>,
}

impl WindowChrome {
    pub fn new(options: ChromeOptions) -> Self {
        Self {
            options,
            palette: ChromePalette::default(),
            tabs: TabStrip::default(),
            size: Size::default(),
            scale: 1.0,
            boxes: [None; 5],
            hover: [false; 7],
            hover_anim: std::array::from_fn(|_| AnimationEngine::hover()),
            maximized: false,
            restore: None,
            drag: None,
            last_drag_moved: false,
            actions: VecDeque::new(),
        }
    }

    pub fn title_height(&self) -> f32 {
        if self.options.show_title {
            self.options.title_height.max(MIN_TITLE_HEIGHT) * self.scale
        } else {
            0.0
        }
    }

    /// Space the chrome reserves around the element area.
    pub fn client_insets(&self) -> Insets {
        Insets::new(0.0, self.title_height(), 0.0, 0.0)
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_hovered(&self, zone: HotZone) -> bool {
        self.hover[zone as usize]
    }

    pub fn hover_progress(&self, zone: HotZone) -> f32 {
        self.hover_anim[zone as usize].progress()
    }

    pub fn take_actions(&mut self) -> Vec<ChromeAction> {
        self.actions.drain(..).collect()
    }

    /// Recomputes system box and tab geometry for a window of `size`.
    pub fn layout(&mut self, size: Size, scale: f32, text: &dyn TextMeasurer) {
        self.size = size;
        self.scale = scale;
        self.boxes = [None; 5];
        let th = self.title_height();
        let iw = self.options.icon_width * scale;
        let o = &self.options;

        if o.show_title && o.control_box {
            let close = Rect::new(size.width - iw, 0.0, iw, th);
            let max = o
                .maximize_box
                .then(|| Rect::new(close.x - iw, 0.0, iw, th));
            let anchor = max.unwrap_or(close);
            let min = o
                .minimize_box
                .then(|| Rect::new(anchor.x - iw - 2.0, 0.0, iw, th));
            let extend = o.extend_box.then(|| {
                let left_of = min.unwrap_or(close);
                Rect::new(left_of.x - iw - 2.0, 0.0, iw, th)
            });
            self.boxes[HotZone::Close as usize] = Some(close);
            self.boxes[HotZone::Maximize as usize] = max;
            self.boxes[HotZone::Minimize as usize] = min;
            self.boxes[HotZone::Extend as usize] = extend;
        }
        if o.show_title && o.form_menu {
            let s = 24.0 * scale;
            self.boxes[HotZone::FormMenu as usize] = Some(Rect::new(10.0, th / 2.0 - s / 2.0, s, s));
        }

        let occupied = TAB_STRIP_START * scale
            + self.boxes[..4]
                .iter()
                .flatten()
                .map(|r| r.w)
                .sum::<f32>()
            + 30.0 * scale;
        let with_close = self.options.tab_close_button;
        self.tabs.layout(
            TAB_STRIP_START * scale,
            size.width - occupied,
            th,
            scale,
            with_close,
            text,
        );
    }

    /// Current rectangle of a hot zone, if the zone exists.
    pub fn zone_rect(&self, zone: HotZone) -> Option<Rect> {
        let s = self.scale;
        let th = self.title_height();
        match zone {
            HotZone::TabClose => {
                if !self.options.tab_close_button || !self.options.show_title {
                    return None;
                }
                let ind = self.tabs.indicator()?;
                let size = 20.0 * s;
                Some(Rect::new(
                    ind.right() - (TAB_HEADER_PADDING / 2.0).floor() - size,
                    th / 2.0 - size / 2.0,
                    size,
                    size,
                ))
            }
            HotZone::NewTab => {
                if !self.options.new_tab_button || !self.options.show_title {
                    return None;
                }
                let last = *self.tabs.rects.last()?;
                let size = 24.0 * s;
                Some(Rect::new(
                    last.right() + size / 2.0,
                    th / 2.0 - size / 2.0,
                    size,
                    size,
                ))
            }
            other => self.boxes[other as usize],
        }
    }

    pub fn zone_at(&self, p: Point) -> Option<HotZone> {
        HotZone::ALL
            .into_iter()
            .find(|z| self.zone_rect(*z).is_some_and(|r| r.contains(p)))
    }

    pub fn in_title(&self, p: Point) -> bool {
        self.options.show_title && p.y >= 0.0 && p.y <= self.title_height()
    }

    /// Updates hot-zone hover flags; `true` if any flag changed.
    pub fn update_hover(&mut self, p: Point) -> bool {
        let mut changed = false;
        for zone in HotZone::ALL {
            let inside = self.zone_rect(zone).is_some_and(|r| r.contains(p));
            changed |= self.set_hover(zone, inside);
        }
        changed
    }

    pub fn clear_hover(&mut self) -> bool {
        let mut changed = false;
        for zone in HotZone::ALL {
            changed |= self.set_hover(zone, false);
        }
        changed
    }

    fn set_hover(&mut self, zone: HotZone, inside: bool) -> bool {
        let i = zone as usize;
        if self.hover[i] == inside {
            return false;
        }
        self.hover[i] = inside;
        self.hover_anim[i].start(if inside { Direction::In } else { Direction::Out });
        true
    }

    pub fn is_animating(&self) -> bool {
        self.tabs.page_anim.is_running() || self.hover_anim.iter().any(|a| a.is_running())
    }

    pub fn animate(&mut self) -> AnimationTick {
        let mut tick = self.tabs.page_anim.tick();
        for anim in &mut self.hover_anim {
            tick = merge_ticks(tick, anim.tick());
        }
        tick
    }

    /// Starts a window drag on the empty title area. Returns `true` when a
    /// drag began.
    pub fn mouse_down(&mut self, p: Point, button: Option<MouseButton>, host: &dyn WindowHost) -> bool {
        self.last_drag_moved = false;
        if self.zone_at(p).is_some() || !self.in_title(p) {
            return false;
        }
        if button != Some(MouseButton::Left) || !self.options.movable {
            return false;
        }
        let Some(cursor) = host.cursor_screen_position() else {
            return false;
        };
        self.drag = Some(DragState {
            start_location: host.outer_bounds().origin(),
            mouse_offset: cursor,
            moved: false,
        });
        host.set_capture();
        true
    }

    /// Moves the window with the cursor while dragging. Returns `true` when
    /// a drag is in progress.
    pub fn drag_move(&mut self, host: &dyn WindowHost) -> bool {
        let Some(mut drag) = self.drag else {
            return false;
        };
        let Some(cursor) = host.cursor_screen_position() else {
            return true;
        };
        if cursor == drag.mouse_offset && !drag.moved {
            return true;
        }
        if self.maximized {
            let maximized = host.outer_bounds();
            let restored = self.show_maximize(host, None);
            if maximized.w > 0.0 {
                let ratio = 1.0 - restored.w / maximized.w;
                drag.mouse_offset.x -= (drag.mouse_offset.x - maximized.x) * ratio;
            }
        }
        let x = drag.start_location.x - (drag.mouse_offset.x - cursor.x);
        let y = drag.start_location.y - (drag.mouse_offset.y - cursor.y);
        host.set_outer_position(Point::new(x, y));
        drag.moved = true;
        self.drag = Some(drag);
        true
    }

    /// Ends a drag: snaps to maximized at the top of the work area,
    /// otherwise keeps the title bar reachable.
    pub fn mouse_up(&mut self, host: &dyn WindowHost) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        self.last_drag_moved = drag.moved;
        let cursor = host
            .cursor_screen_position()
            .unwrap_or(drag.mouse_offset);
        let work = host.work_area_at(cursor);
        if drag.moved && cursor.y <= work.y && self.options.maximize_box && !self.maximized {
            self.show_maximize(host, Some(drag.start_location));
        } else if !self.maximized {
            let at = host.outer_bounds().origin();
            let mut clamped = at;
            clamped.x = clamped.x.max(work.x);
            clamped.y = clamped.y.min(work.bottom() - self.title_height());
            if clamped != at {
                host.set_outer_position(clamped);
            }
        }
        host.release_capture();
        true
    }

    /// Maximizes onto the work area under the cursor, or restores the
    /// remembered bounds. Returns the bounds applied.
    pub fn show_maximize(&mut self, host: &dyn WindowHost, restore_location: Option<Point>) -> Rect {
        let outer = host.outer_bounds();
        let cursor = host.cursor_screen_position().unwrap_or(outer.center());
        let work = host.work_area_at(cursor);
        let bounds = if self.maximized {
            let r = self.restore.unwrap_or_default();
            let size = if r.size().is_empty() {
                Size::new(DEFAULT_RESTORE.width * self.scale, DEFAULT_RESTORE.height * self.scale)
            } else {
                r.size()
            };
            let origin = if r.origin() == Point::ZERO {
                Point::new(
                    work.x + (work.w - size.width) / 2.0,
                    work.y + (work.h - size.height) / 2.0,
                )
            } else {
                r.origin()
            };
            self.maximized = false;
            Rect::new(origin.x, origin.y, size.width, size.height)
        } else {
            let origin = restore_location.unwrap_or(outer.origin());
            self.restore = Some(Rect::new(origin.x, origin.y, outer.w, outer.h));
            self.maximized = true;
            work
        };
        host.set_outer_bounds(bounds);
        log::debug!("chrome: maximized={} bounds={bounds:?}", self.maximized);
        bounds
    }

    /// Double-click on the empty title area toggles maximize.
    pub fn double_click(&mut self, p: Point) -> bool {
        if !self.options.maximize_box || self.zone_at(p).is_some() || !self.in_title(p) {
            return false;
        }
        self.actions.push_back(ChromeAction::ToggleMaximize);
        true
    }

    /// Resolves a click on the chrome into queued actions. Returns `true`
    /// when the click hit a box or a tab.
    pub fn click(&mut self, p: Point, button: Option<MouseButton>) -> bool {
        if let Some(zone) = self.zone_at(p) {
            let action = match zone {
                HotZone::Close => ChromeAction::Close,
                HotZone::Maximize => ChromeAction::ToggleMaximize,
                HotZone::Minimize => ChromeAction::Minimize,
                HotZone::Extend => ChromeAction::ExtendBox,
                HotZone::FormMenu => ChromeAction::FormMenu,
                HotZone::TabClose => match self.tabs.selected {
                    Some(i) => ChromeAction::CloseTab(i),
                    None => return false,
                },
                HotZone::NewTab => ChromeAction::NewTab,
            };
            self.set_hover(zone, false);
            self.actions.push_back(action);
            return true;
        }
        if self.last_drag_moved {
            return false;
        }
        let Some(index) = self.tabs.rects.iter().position(|r| r.contains(p)) else {
            return false;
        };
        if let Some((index, previous)) = self.tabs.select(index as isize, p) {
            self.actions
                .push_back(ChromeAction::SelectTab { index, previous });
        }
        if self.options.tab_close_button && button == Some(MouseButton::Middle) {
            self.actions.push_back(ChromeAction::CloseTab(index));
        }
        true
    }

    pub fn paint(&self, canvas: &mut dyn Canvas) {
        let pal = &self.palette;
        canvas.clear(pal.back.opaque());
        if !self.options.show_title {
            return;
        }
        let s = self.scale;
        let w = self.size.width;
        let th = self.title_height();
        let line = 1.1 * s;

        let (fore, hover) = match pal.title {
            Some(title) => {
                canvas.fill_rect(Rect::new(0.0, 0.0, w, th), title, 0.0);
                let fore = if title.is_dark() { Color::WHITE } else { Color::BLACK };
                (fore, fore.with_alpha(20))
            }
            None => (pal.fore, pal.border),
        };
        let alpha = |zone: HotZone, max: f32| (self.hover_progress(zone) * max) as u8;

        if let Some(r) = self.zone_rect(HotZone::Close) {
            let a = alpha(HotZone::Close, 120.0);
            if a > 0 {
                canvas.fill_rect(r, CLOSE_HOVER.with_alpha(a), 0.0);
            }
            let color = if self.is_hovered(HotZone::Close) { Color::WHITE } else { fore };
            cross(canvas, r.center(), 5.0 * s, color, line);
        }

        if let Some(r) = self.zone_rect(HotZone::Maximize) {
            let a = alpha(HotZone::Maximize, 80.0);
            if a > 0 {
                canvas.fill_rect(r, hover.with_alpha(a), 0.0);
            }
            let c = r.center();
            let size = 5.0 * s;
            if self.maximized {
                let off = 2.0 * s;
                let sq = Rect::new(c.x - size, c.y - size, size * 2.0, size * 2.0);
                canvas.stroke_rect(sq.translate(off, -off), fore, line, 0.0);
                canvas.stroke_rect(sq.translate(-off, off), fore, line, 0.0);
            } else {
                canvas.stroke_rect(
                    Rect::new(c.x - size, c.y - size, size * 2.0, size * 2.0),
                    fore,
                    line,
                    0.0,
                );
            }
        }

        if let Some(r) = self.zone_rect(HotZone::Minimize) {
            let a = alpha(HotZone::Minimize, 80.0);
            if a > 0 {
                canvas.fill_rect(r, hover.with_alpha(a), 0.0);
            }
            let c = r.center();
            let size = 5.0 * s;
            canvas.draw_line(Point::new(c.x - size, c.y), Point::new(c.x + size, c.y), fore, line);
        }

        if let Some(r) = self.zone_rect(HotZone::Extend) {
            let a = alpha(HotZone::Extend, 60.0);
            let size = 24.0 * s;
            if a > 0 {
                let bg = Rect::new(r.x + 20.0 * s, th / 2.0 - size / 2.0, size, size);
                canvas.fill_rect(bg, hover.with_alpha(a), 15.0);
            }
            let icon = 16.0 * s;
            let c = Point::new(r.x + 24.0 * s + icon / 2.0, th / 2.0);
            chevron(canvas, c, s, fore, line);
        }

        let menu = self.zone_rect(HotZone::FormMenu);
        if let Some(r) = menu {
            let a = alpha(HotZone::FormMenu, 60.0);
            if a > 0 {
                canvas.fill_rect(r, hover.with_alpha(a), 10.0);
            }
            chevron(canvas, r.center(), s, fore, line);
        }

        if self.tabs.is_empty() {
            let x = match menu {
                Some(m) => m.right() + 8.0 * s,
                None => 16.0 * s + 14.0 * s,
            };
            canvas.draw_text(
                &self.options.title,
                Rect::new(x, 0.0, (w - x).max(0.0), th),
                TITLE_FONT * s,
                fore,
                TextAlign::Left,
            );
        } else {
            self.paint_tabs(canvas, fore, hover);
        }

        canvas.draw_line(Point::new(w, th - 1.0), Point::new(0.0, th - 1.0), pal.border, 1.0);
    }

    fn paint_tabs(&self, canvas: &mut dyn Canvas, fore: Color, hover: Color) {
        let s = self.scale;
        let th = self.title_height();
        let line = 1.1 * s;
        let tabs = &self.tabs;
        let selected = tabs.selected.and_then(|i| tabs.rects.get(i).copied());
        let progress = tabs.page_anim.progress();

        if let (Some(active), Some(ind)) = (selected, tabs.indicator()) {
            match self.options.tab_design {
                TabDesign::Rectangle => {
                    let fill = self.palette.back.lerp(hover, 0.15);
                    canvas.fill_rect(Rect::new(active.x, 0.0, ind.w, th), fill, 0.0);
                    canvas.fill_rect(Rect::new(ind.x, 0.0, ind.w, th), fill, 0.0);
                    canvas.fill_rect(
                        Rect::new(ind.x, th - TAB_INDICATOR_HEIGHT, ind.w, TAB_INDICATOR_HEIGHT),
                        self.palette.indicator,
                        0.0,
                    );
                }
                TabDesign::Rounded => {
                    let fill = self.palette.back.lerp(hover, 0.2);
                    canvas.fill_rect(Rect::new(ind.x, 6.0, ind.w, th - 6.0), fill, 9.0 * s);
                }
                TabDesign::Chromed => {
                    let fill = self.palette.back.lerp(hover, 0.2);
                    canvas.fill_rect(Rect::new(ind.x, 5.0, ind.w, th - 12.0), fill, 12.0);
                }
            }
        }

        if tabs.page_anim.is_running()
            && let (Some(sel), Some(origin)) = (selected, tabs.page_anim.origin_at(0))
        {
            let d = progress * sel.w * 1.75;
            let a = (31.0 - progress * 30.0).max(0.0) as u8;
            canvas.push_clip(sel);
            canvas.fill_circle(origin, d / 2.0, fore.with_alpha(a));
            canvas.pop_clip();
        }

        for (tab, rect) in tabs.tabs.iter().zip(&tabs.rects) {
            canvas.draw_text(&tab.title, *rect, TITLE_FONT * s, fore, TextAlign::Center);
        }

        if let Some(r) = self.zone_rect(HotZone::TabClose) {
            let a = (self.hover_progress(HotZone::TabClose) * 60.0) as u8;
            canvas.fill_circle(r.center(), r.w / 2.0, hover.with_alpha(a));
            cross(canvas, r.center(), 4.0 * s, fore, line);
        }

        if let Some(r) = self.zone_rect(HotZone::NewTab) {
            let a = (self.hover_progress(HotZone::NewTab) * 20.0) as u8;
            canvas.fill_rect(r, hover.with_alpha(a), 4.0);
            let c = r.center();
            let size = 6.0 * s;
            canvas.draw_line(Point::new(c.x - size, c.y), Point::new(c.x + size, c.y), fore, line);
            canvas.draw_line(Point::new(c.x, c.y - size), Point::new(c.x, c.y + size), fore, line);
        }
    }
}

pub(crate) fn merge_ticks(a: AnimationTick, b: AnimationTick) -> AnimationTick {
    use AnimationTick::*;
    match (a, b) {
        (Progressed, _) | (_, Progressed) => Progressed,
        (Finished, _) | (_, Finished) => Finished,
        _ => Idle,
    }
}

fn cross(canvas: &mut dyn Canvas, c: Point, size: f32, color: Color, width: f32) {
    canvas.draw_line(
        Point::new(c.x - size, c.y - size),
        Point::new(c.x + size, c.y + size),
        color,
        width,
    );
    canvas.draw_line(
        Point::new(c.x - size, c.y + size),
        Point::new(c.x + size, c.y - size),
        color,
        width,
    );
}

fn chevron(canvas: &mut dyn Canvas, c: Point, s: f32, color: Color, width: f32) {
    let tip = Point::new(c.x - s, c.y + 3.0 * s);
    canvas.draw_line(Point::new(c.x - 5.0 * s - 1.0, c.y - 2.0 * s), tip, color, width);
    canvas.draw_line(Point::new(c.x + 5.0 * s - 1.0, c.y - 2.0 * s), tip, color, width);
}
