use std::time::Duration;

use casement_core::{CursorIcon, Key, MouseButton, Point, Rect};
use web_time::Instant;
use winit::keyboard::{Key as WinitKey, NamedKey};

use crate::common::{self, ClickTracker, Synthesized};
use crate::present::pack_xrgb;
use crate::registry::WindowRegistry;

#[test]
fn press_release_in_place_is_a_click() {
    let mut t = ClickTracker::default();
    let p = Point::new(10.0, 10.0);
    assert_eq!(t.press(Instant::now(), p, MouseButton::Left), 1);
    assert_eq!(t.release(p, MouseButton::Left), Some(Synthesized::Click));
    // release without a press
    assert_eq!(t.release(p, MouseButton::Left), None);
}

#[test]
fn second_quick_press_is_a_double_click() {
    let mut t = ClickTracker::default();
    let t0 = Instant::now();
    t.press(t0, Point::new(10.0, 10.0), MouseButton::Left);
    t.release(Point::new(10.0, 10.0), MouseButton::Left);
    let clicks = t.press(
        t0 + Duration::from_millis(200),
        Point::new(13.0, 12.0),
        MouseButton::Left,
    );
    assert_eq!(clicks, 2);
    assert_eq!(
        t.release(Point::new(13.0, 12.0), MouseButton::Left),
        Some(Synthesized::DoubleClick)
    );
    // a third press starts a new pair
    assert_eq!(
        t.press(
            t0 + Duration::from_millis(300),
            Point::new(13.0, 12.0),
            MouseButton::Left
        ),
        1
    );
}

#[test]
fn slow_far_or_other_button_presses_stay_single() {
    let t0 = Instant::now();
    let p = Point::new(10.0, 10.0);

    let mut slow = ClickTracker::default();
    slow.press(t0, p, MouseButton::Left);
    assert_eq!(
        slow.press(t0 + Duration::from_millis(600), p, MouseButton::Left),
        1
    );

    let mut far = ClickTracker::default();
    far.press(t0, p, MouseButton::Left);
    assert_eq!(far.press(t0, Point::new(15.0, 10.0), MouseButton::Left), 1);

    let mut other = ClickTracker::default();
    other.press(t0, p, MouseButton::Left);
    assert_eq!(other.press(t0, p, MouseButton::Right), 1);
}

#[test]
fn release_away_from_press_is_not_a_click() {
    let mut t = ClickTracker::default();
    t.press(Instant::now(), Point::new(10.0, 10.0), MouseButton::Left);
    assert_eq!(t.release(Point::new(40.0, 10.0), MouseButton::Left), None);
}

#[test]
fn registry_tracks_active_and_clears_on_last_close() {
    let reg: WindowRegistry<u32> = WindowRegistry::new();
    reg.register(1, "one");
    reg.register(2, "two");
    assert_eq!(reg.active(), Some(1));
    assert!(reg.set_active(2));
    assert!(!reg.set_active(9));
    assert_eq!(reg.active(), Some(2));

    // re-registering renames in place
    reg.register(1, "first");
    let titles: Vec<_> = reg.windows().into_iter().map(|e| e.title).collect();
    assert_eq!(titles, ["first", "two"]);

    assert!(!reg.unregister(2));
    assert_eq!(reg.active(), Some(1));
    let handle = reg.clone();
    assert!(handle.unregister(1));
    assert!(reg.is_empty());
    assert_eq!(reg.active(), None);
}

#[test]
fn rgba_packs_to_xrgb() {
    let src = [0x11, 0x22, 0x33, 0xff, 0xaa, 0xbb, 0xcc, 0x00];
    let mut dst = [0u32; 2];
    pack_xrgb(&src, &mut dst);
    assert_eq!(dst, [0x0011_2233, 0x00aa_bbcc]);
}

#[test]
fn winit_keys_map_to_engine_keys() {
    assert_eq!(common::key(&WinitKey::Named(NamedKey::Enter)), Key::Enter);
    assert_eq!(common::key(&WinitKey::Named(NamedKey::F5)), Key::F(5));
    assert_eq!(common::key(&WinitKey::Named(NamedKey::Space)), Key::Space);
    assert_eq!(
        common::key(&WinitKey::Character("a".into())),
        Key::Character('a')
    );
    assert_eq!(common::key(&WinitKey::Character(" ".into())), Key::Space);
    assert_eq!(
        common::key(&WinitKey::Named(NamedKey::CapsLock)),
        Key::Unidentified
    );
}

#[test]
fn wheel_pixels_convert_to_lines() {
    use winit::dpi::PhysicalPosition;
    use winit::event::MouseScrollDelta;
    assert_eq!(common::wheel_lines(MouseScrollDelta::LineDelta(0.0, 1.0)), 1.0);
    assert_eq!(
        common::wheel_lines(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -80.0))),
        -2.0
    );
}

#[test]
fn cursor_point_picks_its_monitor() {
    let monitors = [
        Rect::new(0.0, 0.0, 1920.0, 1080.0),
        Rect::new(1920.0, 0.0, 2560.0, 1440.0),
    ];
    assert_eq!(
        common::monitor_at(&monitors, Point::new(2000.0, 100.0)),
        Some(monitors[1])
    );
    assert_eq!(
        common::monitor_at(&monitors, Point::new(-50.0, -50.0)),
        Some(monitors[0])
    );
    assert_eq!(common::monitor_at(&[], Point::ZERO), None);
}

#[test]
fn resize_cursors_use_the_axis_names() {
    assert_eq!(
        common::cursor_icon(CursorIcon::ResizeHorizontal),
        winit::window::CursorIcon::EwResize
    );
    assert_eq!(
        common::cursor_icon(CursorIcon::Pointer),
        winit::window::CursorIcon::Pointer
    );
}
