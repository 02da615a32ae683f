#[cfg(test)]
mod tests {
    use crate::*;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF5733");
        assert_eq!(c, Color(255, 87, 51, 255));

        let c_alpha = Color::from_hex("#FF5733AA");
        assert_eq!(c_alpha, Color(255, 87, 51, 170));

        assert_eq!(Color::from_hex("zz"), Color::BLACK);
    }

    #[test]
    fn test_color_lerp_and_darkness() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert_eq!(mid, Color(128, 128, 128, 255));
        assert!(Color::from_rgb(30, 30, 30).is_dark());
        assert!(!Color::from_rgb(240, 240, 240).is_dark());
        assert_eq!(Color::from_rgba(1, 2, 3, 0).opaque().3, 255);
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);

        assert!(rect.contains(Point::new(50.0, 30.0)));
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(!rect.contains(Point::new(110.0, 30.0)));
        assert!(!rect.contains(Point::new(5.0, 30.0)));
        assert!(!rect.contains(Point::new(50.0, 60.0)));
    }

    #[test]
    fn test_rect_deflate_and_intersect() {
        let r = Rect::new(0.0, 0.0, 100.0, 80.0).deflate(Insets::new(5.0, 10.0, 15.0, 20.0));
        assert_eq!(r, Rect::new(5.0, 10.0, 80.0, 50.0));

        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(25.0, 40.0, 50.0, 50.0);
        assert_eq!(a.intersect(&b), Rect::new(25.0, 40.0, 25.0, 10.0));
        assert!(a.intersect(&Rect::new(60.0, 0.0, 5.0, 5.0)).is_empty());
    }

    #[test]
    fn test_mouse_event_translated() {
        let e = MouseEvent::button(Point::new(40.0, 25.0), MouseButton::Left);
        let local = e.translated(Point::new(30.0, 20.0));
        assert_eq!(local.position, Point::new(10.0, 5.0));
        assert_eq!(local.button, Some(MouseButton::Left));
        assert!(local.is_left());
    }

    #[test]
    fn test_linear_animation_completes_after_ceil_ticks() {
        for increment in [0.1f32, 0.25, 0.3, 0.07, 1.0 / 3.0] {
            let mut a = AnimationEngine::new(increment, Easing::Linear);
            a.start(Direction::In);
            let expected = (1.0 / increment).ceil() as usize;

            let mut last = a.progress();
            let mut ticks = 0;
            loop {
                let t = a.tick();
                ticks += 1;
                let p = a.progress();
                assert!(p >= last, "progress regressed at tick {ticks}");
                last = p;
                if t == AnimationTick::Finished {
                    break;
                }
                assert_eq!(t, AnimationTick::Progressed);
                assert!(ticks < 100);
            }
            assert_eq!(ticks, expected, "increment {increment}");
            assert_eq!(a.progress(), 1.0);
            assert!(!a.is_running());
            assert_eq!(a.tick(), AnimationTick::Idle);
        }
    }

    #[test]
    fn test_eased_progress_is_monotonic() {
        for easing in [Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            let mut a = AnimationEngine::new(0.05, easing);
            a.start(Direction::In);
            let mut last = 0.0;
            while a.tick() == AnimationTick::Progressed {
                assert!(a.progress() >= last);
                last = a.progress();
            }
            assert_eq!(a.progress(), 1.0);
        }
    }

    #[test]
    fn test_singular_reverses_in_place_when_running() {
        let mut a = AnimationEngine::new(0.25, Easing::Linear);
        a.start(Direction::In);
        a.tick();
        a.tick();
        assert_eq!(a.progress(), 0.5);

        a.start(Direction::Out);
        assert_eq!(a.count(), 1);
        assert_eq!(a.progress(), 0.5);
        assert_eq!(a.tick(), AnimationTick::Progressed);
        assert_eq!(a.progress(), 0.25);
        assert_eq!(a.tick(), AnimationTick::Finished);
        assert_eq!(a.progress(), 0.0);
    }

    #[test]
    fn test_singular_restart_when_idle_resets_to_start_value() {
        let mut a = AnimationEngine::new(0.5, Easing::Linear);
        a.start(Direction::In);
        a.tick();
        a.tick();
        assert_eq!(a.progress(), 1.0);

        a.start(Direction::In);
        assert_eq!(a.progress(), 0.0);
        a.start(Direction::Out);
        assert_eq!(a.progress(), 0.0, "running instance reverses in place");

        let mut b = AnimationEngine::new(0.5, Easing::Linear);
        b.start(Direction::Out);
        assert_eq!(b.progress(), 1.0);
    }

    #[test]
    fn test_non_interruptible_ignores_start_while_running() {
        let mut a = AnimationEngine::new(0.25, Easing::Linear).interrupt(false);
        a.start(Direction::In);
        a.tick();
        a.start(Direction::Out);
        assert_eq!(a.direction(), Some(Direction::In));
    }

    #[test]
    fn test_ripples_run_concurrently() {
        let mut r = AnimationEngine::new(0.25, Easing::Linear).singular(false);
        r.start_at(Direction::In, Point::new(1.0, 2.0));
        r.tick();
        r.tick();
        r.start_at(Direction::In, Point::new(9.0, 9.0));

        assert_eq!(r.count(), 2);
        assert_eq!(r.progress_at(0), 0.5);
        assert_eq!(r.progress_at(1), 0.0);
        assert_eq!(r.origin_at(0), Some(Point::new(1.0, 2.0)));
        assert_eq!(r.origin_at(1), Some(Point::new(9.0, 9.0)));

        r.tick();
        r.tick();
        // first ripple finished and was dropped
        assert_eq!(r.count(), 1);
        assert_eq!(r.origin_at(0), Some(Point::new(9.0, 9.0)));
        assert_eq!(r.progress_at(0), 0.5);
    }

    #[test]
    fn test_set_progress_stops_animation() {
        let mut a = AnimationEngine::page_transition();
        a.start(Direction::In);
        a.tick();
        a.set_progress(0.0);
        assert!(!a.is_running());
        assert_eq!(a.progress(), 0.0);
    }

    #[test]
    fn test_scene_recorder_applies_offsets() {
        let mut rec = SceneRecorder::new(Size::new(100.0, 100.0));
        rec.clear(Color::WHITE);
        rec.push_offset(10.0, 20.0);
        rec.fill_rect(Rect::new(1.0, 1.0, 5.0, 5.0), Color::BLACK, 0.0);
        rec.push_offset(5.0, 5.0);
        rec.push_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        rec.pop_clip();
        rec.pop_offset();
        rec.pop_offset();
        rec.fill_circle(Point::new(3.0, 3.0), 2.0, Color::BLACK);

        let scene = rec.scene();
        assert_eq!(scene.clear_color, Color::WHITE);
        assert_eq!(
            scene.nodes[0],
            SceneNode::Rect {
                rect: Rect::new(11.0, 21.0, 5.0, 5.0),
                color: Color::BLACK,
                radius: 0.0
            }
        );
        assert_eq!(
            scene.nodes[1],
            SceneNode::PushClip {
                rect: Rect::new(15.0, 25.0, 10.0, 10.0)
            }
        );
        assert_eq!(
            scene.nodes[3],
            SceneNode::Circle {
                center: Point::new(3.0, 3.0),
                radius: 2.0,
                color: Color::BLACK
            }
        );
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("gpu".parse::<RenderBackend>(), Ok(RenderBackend::GpuNative));
        assert_eq!("GL".parse::<RenderBackend>(), Ok(RenderBackend::GpuGl));
        assert_eq!(
            "software".parse::<RenderBackend>(),
            Ok(RenderBackend::Software)
        );
        assert!("d3d9".parse::<RenderBackend>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let cfg = RenderConfig::default();
        assert_eq!(cfg.backend, RenderBackend::Software);
        assert_eq!(cfg.max_software_back_buffer_bytes, 24 * 1024 * 1024);
        assert_eq!(cfg.idle_maintenance_delay, Duration::from_millis(1500));
        assert!(cfg.enable_idle_maintenance);
        assert!(!cfg.show_perf_overlay);
    }

    #[test]
    fn test_config_from_lookup_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("CASEMENT_BACKEND", "gl"),
            ("CASEMENT_MAX_BACKBUFFER_BYTES", "0"),
            ("CASEMENT_IDLE_MS", "not-a-number"),
            ("CASEMENT_IDLE_MAINTENANCE", "0"),
            ("CASEMENT_PERF_OVERLAY", "1"),
        ]
        .into_iter()
        .collect();
        let cfg = RenderConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.backend, RenderBackend::GpuGl);
        assert_eq!(cfg.max_software_back_buffer_bytes, 0);
        assert!(cfg.allows_retained(usize::MAX));
        assert_eq!(cfg.idle_maintenance_delay, Duration::from_millis(1500));
        assert!(!cfg.enable_idle_maintenance);
        assert!(cfg.show_perf_overlay);
    }
}
