use std::cell::Cell;
use std::rc::Rc;

use casement_core::{Color, Rect};
use casement_platform::{Runner, WindowSpec};
use casement_ui::{
    Anchor, Button, ChromeAction, Dock, ElementId, ElementProps, Panel, TabDesign, Window,
};

const ACCENTS: [Color; 3] = [
    Color(0, 120, 215, 255),
    Color(16, 137, 62, 255),
    Color(202, 80, 16, 255),
];

/// A tab page: a sidebar, a row of buttons and a close button pinned to
/// the bottom-right corner.
fn page(window: &mut Window, name: &str, accent: Color, clicks: Rc<Cell<u32>>) -> ElementId {
    let s = window.scale_factor();
    let root = window.add_element(
        ElementProps::docked(Dock::Fill),
        Box::new(Panel::new(Color::from_rgb(250, 250, 250))),
    );

    let mut side = ElementProps::docked(Dock::Left);
    side.bounds.w = 180.0 * s;
    window.add_child(
        root,
        side,
        Box::new(
            Panel::new(Color::from_rgb(238, 238, 242)).border(Color::from_rgb(220, 220, 226), s),
        ),
    );

    for (i, label) in ["Primary", "Secondary"].into_iter().enumerate() {
        let clicks = clicks.clone();
        let name = name.to_string();
        let bounds = Rect::new(204.0 + i as f32 * 176.0, 24.0, 160.0, 36.0).scale(s);
        let back = if i == 0 { accent } else { accent.fade(0.6) };
        window.add_child(
            root,
            ElementProps::new(bounds),
            Box::new(
                Button::new(label)
                    .colors(back, Color::WHITE)
                    .on_click(move || {
                        clicks.set(clicks.get() + 1);
                        log::info!("{name}: {label} clicked ({} total)", clicks.get());
                    }),
            ),
        );
    }

    let size = window.client_rect();
    let corner = Rect::new(size.w - 140.0 * s, size.h - 60.0 * s, 120.0 * s, 36.0 * s);
    window.add_child(
        root,
        ElementProps::new(corner).anchor(Anchor::BOTTOM | Anchor::RIGHT),
        Box::new(
            Button::new("Close")
                .colors(Color::from_rgb(232, 17, 35), Color::WHITE)
                .on_click(|| log::info!("use the title bar close box to quit")),
        ),
    );
    root
}

fn main() -> anyhow::Result<()> {
    let clicks = Rc::new(Cell::new(0u32));
    let opened = Rc::new(Cell::new(0usize));

    let spec = WindowSpec::new("Casement demo").size(1024, 680).chrome(|c| {
        c.tab_design = TabDesign::Chromed;
        c.tab_close_button = true;
        c.new_tab_button = true;
        c.extend_box = true;
    });

    let build = {
        let clicks = clicks.clone();
        let opened = opened.clone();
        move |window: &mut Window| {
            window.suspend_layout();
            for (i, name) in ["Home", "Settings"].into_iter().enumerate() {
                let id = page(window, name, ACCENTS[i], clicks.clone());
                window.add_tab(name, Some(id));
            }
            opened.set(2);
            window.resume_layout(true);
        }
    };

    Runner::new()
        .window(spec, build)
        .on_action(move |window, action| match action {
            ChromeAction::NewTab => {
                let n = opened.get();
                opened.set(n + 1);
                let name = format!("Tab {}", n + 1);
                let id = page(window, &name, ACCENTS[n % ACCENTS.len()], clicks.clone());
                let index = window.add_tab(name, Some(id));
                window.select_tab(index);
            }
            ChromeAction::ExtendBox => log::info!("extend box clicked"),
            ChromeAction::SelectTab { index, previous } => {
                log::debug!("tab {previous:?} -> {index}");
            }
            _ => {}
        })
        .run()
}
