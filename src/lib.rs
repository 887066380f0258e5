//! Pattern grid editor for a music tracker: cursor, layout, hit-testing,
//! block clipboard, drag and drop, and incremental repainting.

use std::error::Error;

use macroquad::prelude::*;

pub mod clip;
pub mod config;
pub mod cursor;
pub mod drag;
pub mod editor;
pub mod hit;
pub mod input;
pub mod layout;
pub mod module;
pub mod pattern;
pub mod redraw;
pub mod selection;
pub mod surface;
pub mod ui;

use clip::ClipData;
use config::Config;
use editor::{EditorSettings, PatternEditor};
use input::{Action, Hotkey, Modifiers};
use module::{Module, PatternStore};
use pattern::{Cell, Effect, Note, EFFECT_SKIP};
use ui::canvas::{self, Canvas};

/// Application name, for window title, etc.
pub const APP_NAME: &str = "Tracker Grid";

const DOUBLE_CLICK_SECS: f64 = 0.3;
const DOUBLE_CLICK_DISTANCE: f32 = 4.0;

const DEMO_CHANNELS: [&str; 5] = ["Pulse 1", "Pulse 2", "Triangle", "Noise", "DPCM"];

struct App {
    config: Config,
    module: Module,
    editor: PatternEditor,
    canvas: Canvas,
    /// Serialized clip, as it would sit on a system clipboard.
    clipboard: Option<Vec<u8>>,
    last_click: Option<(f64, Vec2)>,
    last_mouse: Vec2,
    scroll_elapsed: f32,
}

impl App {
    fn new(config_path: Option<String>) -> Self {
        let loaded = match &config_path {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };
        let config = match loaded {
            Ok(c) => c,
            Err(e) => {
                log::warn!("using default config: {}", e);
                Config::default()
            }
        };

        let size = vec2(screen_width(), screen_height());
        let mut editor = PatternEditor::new(EditorSettings::from(&config));
        editor.set_font_metrics(canvas::font_metrics(config.font_size));
        editor.set_window_size(size);

        Self {
            canvas: Canvas::new(size, config.font_size),
            config,
            module: demo_module(),
            editor,
            clipboard: None,
            last_click: None,
            last_mouse: Vec2::ZERO,
            scroll_elapsed: 0.0,
        }
    }

    /// Serializes the editor's clip after a copy or cut.
    fn store_clipboard(&mut self) {
        let Some(clip) = self.editor.clipboard() else { return };
        match clip.to_bytes() {
            Ok(bytes) => self.clipboard = Some(bytes),
            Err(e) => log::warn!("could not store clip: {}", e),
        }
    }

    /// Hands the stored clip to the editor before a paste.
    fn load_clipboard(&mut self) {
        let clip = self.clipboard.as_deref().and_then(|bytes| {
            ClipData::from_bytes(bytes)
                .inspect_err(|e| log::warn!("could not read clip: {}", e))
                .ok()
        });
        self.editor.set_clipboard(clip);
    }

    fn handle_keys(&mut self) {
        let mods = Modifiers::current();
        for key in get_keys_pressed() {
            let Some(action) = self.config.hotkey_action(&Hotkey::new(mods, key)) else {
                continue
            };
            match action {
                Action::Copy | Action::CopyEntire | Action::Cut => {
                    if self.editor.action(action, mods, &mut self.module) {
                        self.store_clipboard();
                    }
                }
                Action::Paste | Action::PasteMix | Action::PasteEntire => {
                    self.load_clipboard();
                    self.editor.action(action, mods, &mut self.module);
                }
                _ => {
                    self.editor.action(action, mods, &mut self.module);
                }
            }
        }
    }

    fn handle_mouse(&mut self) {
        let point: Vec2 = mouse_position().into();
        let mods = Modifiers::current();

        if point != self.last_mouse {
            self.last_mouse = point;
            self.editor.on_mouse_move(point, &self.module);
        }

        if is_mouse_button_pressed(MouseButton::Left) {
            let now = get_time();
            let double = self.last_click.is_some_and(|(t, p)| {
                now - t < DOUBLE_CLICK_SECS && p.distance(point) < DOUBLE_CLICK_DISTANCE
            });
            if double {
                self.editor.on_double_click(point, &self.module);
                self.last_click = None;
            } else {
                self.editor.on_mouse_down(point, mods, &mut self.module);
                self.last_click = Some((now, point));
            }
        }
        if is_mouse_button_released(MouseButton::Left) {
            self.editor.on_mouse_up(point, mods, &mut self.module);
        }
        if is_mouse_button_pressed(MouseButton::Right) {
            self.editor.on_right_down(point, &self.module);
        }

        let (_, wheel) = mouse_wheel();
        if wheel != 0.0 {
            self.editor.on_mouse_scroll(wheel.signum(), mods, &self.module);
        }
    }

    fn frame(&mut self) {
        self.editor.set_window_size(vec2(screen_width(), screen_height()));
        self.handle_keys();
        self.handle_mouse();

        self.scroll_elapsed += get_frame_time();
        if self.scroll_elapsed * 1000.0 >= self.config.scroll_interval as f32 {
            self.scroll_elapsed = 0.0;
            self.editor.on_scroll_timer(&self.module);
        }

        self.editor.draw(&self.module, &mut self.canvas, &self.config.theme);
        clear_background(self.config.theme.row_bg());
        self.canvas.draw_to_screen();
    }
}

/// A few frames of arpeggios to look at.
fn demo_module() -> Module {
    let mut module = Module::new(&DEMO_CHANNELS, 4, 64);
    module.title = String::from("Demo");
    for frame in 0..2 {
        for row in (0..64).step_by(4) {
            let pitch = [0, 4, 7, 11][row / 4 % 4];
            module.set_cell(frame, row, 0, Cell {
                note: Note::new(pitch, 4),
                instrument: Some(0),
                volume: Some(15),
                ..Cell::EMPTY
            });
            module.set_cell(frame, row + 2, 2, Cell {
                note: Note::new(pitch, 3),
                instrument: Some(1),
                ..Cell::EMPTY
            });
        }
        module.set_cell(frame, 60, 1, Cell { note: Note::Release, ..Cell::EMPTY });
    }
    // frame 2 repeats frame 0's pulse pattern
    module.set_pattern_index(2, 0, 0);
    module.set_cell(3, 47, 3, Cell {
        effects: [Some(Effect { kind: EFFECT_SKIP, param: 0 }), None, None, None],
        ..Cell::EMPTY
    });
    module
}

/// Application entry point. `arg` is an optional config path.
pub async fn run(arg: Option<String>) -> Result<(), Box<dyn Error>> {
    let mut app = App::new(arg);
    log::info!("{} channels, {} frames", app.module.channel_count(), app.module.frame_count());

    loop {
        app.frame();
        next_frame().await
    }
}
