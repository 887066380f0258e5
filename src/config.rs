use std::{error::Error, path::Path};

use serde::{Serialize, Deserialize};

use crate::{input::{self, Action, Hotkey}, ui::theme::Theme};

const CONFIG_PATH: &str = "config.toml";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub font_size: u16,
    /// Pixels the pointer must travel before a block drag starts.
    pub drag_threshold_x: f32,
    pub drag_threshold_y: f32,
    pub wrap_cursor: bool,
    pub wrap_frames: bool,
    pub follow_mode: bool,
    pub full_row_select: bool,
    pub highlight: usize,
    pub second_highlight: usize,
    pub show_adjacent_frames: bool,
    /// Rows moved by page up/down.
    pub page_rows: usize,
    /// Rows moved per mouse wheel step.
    pub wheel_rows: usize,
    /// Milliseconds between auto-scroll steps.
    pub scroll_interval: u64,
    pub theme: Theme,
    #[serde(skip, default = "input::default_keymap")]
    pub keys: Vec<(Hotkey, Action)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_size: 14,
            drag_threshold_x: 4.0,
            drag_threshold_y: 4.0,
            wrap_cursor: true,
            wrap_frames: true,
            follow_mode: true,
            full_row_select: false,
            highlight: 4,
            second_highlight: 16,
            show_adjacent_frames: true,
            page_rows: 4,
            wheel_rows: 4,
            scroll_interval: 10,
            theme: Theme::default(),
            keys: input::default_keymap(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn Error>> {
        Self::load_from(CONFIG_PATH)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        self.save_to(CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = std::fs::read_to_string(path)?;
        let c = toml::from_str(&s)?;
        Ok(c)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let s = toml::to_string(self)?;
        std::fs::write(path, s)?;
        Ok(())
    }

    pub fn hotkey_action(&self, hotkey: &Hotkey) -> Option<Action> {
        input::hotkey_action(&self.keys, hotkey)
    }
}

#[cfg(test)]
mod tests {
    use macroquad::input::KeyCode;

    use crate::input::Modifiers;

    use super::*;

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            drag_threshold_x: 6.0,
            wrap_frames: false,
            theme: Theme::light(2.2),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "wrap_cursor = false\nhighlight = 8\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(!config.wrap_cursor);
        assert_eq!(config.highlight, 8);
        assert_eq!(config.page_rows, Config::default().page_rows);
        assert_eq!(config.hotkey_action(&Hotkey::new(Modifiers::CTRL, KeyCode::C)),
            Some(Action::Copy));
    }

    #[test]
    fn test_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "wrap_cursor = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
        assert!(Config::load_from(dir.path().join("missing.toml")).is_err());
    }
}
