//! Keyboard bindings.

use macroquad::input::{is_key_down, KeyCode};

/// Modifier key state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false };
    pub const CTRL: Modifiers = Modifiers { shift: false, ctrl: true, alt: false };
    pub const CTRL_SHIFT: Modifiers = Modifiers { shift: true, ctrl: true, alt: false };
    pub const ALT: Modifiers = Modifiers { shift: false, ctrl: false, alt: true };

    /// Reads the current modifier state from the window.
    pub fn current() -> Self {
        Self {
            shift: is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
            ctrl: is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl)
                || is_key_down(KeyCode::LeftSuper) || is_key_down(KeyCode::RightSuper),
            alt: is_key_down(KeyCode::LeftAlt) || is_key_down(KeyCode::RightAlt),
        }
    }

    pub fn without_shift(self) -> Self {
        Self { shift: false, ..self }
    }
}

/// A key plus modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub mods: Modifiers,
    pub key: KeyCode,
}

impl Hotkey {
    pub const fn new(mods: Modifiers, key: KeyCode) -> Self {
        Self { mods, key }
    }
}

/// Editor commands bound to keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    PrevRow,
    NextRow,
    PrevPage,
    NextPage,
    PrevColumn,
    NextColumn,
    PrevChannel,
    NextChannel,
    ChannelLeft,
    ChannelRight,
    FirstChannel,
    LastChannel,
    Home,
    End,
    Top,
    Bottom,
    PrevFrame,
    NextFrame,
    ScrollLeft,
    ScrollRight,
    Cut,
    Copy,
    CopyEntire,
    Paste,
    PasteMix,
    PasteEntire,
    Delete,
    SelectChannel,
    SelectAllChannels,
    SelectAll,
    SelectionStart,
    SelectionEnd,
    Cancel,
    ToggleFollow,
    ToggleFullRowSelect,
    IncreaseEffectColumns,
    DecreaseEffectColumns,
}

impl Action {
    /// Returns true for actions that move the cursor, which shift turns
    /// into selection.
    pub fn is_movement(&self) -> bool {
        matches!(self, Action::PrevRow | Action::NextRow | Action::PrevPage
            | Action::NextPage | Action::PrevColumn | Action::NextColumn
            | Action::PrevChannel | Action::NextChannel | Action::ChannelLeft
            | Action::ChannelRight | Action::FirstChannel | Action::LastChannel
            | Action::Home | Action::End | Action::Top | Action::Bottom)
    }
}

pub fn default_keymap() -> Vec<(Hotkey, Action)> {
    use KeyCode::*;
    vec![
        (Hotkey::new(Modifiers::NONE, Up), Action::PrevRow),
        (Hotkey::new(Modifiers::NONE, Down), Action::NextRow),
        (Hotkey::new(Modifiers::NONE, PageUp), Action::PrevPage),
        (Hotkey::new(Modifiers::NONE, PageDown), Action::NextPage),
        (Hotkey::new(Modifiers::NONE, Left), Action::PrevColumn),
        (Hotkey::new(Modifiers::NONE, Right), Action::NextColumn),
        (Hotkey::new(Modifiers::NONE, Tab), Action::NextChannel),
        (Hotkey::new(Modifiers::SHIFT, Tab), Action::PrevChannel),
        (Hotkey::new(Modifiers::ALT, Left), Action::ChannelLeft),
        (Hotkey::new(Modifiers::ALT, Right), Action::ChannelRight),
        (Hotkey::new(Modifiers::ALT, Home), Action::FirstChannel),
        (Hotkey::new(Modifiers::ALT, End), Action::LastChannel),
        (Hotkey::new(Modifiers::NONE, Home), Action::Home),
        (Hotkey::new(Modifiers::NONE, End), Action::End),
        (Hotkey::new(Modifiers::CTRL, Home), Action::Top),
        (Hotkey::new(Modifiers::CTRL, End), Action::Bottom),
        (Hotkey::new(Modifiers::CTRL, Up), Action::PrevFrame),
        (Hotkey::new(Modifiers::CTRL, Down), Action::NextFrame),
        (Hotkey::new(Modifiers::CTRL, Left), Action::ScrollLeft),
        (Hotkey::new(Modifiers::CTRL, Right), Action::ScrollRight),
        (Hotkey::new(Modifiers::CTRL, X), Action::Cut),
        (Hotkey::new(Modifiers::CTRL, C), Action::Copy),
        (Hotkey::new(Modifiers::CTRL_SHIFT, C), Action::CopyEntire),
        (Hotkey::new(Modifiers::CTRL, V), Action::Paste),
        (Hotkey::new(Modifiers::CTRL, M), Action::PasteMix),
        (Hotkey::new(Modifiers::CTRL_SHIFT, V), Action::PasteEntire),
        (Hotkey::new(Modifiers::NONE, Delete), Action::Delete),
        (Hotkey::new(Modifiers::CTRL, A), Action::SelectAll),
        (Hotkey::new(Modifiers::CTRL_SHIFT, A), Action::SelectAllChannels),
        (Hotkey::new(Modifiers::CTRL, L), Action::SelectChannel),
        (Hotkey::new(Modifiers::ALT, B), Action::SelectionStart),
        (Hotkey::new(Modifiers::ALT, E), Action::SelectionEnd),
        (Hotkey::new(Modifiers::NONE, Escape), Action::Cancel),
        (Hotkey::new(Modifiers::NONE, ScrollLock), Action::ToggleFollow),
        (Hotkey::new(Modifiers::CTRL, F), Action::ToggleFullRowSelect),
        (Hotkey::new(Modifiers::CTRL, RightBracket), Action::IncreaseEffectColumns),
        (Hotkey::new(Modifiers::CTRL, LeftBracket), Action::DecreaseEffectColumns),
    ]
}

/// Looks up the action for a hotkey. Movement keys also match with shift
/// held, so shift can extend the selection.
pub fn hotkey_action(keymap: &[(Hotkey, Action)], hotkey: &Hotkey) -> Option<Action> {
    let find = |h: &Hotkey| keymap.iter().find(|(k, _)| k == h).map(|(_, a)| *a);
    find(hotkey).or_else(|| {
        if !hotkey.mods.shift {
            return None
        }
        let unshifted = Hotkey::new(hotkey.mods.without_shift(), hotkey.key);
        find(&unshifted).filter(Action::is_movement)
    })
}
