//! Keyboard surface
//!
//! Thin dispatcher mapping key presses to session actions; all the real
//! behavior lives in the session and the scale model. Unmapped keys
//! produce no action.

use crate::annotation::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    pub fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectTool(Tool),
    PrevPage,
    NextPage,
    ZoomIn,
    ZoomOut,
    FitWidth,
    Export,
}

impl Action {
    pub fn from_key(input: KeyInput) -> Option<Action> {
        if input.ctrl {
            return match input.key {
                Key::Char('s') => Some(Action::Export),
                _ => None,
            };
        }

        match input.key {
            Key::Char('p') => Some(Action::SelectTool(Tool::Pen)),
            Key::Char('h') => Some(Action::SelectTool(Tool::Highlighter)),
            Key::Char('t') => Some(Action::SelectTool(Tool::Text)),
            Key::Char('e') => Some(Action::SelectTool(Tool::Eraser)),
            Key::ArrowLeft => Some(Action::PrevPage),
            Key::ArrowRight => Some(Action::NextPage),
            Key::Char('+') | Key::Char('=') => Some(Action::ZoomIn),
            Key::Char('-') => Some(Action::ZoomOut),
            Key::Char('w') => Some(Action::FitWidth),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_shortcuts_select_tools() {
        assert_eq!(
            Action::from_key(KeyInput::plain(Key::Char('p'))),
            Some(Action::SelectTool(Tool::Pen))
        );
        assert_eq!(
            Action::from_key(KeyInput::plain(Key::Char('h'))),
            Some(Action::SelectTool(Tool::Highlighter))
        );
        assert_eq!(
            Action::from_key(KeyInput::plain(Key::Char('t'))),
            Some(Action::SelectTool(Tool::Text))
        );
        assert_eq!(
            Action::from_key(KeyInput::plain(Key::Char('e'))),
            Some(Action::SelectTool(Tool::Eraser))
        );
    }

    #[test]
    fn navigation_and_zoom_keys_map_to_actions() {
        assert_eq!(Action::from_key(KeyInput::plain(Key::ArrowLeft)), Some(Action::PrevPage));
        assert_eq!(Action::from_key(KeyInput::plain(Key::ArrowRight)), Some(Action::NextPage));
        assert_eq!(Action::from_key(KeyInput::plain(Key::Char('+'))), Some(Action::ZoomIn));
        assert_eq!(Action::from_key(KeyInput::plain(Key::Char('='))), Some(Action::ZoomIn));
        assert_eq!(Action::from_key(KeyInput::plain(Key::Char('-'))), Some(Action::ZoomOut));
        assert_eq!(Action::from_key(KeyInput::plain(Key::Char('w'))), Some(Action::FitWidth));
    }

    #[test]
    fn ctrl_s_exports_and_plain_s_does_nothing() {
        assert_eq!(Action::from_key(KeyInput::ctrl(Key::Char('s'))), Some(Action::Export));
        assert_eq!(Action::from_key(KeyInput::plain(Key::Char('s'))), None);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(Action::from_key(KeyInput::plain(Key::Char('z'))), None);
        assert_eq!(Action::from_key(KeyInput::ctrl(Key::Char('p'))), None);
    }
}
