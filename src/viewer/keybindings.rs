// Keybindings for the lightbox viewer
//
// Keybindings (only while open):
// - ArrowLeft: Previous item
// - ArrowRight: Next item
// - Escape: Close viewer
// - + / =: Zoom in
// - - / _: Zoom out

/// A key press, named the way browsers report `KeyboardEvent.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Char(char),
    Other,
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "Escape" | "Esc" => Self::Escape,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// What a key asks the lightbox to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxAction {
    Previous,
    Next,
    Close,
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

pub fn action_for_key(key: Key) -> Option<LightboxAction> {
    match key {
        Key::ArrowLeft => Some(LightboxAction::Previous),
        Key::ArrowRight => Some(LightboxAction::Next),
        Key::Escape => Some(LightboxAction::Close),
        Key::Char('+') | Key::Char('=') => Some(LightboxAction::ZoomIn),
        Key::Char('-') | Key::Char('_') => Some(LightboxAction::ZoomOut),
        Key::Char(_) | Key::Other => None,
    }
}
