pub mod gestures;
pub mod keybindings;
pub mod lightbox;

pub use gestures::{GestureState, TouchPoint};
pub use keybindings::{Key, LightboxAction};
pub use lightbox::{Lightbox, LightboxItem, LightboxState, ViewerState};
