pub mod gallery_view;
pub mod media_item;

pub use gallery_view::*;
pub use media_item::*;
