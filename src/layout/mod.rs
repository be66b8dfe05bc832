pub mod layout_cache;
pub mod masonry;

pub use layout_cache::{LayoutCache, MasonryEngine};
pub use masonry::{Breakpoints, MasonryLayout, MasonryPlan, MasonryTile};
