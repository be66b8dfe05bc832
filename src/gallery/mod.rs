pub mod assembler;
pub mod session;

pub use assembler::GalleryAssembler;
pub use session::GallerySession;
