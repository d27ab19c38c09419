//! Utility modules

pub mod draw;
pub mod image;

pub use draw::Annotator;
pub use image::ImageUtils;
