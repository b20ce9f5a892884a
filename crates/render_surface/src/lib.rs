//! Render Surface - the rendered visual document
//!
//! This crate models what the host UI has rendered: an element tree that
//! carries styles and paintable content, the document body that off-screen
//! clones are mounted into, and the rasterizer that turns a mounted subtree
//! into pixels.

mod element;
mod error;
mod rasterizer;
mod tree;

pub use element::*;
pub use error::*;
pub use rasterizer::*;
pub use tree::*;
