//! Lazy handles to platform-side data: geometries, features, feature
//! collections, images, image collections, and the scalar/list/dictionary
//! values their reductions produce.

pub mod collection;
pub mod feature;
pub mod geometry;
pub mod image;
pub mod image_collection;
pub mod primitive;
