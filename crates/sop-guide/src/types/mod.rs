//! Core types for the SOP guide

pub mod conversation;
pub mod document;
pub mod image;
pub mod response;

pub use conversation::*;
pub use document::*;
pub use image::*;
pub use response::*;
