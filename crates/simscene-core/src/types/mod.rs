//! Core type definitions

mod joint;
mod pose;
mod primitive;

pub use joint::*;
pub use pose::*;
pub use primitive::*;
