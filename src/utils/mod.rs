//! Export contents of `utils` folder
mod geometry;
#[allow(clippy::module_inception)]
mod utils;

pub use self::{geometry::*, utils::*};
