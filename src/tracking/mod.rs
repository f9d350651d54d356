//! Export contents of `tracking` folder
mod config;
mod contour;
mod extractor;
mod tracker;
pub mod tracking_errors;
mod worm;

#[cfg(test)]
mod test_data;

pub use self::{
    config::*,
    contour::*,
    extractor::*,
    tracker::*,
    tracking_errors::*,
    worm::*,
};
