//! Dead simple tracking of worm-shaped organisms in segmented microscope video.
//!
//! Every frame is thresholded into closed contours, plausible worm-sized contours are
//! matched to already tracked worms by bounding box overlap, and each worm keeps running
//! estimates of its area, length and width.
//!
//! Basic usage:
//!
//! ```
//! use image::{GrayImage, Luma};
//! use worm_tracker::tracking::WormTracker;
//!
//! let mut tracker: WormTracker = WormTracker::default();
//! // Plain bright background, nothing to track
//! let frame = GrayImage::from_pixel(64, 48, Luma([255]));
//! let stats = tracker.advance_next_frame(&frame).unwrap();
//! assert_eq!(stats.added, 0);
//! assert_eq!(tracker.tracking(), 0);
//! ```
pub mod tracking;
pub mod utils;
