//! Common types shared by the equalizer engine and its drivers.

pub mod channel;
pub mod error;
pub mod image;

pub use channel::{checked_bucket, Channel, CHANNEL_COUNT, INTENSITY_LEVELS, MAX_INTENSITY};
pub use error::{EqualizeError, EqualizeResult, FrameStage};
pub use image::{Image, ImageView, PixelLayout};
