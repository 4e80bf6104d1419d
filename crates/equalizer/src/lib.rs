//! Parallel per-channel histogram equalization.
//!
//! A frame runs in three stages separated by barriers:
//! - Building: count every pixel into a 3 x 256 histogram
//! - Mapping: turn each channel's cumulative distribution into a lookup table
//! - Remapping: rewrite every pixel through the tables

pub mod builder;
pub mod config;
pub mod histogram;
pub mod mapper;
pub mod pipeline;
pub mod remap;

pub use builder::{AccumulationStrategy, BuilderConfig, HistogramBuilder};
pub use config::PipelineConfig;
pub use histogram::{ChannelHistogram, ChannelStats, HistogramSnapshot, LocalHistogram};
pub use mapper::{EqualizationMapper, MappingMode, MappingTable, Rounding};
pub use pipeline::{
    equalize, CancelToken, EqualizationPipeline, FrameControl, FrameObserver, FrameOutput,
    FrameReport, PipelineState,
};
pub use remap::RemapStage;

pub use equalize_common::{
    Channel, EqualizeError, EqualizeResult, FrameStage, Image, ImageView, PixelLayout,
};
