//! Launcher icon processing for the Obsidian builder.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Icon decoding with conversion to RGBA
//! - Square padding and Lanczos resizing into the five Android density buckets

#![warn(missing_docs)]

mod detect;
mod error;
mod icons;

pub use detect::{ImageFormat, detect_format};
pub use error::{ImageError, Result};
pub use icons::{
    DENSITY_BUCKETS, DensityBucket, GeneratedIcon, ICON_FILE_NAME, IconSet, SourceIcon,
    generate_icon_set, load_icon, probe_icon, render_icons, write_icons,
};
