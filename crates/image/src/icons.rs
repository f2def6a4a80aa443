//! Launcher icon generation with the image crate.
//!
//! One source image becomes five square PNGs, one per Android density
//! bucket. The whole set is rendered in memory before anything is written.

use crate::{ImageError, ImageFormat, Result, detect_format};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// File name written into every bucket directory
pub const ICON_FILE_NAME: &str = "ic_launcher.png";

/// A screen-density tier and its launcher icon edge length in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityBucket {
    /// Resource directory name, e.g. `mipmap-hdpi`
    pub name: &'static str,
    /// Edge length in pixels
    pub size: u32,
}

/// The five required buckets, smallest first
pub const DENSITY_BUCKETS: [DensityBucket; 5] = [
    DensityBucket { name: "mipmap-mdpi", size: 48 },
    DensityBucket { name: "mipmap-hdpi", size: 72 },
    DensityBucket { name: "mipmap-xhdpi", size: 96 },
    DensityBucket { name: "mipmap-xxhdpi", size: 144 },
    DensityBucket { name: "mipmap-xxxhdpi", size: 192 },
];

/// A validated source icon
#[derive(Debug, Clone)]
pub struct SourceIcon {
    /// Detected container format
    pub format: ImageFormat,
    /// Decoded pixels, converted to RGBA
    pub image: RgbaImage,
}

impl SourceIcon {
    /// Source dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the source is square
    pub fn is_square(&self) -> bool {
        let (w, h) = self.dimensions();
        w == h
    }
}

/// One written icon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedIcon {
    /// Bucket it belongs to
    pub bucket: DensityBucket,
    /// Absolute or caller-relative path of the PNG
    pub path: PathBuf,
}

/// The complete set of written icons
#[derive(Debug, Clone, Default)]
pub struct IconSet {
    /// One entry per bucket, in [`DENSITY_BUCKETS`] order
    pub icons: Vec<GeneratedIcon>,
}

impl IconSet {
    /// Paths of all written icons
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.icons.iter().map(|i| i.path.as_path())
    }
}

/// Read and decode an icon, converting it to RGBA.
///
/// Fails when the path is unreadable or the content is not a decodable
/// raster image. Nothing is written.
pub fn probe_icon(source: &Path) -> Result<SourceIcon> {
    let data = std::fs::read(source).map_err(|e| ImageError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;
    load_icon(&data)
}

/// Decode icon bytes, converting them to RGBA.
pub fn load_icon(data: &[u8]) -> Result<SourceIcon> {
    let format = detect_format(data)?;
    let decoded = image::load_from_memory_with_format(data, format.decoder_format())?;
    let (w, h) = (decoded.width(), decoded.height());
    if w == 0 || h == 0 {
        return Err(ImageError::InvalidData("Image has no pixels".into()));
    }
    tracing::debug!(
        format = ?format,
        width = w,
        height = h,
        alpha = format.supports_alpha(),
        "Icon decoded"
    );
    Ok(SourceIcon {
        format,
        image: decoded.to_rgba8(),
    })
}

/// Centre a non-square image on a transparent square canvas
fn square_canvas(img: &RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == h {
        return img.clone();
    }
    let side = w.max(h);
    let mut canvas = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 0]));
    imageops::overlay(
        &mut canvas,
        img,
        i64::from((side - w) / 2),
        i64::from((side - h) / 2),
    );
    canvas
}

/// Render every bucket in memory
pub fn render_icons(source: &SourceIcon) -> Vec<(DensityBucket, RgbaImage)> {
    let square = square_canvas(&source.image);
    DENSITY_BUCKETS
        .iter()
        .map(|bucket| {
            let resized = imageops::resize(&square, bucket.size, bucket.size, FilterType::Lanczos3);
            (*bucket, resized)
        })
        .collect()
}

/// Write the rendered icons as `<res_dir>/<bucket>/ic_launcher.png`.
pub fn write_icons(rendered: Vec<(DensityBucket, RgbaImage)>, res_dir: &Path) -> Result<IconSet> {
    let mut set = IconSet::default();
    for (bucket, pixels) in rendered {
        let dir = res_dir.join(bucket.name);
        std::fs::create_dir_all(&dir).map_err(|e| ImageError::Write {
            path: dir.clone(),
            source: e,
        })?;
        let path = dir.join(ICON_FILE_NAME);
        DynamicImage::ImageRgba8(pixels).save_with_format(&path, image::ImageFormat::Png)?;
        tracing::debug!(bucket = bucket.name, size = bucket.size, path = %path.display(), "Icon written");
        set.icons.push(GeneratedIcon { bucket, path });
    }
    Ok(set)
}

/// Produce the full launcher icon set for `source` under `res_dir`.
pub fn generate_icon_set(source: &Path, res_dir: &Path) -> Result<IconSet> {
    let icon = probe_icon(source)?;
    if !icon.is_square() {
        let (w, h) = icon.dimensions();
        tracing::info!(width = w, height = h, "Icon is not square, padding with transparency");
    }
    write_icons(render_icons(&icon), res_dir)
}
