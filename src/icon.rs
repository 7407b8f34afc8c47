//! Icon source decoding.
//!
//! Shell icons are small fixed-size RGBA bitmaps; anything the host hands
//! us is decoded and resized to that. A source that fails to decode falls
//! back to a placeholder square instead of failing `enable` — only the
//! shell registration itself is fatal.

use std::path::PathBuf;

use tracing::warn;

/// Edge length of the registered shell icon, in pixels.
pub const ICON_SIZE: u32 = 16;

/// Where the icon bitmap comes from.
#[derive(Debug, Clone)]
pub enum IconSource {
    /// An image file on disk (ICO, PNG, anything the `image` crate reads).
    Path(PathBuf),
    /// Raw RGBA pixels, tightly packed.
    Rgba {
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
}

/// Decoded, size-normalized RGBA icon ready for shell registration.
#[derive(Debug, Clone)]
pub struct RgbaIcon {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RgbaIcon {
    /// Solid placeholder used when a source cannot be decoded.
    pub fn placeholder() -> Self {
        let data = (0..ICON_SIZE * ICON_SIZE)
            .flat_map(|_| [0x33, 0x99, 0xFF, 0xFF])
            .collect();
        Self {
            data,
            width: ICON_SIZE,
            height: ICON_SIZE,
        }
    }
}

impl IconSource {
    /// Decode into a normalized RGBA bitmap, falling back to the
    /// placeholder on any decode failure.
    pub fn decode(&self) -> RgbaIcon {
        match self.try_decode() {
            Ok(icon) => icon,
            Err(err) => {
                warn!("failed to decode icon source, using placeholder: {err}");
                RgbaIcon::placeholder()
            }
        }
    }

    fn try_decode(&self) -> Result<RgbaIcon, image::ImageError> {
        let img = match self {
            IconSource::Path(path) => image::open(path)?,
            IconSource::Rgba {
                data,
                width,
                height,
            } => {
                if *width == ICON_SIZE && *height == ICON_SIZE && data.len() == (ICON_SIZE * ICON_SIZE * 4) as usize {
                    // Already the right shape; no resample needed.
                    return Ok(RgbaIcon {
                        data: data.clone(),
                        width: *width,
                        height: *height,
                    });
                }
                let buf = image::RgbaImage::from_raw(*width, *height, data.clone()).ok_or_else(
                    || {
                        image::ImageError::Parameter(image::error::ParameterError::from_kind(
                            image::error::ParameterErrorKind::DimensionMismatch,
                        ))
                    },
                )?;
                image::DynamicImage::ImageRgba8(buf)
            }
        };

        let img = img.resize_exact(ICON_SIZE, ICON_SIZE, image::imageops::FilterType::Lanczos3);
        let rgba = img.to_rgba8();
        Ok(RgbaIcon {
            data: rgba.into_raw(),
            width: ICON_SIZE,
            height: ICON_SIZE,
        })
    }
}
