//! Codec adapter: turns a path into a still picture or an animation.

use crate::error::{Result, SessionError};
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader, RgbaImage};
use log::{debug, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// GIF delay of 0 means "use the default".
const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);
const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);
/// Upper bound on decoded RGBA bytes kept for one animation.
const MAX_ANIMATION_BYTES: usize = 512 * 1024 * 1024;

/// One decoded animation frame and how long it stays on screen.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub image: Arc<RgbaImage>,
    pub delay: Duration,
}

/// Result of decoding one path.
#[derive(Debug, Clone)]
pub struct DecodedPicture {
    /// Still image, or the first frame of an animation.
    pub image: Arc<RgbaImage>,
    /// All frames, present only when there is more than one.
    pub frames: Option<Vec<AnimationFrame>>,
    /// Codec-reported format name, e.g. "GIF".
    pub format: String,
    pub bits_per_pixel: u16,
    /// 1 for stills, 0 when the codec cannot tell.
    pub frame_count: usize,
}

impl DecodedPicture {
    /// Wraps a single still image.
    pub fn still(image: RgbaImage, format: impl Into<String>) -> Self {
        Self {
            image: Arc::new(image),
            frames: None,
            format: format.into(),
            bits_per_pixel: 32,
            frame_count: 1,
        }
    }

    /// Wraps a multi-frame animation. The first frame becomes the still image.
    pub fn animated(frames: Vec<AnimationFrame>, format: impl Into<String>) -> Option<Self> {
        let first = frames.first()?.image.clone();
        let frame_count = frames.len();
        Some(Self {
            image: first,
            frames: (frame_count > 1).then_some(frames),
            format: format.into(),
            bits_per_pixel: 32,
            frame_count,
        })
    }
}

/// The external codec. Implementations must not panic on bad input.
pub trait PictureDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedPicture>;
}

/// [`PictureDecoder`] backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_uppercase())
        .unwrap_or_else(|| format!("{:?}", format).to_uppercase())
}

fn frame_delay(frame: &image::Frame) -> Duration {
    let (numer, denom) = frame.delay().numer_denom_ms();
    let millis = if denom == 0 { 0 } else { numer / denom };
    if millis == 0 {
        DEFAULT_FRAME_DELAY
    } else {
        Duration::from_millis(millis as u64).max(MIN_FRAME_DELAY)
    }
}

/// Decodes frames until the container ends or their RGBA size would pass
/// `budget` bytes. The first frame is always kept.
fn collect_frames<'a>(
    decoder: impl AnimationDecoder<'a>,
    budget: usize,
) -> Result<Vec<AnimationFrame>> {
    let mut frames = Vec::new();
    let mut total_bytes = 0usize;

    for frame in decoder.into_frames() {
        let frame = frame?;
        let delay = frame_delay(&frame);
        let buffer = frame.into_buffer();
        let bytes = buffer.as_raw().len();

        if !frames.is_empty() && total_bytes.saturating_add(bytes) > budget {
            warn!(
                "Animation exceeds {} MiB after {} frames, dropping the rest",
                budget / (1024 * 1024),
                frames.len()
            );
            break;
        }
        total_bytes += bytes;
        frames.push(AnimationFrame {
            image: Arc::new(buffer),
            delay,
        });
    }

    debug!(
        "Decoded {} frame(s), {:.1} MiB",
        frames.len(),
        total_bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(frames)
}

fn open_buffered(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| SessionError::DecodeFailure(format!("{}: {}", path.display(), e)))
}

/// Decodes every frame of a possibly animated container.
/// Returns `Ok(None)` when the container holds a single still frame.
fn decode_frames(path: &Path, format: ImageFormat) -> Result<Option<Vec<AnimationFrame>>> {
    let frames = match format {
        ImageFormat::Gif => {
            let decoder = image::codecs::gif::GifDecoder::new(open_buffered(path)?)?;
            collect_frames(decoder, MAX_ANIMATION_BYTES)?
        }
        ImageFormat::WebP => {
            let decoder = image::codecs::webp::WebPDecoder::new(open_buffered(path)?)?;
            if !decoder.has_animation() {
                return Ok(None);
            }
            collect_frames(decoder, MAX_ANIMATION_BYTES)?
        }
        ImageFormat::Png => {
            let decoder = image::codecs::png::PngDecoder::new(open_buffered(path)?)?;
            if !decoder.is_apng()? {
                return Ok(None);
            }
            collect_frames(decoder.apng()?, MAX_ANIMATION_BYTES)?
        }
        _ => return Ok(None),
    };

    Ok((frames.len() > 1).then_some(frames))
}

impl PictureDecoder for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedPicture> {
        let reader = ImageReader::open(path)
            .map_err(|e| SessionError::DecodeFailure(format!("{}: {}", path.display(), e)))?
            .with_guessed_format()
            .map_err(|e| SessionError::DecodeFailure(format!("{}: {}", path.display(), e)))?;

        let format = reader.format().ok_or_else(|| {
            SessionError::DecodeFailure(format!("{}: unknown format", path.display()))
        })?;

        if let Some(frames) = decode_frames(path, format)? {
            debug!("Decoded {} frames from {}", frames.len(), path.display());
            return DecodedPicture::animated(frames, format_name(format)).ok_or_else(|| {
                SessionError::DecodeFailure(format!("{}: no frames", path.display()))
            });
        }

        let image: DynamicImage = reader.decode()?;
        let bits_per_pixel = image.color().bits_per_pixel();
        let mut picture = DecodedPicture::still(image.to_rgba8(), format_name(format));
        picture.bits_per_pixel = bits_per_pixel;
        Ok(picture)
    }
}
