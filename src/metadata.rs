//! Attribute report for the current file and picture.

use crate::file_utils::format_file_size;
use crate::image_cache::CacheEntry;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

const TIME_FORMAT: &str = "%Y-%m-%d, %H:%M:%S";

/// Greatest common divisor, or 0 when either side is 0.
pub fn gcd(a: u32, b: u32) -> u32 {
    if a == 0 || b == 0 {
        return 0;
    }
    let (mut a, mut b) = (a, b);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Simplified width:height ratio; `1:1` for degenerate sizes.
pub fn aspect_ratio(width: u32, height: u32) -> (u32, u32) {
    match gcd(width, height) {
        0 => (1, 1),
        divisor => (width / divisor, height / divisor),
    }
}

/// Filesystem facts about the current path.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttributes {
    pub name: String,
    pub size: u64,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
    pub accessed: Option<DateTime<Local>>,
    /// Codec format name, when known.
    pub format: Option<String>,
}

/// Facts about the decoded picture.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttributes {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: (u32, u32),
    pub bits_per_pixel: u16,
    /// Only reported for files on disk whose count is not 1.
    pub frame_count: Option<usize>,
    /// Zoom factor of the display, 1.0 = 100%.
    pub scale: f64,
}

/// Snapshot returned by the attribute query. Both parts are absent when
/// nothing is shown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeReport {
    pub file: Option<FileAttributes>,
    pub image: Option<ImageAttributes>,
}

fn local_time(time: std::io::Result<SystemTime>) -> Option<DateTime<Local>> {
    time.ok().map(DateTime::<Local>::from)
}

impl AttributeReport {
    pub fn collect(path: Option<&Path>, name: &str, cache: &CacheEntry, scale: f64) -> Self {
        let file_exists = path.map(Path::exists).unwrap_or(false);

        let file = path
            .and_then(|path| fs::metadata(path).ok())
            .filter(|metadata| metadata.is_file())
            .map(|metadata| FileAttributes {
                name: name.to_string(),
                size: metadata.len(),
                created: local_time(metadata.created()),
                modified: local_time(metadata.modified()),
                accessed: local_time(metadata.accessed()),
                format: Some(cache.format().to_string()).filter(|format| !format.is_empty()),
            });

        let image = cache.dimensions().map(|(width, height)| ImageAttributes {
            width,
            height,
            aspect_ratio: aspect_ratio(width, height),
            bits_per_pixel: cache.bits_per_pixel(),
            frame_count: (file_exists && cache.frame_count() != 1).then_some(cache.frame_count()),
            scale,
        });

        Self { file, image }
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.image.is_none()
    }
}

fn format_time(time: Option<DateTime<Local>>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for AttributeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = Vec::new();

        if let Some(file) = &self.file {
            lines.push(format!("File Name: {}", file.name));
            lines.push(format!(
                "File Size: {} ({} Bytes)",
                format_file_size(file.size),
                file.size
            ));
            lines.push(format!("Created Time: {}", format_time(file.created)));
            lines.push(format!("Modified Time: {}", format_time(file.modified)));
            lines.push(format!("Last Read: {}", format_time(file.accessed)));
            if let Some(format) = &file.format {
                lines.push(format!("Image Format: {}", format));
            }
        }

        if let Some(image) = &self.image {
            if image.bits_per_pixel >= 16 {
                lines.push("Color Count: True color".to_string());
            }
            lines.push(format!("Depth: {}", image.bits_per_pixel));
            let (w, h) = image.aspect_ratio;
            lines.push(format!(
                "Size: {} x {} ({}:{})",
                image.width, image.height, w, h
            ));
            if let Some(count) = image.frame_count {
                lines.push(format!("Frame Count: {}", count));
            }
            let percent = (image.scale * 10000.0).round() / 100.0;
            lines.push(format!("Current Scale: {}%", percent));
        }

        write!(f, "{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_basics() {
        assert_eq!(gcd(1920, 1080), 120);
        assert_eq!(gcd(7, 3), 1);
        assert_eq!(gcd(0, 5), 0);
        assert_eq!(gcd(5, 0), 0);
    }

    #[test]
    fn degenerate_sizes_report_one_to_one() {
        assert_eq!(aspect_ratio(0, 100), (1, 1));
        assert_eq!(aspect_ratio(100, 0), (1, 1));
        assert_eq!(aspect_ratio(0, 0), (1, 1));
        assert_eq!(aspect_ratio(1920, 1080), (16, 9));
    }

    #[test]
    fn nothing_shown_gives_empty_report() {
        let report = AttributeReport::collect(None, "", &CacheEntry::empty(), 1.0);
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "");
    }

    #[test]
    fn image_section_rendering() {
        let report = AttributeReport {
            file: None,
            image: Some(ImageAttributes {
                width: 640,
                height: 480,
                aspect_ratio: (4, 3),
                bits_per_pixel: 24,
                frame_count: Some(12),
                scale: 0.5,
            }),
        };
        let text = report.to_string();
        assert!(text.contains("Color Count: True color"));
        assert!(text.contains("Size: 640 x 480 (4:3)"));
        assert!(text.contains("Frame Count: 12"));
        assert!(text.ends_with("Current Scale: 50%"));
    }
}
