use crate::config::SUPPORTED_IMAGE_EXTENSIONS;
use crate::error::Result;
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Formatting helpers for paths in log lines.
pub trait PathExt {
    fn format_for_log(&self) -> String;
}

impl PathExt for Path {
    fn format_for_log(&self) -> String {
        format!("'{}'", self.display())
    }
}

/// Returns true when the path has a supported picture extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext_str| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext_str.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Collation for directory listings: case-insensitive natural order with a
/// byte-order tie break, so equal-looking names still sort the same way
/// on every scan.
pub fn compare_names(a: &OsStr, b: &OsStr) -> Ordering {
    let (a, b) = (a.to_string_lossy(), b.to_string_lossy());
    natord::compare_ignore_case(&a, &b).then_with(|| a.cmp(&b))
}

/// Lists the supported, non-hidden picture files of `dir` as bare file
/// names, sorted by [`compare_names`].
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut names: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| !is_hidden(&entry.file_name()))
        .filter(|entry| {
            let path = entry.path();
            path.is_file() && is_supported_image(&path)
        })
        .map(|entry| PathBuf::from(entry.file_name()))
        .collect();

    names.sort_by(|a, b| compare_names(a.as_os_str(), b.as_os_str()));
    Ok(names)
}

/// Makes `path` absolute against the working directory and folds `.` and
/// `..` lexically. Symlinks are left alone.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn three_significant_digits(value: f64) -> String {
    let decimals = if value >= 100.0 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Human readable file size: bytes up to 1 KiB, then KB/MB/GB with three
/// significant digits.
pub fn format_file_size(size: u64) -> String {
    const ONE_K: u64 = 1024;
    const ONE_M: u64 = 1024 * 1024;
    const ONE_G: u64 = 1024 * 1024 * 1024;

    if size <= ONE_K {
        format!("{} B", size)
    } else if size <= ONE_M {
        format!("{} KB", three_significant_digits(size as f64 / ONE_K as f64))
    } else if size <= ONE_G {
        format!("{} MB", three_significant_digits(size as f64 / ONE_M as f64))
    } else {
        format!("{} GB", three_significant_digits(size as f64 / ONE_G as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn supported_extensions_ignore_case() {
        assert!(is_supported_image(Path::new("a.JPG")));
        assert!(is_supported_image(Path::new("/x/b.webp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn collation_is_natural_and_total() {
        let mut names = vec!["img10.png", "IMG2.png", "img2.png", "img1.png"];
        names.sort_by(|a, b| compare_names(OsStr::new(a), OsStr::new(b)));
        assert_eq!(names, vec!["img1.png", "IMG2.png", "img2.png", "img10.png"]);
    }

    #[test]
    fn scan_skips_hidden_unsupported_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", ".hidden.png", "readme.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("folder.png")).unwrap();

        let names = scan_directory(dir.path()).unwrap();
        assert_eq!(names, vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")]);
    }

    #[test]
    fn scan_of_missing_directory_fails() {
        assert!(scan_directory(Path::new("/no/such/dir/anywhere")).is_err());
    }

    #[test]
    fn normalize_folds_dot_components() {
        let normalized = normalize_path(Path::new("/a/b/./c/../d.png"));
        assert_eq!(normalized, PathBuf::from("/a/b/d.png"));
    }

    #[test]
    fn file_size_text() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1024), "1024 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(123 * 1024 + 400), "123 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
