//! Opening whatever the command line names.

use crate::file_utils::PathExt;
use crate::services::SessionService;
use log::warn;
use std::ffi::OsString;
use std::path::PathBuf;

/// Non-flag arguments that name existing files, in order.
pub fn startup_paths_from_args<I>(args: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .filter_map(|arg| {
            let arg_str = arg.to_string_lossy();
            if arg_str.starts_with('-') {
                None
            } else {
                Some(PathBuf::from(arg))
            }
        })
        .filter(|path| {
            let is_file = path.is_file();
            if !is_file {
                warn!("Skipping {}: not a file", path.format_for_log());
            }
            is_file
        })
        .collect()
}

/// Opens one path as a directory browse, several as an explicit list.
/// Returns false when there was nothing to open.
pub fn configure_startup_opening(session: &mut SessionService, paths: &[PathBuf]) -> bool {
    if paths.is_empty() {
        return false;
    }
    session.open_explicit_list(paths);
    true
}
