//! Interchange file helpers.
//!
//! # Invariants
//! - Files are UTF-8 text.
//! - Saving writes a sibling temp file first and renames it over the target,
//!   so a failed save never leaves a truncated export behind.

use super::CsvResult;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Default file name offered for exports.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "routines.csv";

/// Writes interchange text to `path`, replacing any existing file.
pub fn save_csv_to_file(csv_text: &str, path: impl AsRef<Path>) -> CsvResult<()> {
    let path = path.as_ref();
    let staging = staging_path(path);

    let result = fs::write(&staging, csv_text.as_bytes()).and_then(|()| fs::rename(&staging, path));
    match result {
        Ok(()) => {
            info!(
                "event=csv_save module=interchange status=ok bytes={}",
                csv_text.len()
            );
            Ok(())
        }
        Err(err) => {
            let _ = fs::remove_file(&staging);
            error!(
                "event=csv_save module=interchange status=error error_code=write_failed error={}",
                err
            );
            Err(err.into())
        }
    }
}

/// Reads interchange text from `path`.
pub fn load_csv_from_file(path: impl AsRef<Path>) -> CsvResult<String> {
    let bytes = fs::read(path.as_ref())?;
    let text = String::from_utf8(bytes)?;
    info!(
        "event=csv_load module=interchange status=ok bytes={}",
        text.len()
    );
    Ok(text)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_else(|| DEFAULT_EXPORT_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}
