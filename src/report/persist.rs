//! Writing a rendered report to disk.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use super::{Report, render_workbook};

/// Errors that can occur while persisting a report.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot render workbook")]
    Render(#[from] XlsxError),

    #[error("cannot write `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The alternate path offered when `path` cannot be written:
/// `report.xlsx` becomes `report_copy.xlsx`.
#[must_use]
pub fn fallback_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "report".into(), |stem| stem.to_string_lossy());
    let extension = path
        .extension()
        .map_or_else(|| "xlsx".into(), |ext| ext.to_string_lossy());
    path.with_file_name(format!("{stem}_copy.{extension}"))
}

/// Writes `bytes` to `path` through a temporary sibling file.
///
/// The target is replaced by a rename, so it is either left untouched or
/// holds the complete contents. The temporary file is removed whenever the
/// write or the rename fails.
///
/// # Errors
///
/// Returns [`PersistenceError::Write`] naming `path` if the temporary file
/// cannot be written or renamed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let write_error = |source| PersistenceError::Write {
        path: path.to_owned(),
        source,
    };

    let name = path
        .file_name()
        .map_or_else(|| "report".into(), |name| name.to_string_lossy());
    let temp = path.with_file_name(format!(".{name}.tmp"));

    let result = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, path));
    if let Err(source) = result {
        match fs::remove_file(&temp) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => {
                tracing::debug!(path = %temp.display(), %err, "cannot remove temporary file");
            }
            _ => {}
        }
        return Err(write_error(source));
    }
    Ok(())
}

/// Renders `report` and writes it to `path`.
///
/// If the write fails, `confirm` is asked once whether to use the path given
/// by [`fallback_path`] instead. Returns the path actually written.
///
/// # Errors
///
/// - [`PersistenceError::Render`] if the workbook cannot be built.
/// - [`PersistenceError::Write`] for `path` if the write fails and the
///   fallback is declined, or for the fallback if that write fails too.
pub fn write_report(
    report: &Report,
    path: &Path,
    confirm: impl FnOnce(&Path, &PersistenceError) -> bool,
) -> Result<PathBuf, PersistenceError> {
    let bytes = render_workbook(report)?;

    let err = match write_atomic(path, &bytes) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "wrote report");
            return Ok(path.to_owned());
        }
        Err(err) => err,
    };

    let fallback = fallback_path(path);
    tracing::warn!(path = %path.display(), fallback = %fallback.display(), "cannot write report");
    if !confirm(&fallback, &err) {
        return Err(err);
    }

    write_atomic(&fallback, &bytes)?;
    tracing::info!(path = %fallback.display(), "wrote report to fallback path");
    Ok(fallback)
}
