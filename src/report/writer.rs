use std::path::Path;

use tracing::info;

use crate::error::ReportError;

use super::summary::RunSummary;

/// Writes the summary as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns an error when the summary cannot be serialized or written.
pub async fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), ReportError> {
    let json = serde_json::to_vec_pretty(summary)
        .map_err(|err| ReportError::Serialize { source: err })?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| ReportError::WriteSummary {
                path: path.to_path_buf(),
                source: err,
            })?;
    }
    tokio::fs::write(path, json)
        .await
        .map_err(|err| ReportError::WriteSummary {
            path: path.to_path_buf(),
            source: err,
        })?;
    info!("Summary written to {}", path.display());
    Ok(())
}

/// Reads a summary previously produced by [`write_summary`].
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub async fn read_summary(path: &Path) -> Result<RunSummary, ReportError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ReportError::ReadSummary {
            path: path.to_path_buf(),
            source: err,
        })?;
    serde_json::from_slice(&bytes).map_err(|err| ReportError::ParseSummary {
        path: path.to_path_buf(),
        source: err,
    })
}
