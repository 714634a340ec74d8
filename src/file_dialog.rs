use crate::{ProfilerError, ProfilerResult};

use rfd::AsyncFileDialog;
use std::path::PathBuf;

/// Opens a native file dialog asynchronously, filtered to CSV files.
///
/// # Returns
///
/// - `Ok(PathBuf)`: The path to the selected file.
/// - `Err(ProfilerError::FileNotFound)`: The user cancelled the dialog.
pub async fn open_file() -> ProfilerResult<PathBuf> {
    let opt_file = AsyncFileDialog::new()
        .set_title("Select a data file")
        .add_filter("CSV", &["csv"])
        .add_filter("All files", &["*"])
        .pick_file()
        .await;

    opt_file
        .map(|file| file.path().to_path_buf())
        .ok_or_else(|| ProfilerError::FileNotFound(PathBuf::new()))
}
