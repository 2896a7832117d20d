//! Camera event logs.
//!
//! The camera trigger log starts with a fixed header. Each event row carries
//! the receiver's own 8-character image tag, which is replaced by the frame
//! name written by the camera so photos can be matched to positions.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Result, SurveyError};

/// Header rows dropped from every camera log.
pub const CAMERA_LOG_HEADER_ROWS: usize = 6;
/// Width of the tag replaced on every event row.
const TAG_WIDTH: usize = 8;

/// Rewrite the tag of each event row as `DSC{n:05}.JPG`, `n` starting at 1.
///
/// Rows shorter than the tag are kept verbatim.
pub fn rename_camera_events(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len());
    for (i, row) in contents
        .split_inclusive('\n')
        .skip(CAMERA_LOG_HEADER_ROWS)
        .enumerate()
    {
        let rest = row.char_indices().nth(TAG_WIDTH).map(|(at, _)| &row[at..]);
        match rest {
            Some(rest) => {
                out.push_str(&format!("DSC{:05}.JPG", i + 1));
                out.push_str(rest);
            }
            None if row.chars().count() == TAG_WIDTH => {
                out.push_str(&format!("DSC{:05}.JPG", i + 1));
            }
            None => {
                warn!("[Cameras] Row {} is shorter than the image tag, left as is", i + 1);
                out.push_str(row);
            }
        }
    }
    out
}

/// Output path for a renamed log: `name.txt` becomes `name__.txt`.
pub fn renamed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}__.txt"))
}

/// Rename the events of one camera log file and write the result next to it.
pub fn rename_camera_log(input: &Path) -> Result<PathBuf> {
    let contents = fs::read_to_string(input).map_err(|e| SurveyError::io(input, e))?;
    let output = renamed_path(input);
    fs::write(&output, rename_camera_events(&contents)).map_err(|e| SurveyError::io(&output, e))?;
    Ok(output)
}
