//! Zoom levels are not reported by the renderer; they are read back from the
//! `zoom<N>` subdirectories it leaves in the output directory.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::ZoomScanError;

/// Name prefix of a zoom level directory.
pub const ZOOM_PREFIX: &str = "zoom";

/// The lowest and highest zoom level found in an output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    /// Lowest zoom level.
    pub min: u32,
    /// Highest zoom level.
    pub max: u32,
}

/// Parse the level out of a directory name.
///
/// `Ok(None)` for names without the prefix, an error for prefixed names
/// whose remainder is not a non-negative integer.
pub fn parse_zoom_level(name: &str) -> Result<Option<u32>, ZoomScanError> {
    let Some(suffix) = name.strip_prefix(ZOOM_PREFIX) else {
        return Ok(None);
    };
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ZoomScanError::BadSuffix(name.to_string()));
    }
    suffix
        .parse()
        .map(Some)
        .map_err(|_| ZoomScanError::BadSuffix(name.to_string()))
}

/// List the zoom levels present as direct children of `dir`.
///
/// Entries without the `zoom` prefix are ignored. The result is never
/// empty: a directory with no zoom levels, or no directory at all, is an
/// error.
pub fn list_zoom_levels(dir: &Path) -> Result<BTreeSet<u32>, ZoomScanError> {
    let unreadable = |source| ZoomScanError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut levels = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let name = entry.file_name();
        if let Some(level) = parse_zoom_level(&name.to_string_lossy())? {
            levels.insert(level);
        }
    }

    if levels.is_empty() {
        return Err(ZoomScanError::Empty(dir.to_path_buf()));
    }
    tracing::debug!(dir = %dir.display(), ?levels, "scanned zoom levels");
    Ok(levels)
}

/// The min/max zoom level present in `dir`.
pub fn zoom_range(dir: &Path) -> Result<ZoomRange, ZoomScanError> {
    let levels = list_zoom_levels(dir)?;
    match (levels.first(), levels.last()) {
        (Some(&min), Some(&max)) => Ok(ZoomRange { min, max }),
        _ => Err(ZoomScanError::Empty(dir.to_path_buf())),
    }
}
