use std::io;
use std::path::{Path, PathBuf};

/// The static front end copied into every world's web directory.
pub const COMPANION_ASSETS: [&str; 3] = ["index.html", "style.css", "script.js"];

/// Copy the companion assets from `asset_dir` into `www_dir`, replacing
/// existing copies. Returns the written paths.
///
/// An asset that already is the destination file is left untouched.
/// On failure the error carries the path that could not be copied.
pub fn copy_companion_assets(
    asset_dir: &Path,
    www_dir: &Path,
) -> Result<Vec<PathBuf>, (PathBuf, io::Error)> {
    COMPANION_ASSETS
        .iter()
        .map(|name| {
            let from = asset_dir.join(name);
            let to = www_dir.join(name);
            if same_file(&from, &to) {
                tracing::debug!(path = %to.display(), "asset already in place");
                return Ok(to);
            }
            std::fs::copy(&from, &to)
                .map(|_| to)
                .map_err(|err| (from, err))
        })
        .collect()
}

// Copying a file onto itself truncates it.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
