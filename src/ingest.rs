//! Collecting image files from user-supplied paths.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Accepted image extensions, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Expand files and folders into a list of image files.
///
/// Files named explicitly are taken as-is. Folders are walked recursively in
/// sorted order and filtered by extension. Duplicates are dropped, keeping
/// the first occurrence. Unreadable or missing paths are skipped, and
/// symlinked folders inside a walked folder are not followed.
pub fn collect_images<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut found = Vec::new();
            walk_dir(path, &mut found);
            for file in found {
                if seen.insert(file.clone()) {
                    images.push(file);
                }
            }
        } else if path.is_file() {
            if seen.insert(path.to_path_buf()) {
                images.push(path.to_path_buf());
            }
        } else {
            warn!(path = %path.display(), "Skipping missing path");
        }
    }

    debug!(count = images.len(), "Collected images");
    images
}

fn walk_dir(dir: &Path, found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot read folder");
            return;
        }
    };

    // Symlinked folders are not descended into, so link cycles terminate.
    let mut children: Vec<(PathBuf, bool)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let file_type = e.file_type().ok()?;
            if file_type.is_symlink() && e.path().is_dir() {
                debug!(path = %e.path().display(), "Skipping symlinked folder");
                return None;
            }
            Some((e.path(), file_type.is_dir()))
        })
        .collect();
    children.sort();

    for (path, is_dir) in children {
        if is_dir {
            walk_dir(&path, found);
        } else if is_supported_image(&path) {
            found.push(path);
        }
    }
}
