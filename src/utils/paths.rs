//! Input discovery and output naming.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Hex characters of the path digest kept in output filenames.
pub const HASH_PREFIX_LEN: usize = 12;

/// Whether the path ends in `.pdf`, ignoring case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Recursively collect PDF files under `dir`, sorted for a stable batch order.
///
/// Unreadable directory entries are skipped with a warning.
pub fn discover_pdfs(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_pdf_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

/// `<stem>_<first 12 hex of sha256(path)>.json`.
///
/// Derived only from the path string, so reruns overwrite the same file and
/// two `report.pdf` files in different folders never collide.
pub fn output_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let digest = hex::encode(Sha256::digest(path.to_string_lossy().as_bytes()));
    format!("{}_{}.json", stem, &digest[..HASH_PREFIX_LEN])
}
