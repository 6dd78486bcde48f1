//! Content sniffing for input files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read from the head of a file for magic-number detection.
pub const SNIFF_LEN: usize = 8192;

/// Detect a file's MIME type from its leading bytes.
///
/// Returns `Ok(None)` when the content matches no known signature.
pub fn sniff_mime(path: &Path) -> io::Result<Option<&'static str>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(infer::get(&head).map(|kind| kind.mime_type()))
}

/// Whether the file's content is a PDF, regardless of its extension.
pub fn is_pdf(path: &Path) -> bool {
    matches!(sniff_mime(path), Ok(Some("application/pdf")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn recognizes_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.pdf");
        let fake = dir.path().join("fake.pdf");
        fs::write(&real, b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();
        fs::write(&fake, b"<html>not a pdf</html>").unwrap();

        assert!(is_pdf(&real));
        assert!(!is_pdf(&fake));
        assert!(!is_pdf(&dir.path().join("missing.pdf")));
    }
}
