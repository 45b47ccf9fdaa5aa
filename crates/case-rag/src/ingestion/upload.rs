//! Upload directory for case PDFs

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::types::Document;

/// Name used when an upload arrives without a usable filename
const FALLBACK_NAME: &str = "upload.pdf";

/// Stores uploaded PDFs under a single directory.
///
/// Names are sanitized to a single path component. A second upload with the
/// same sanitized name overwrites the first; the write goes through a temp
/// file and a rename so a half-written PDF is never visible.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open (and create) the upload directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Upload directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist uploaded bytes and describe the stored document
    pub fn save(&self, raw_name: &str, data: &[u8]) -> Result<Document> {
        let filename = sanitize_filename(raw_name)?;
        let dest = self.dir.join(&filename);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.flush()?;
        tmp.persist(&dest).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved upload {} ({} bytes)", dest.display(), data.len());
        Ok(Document::new(filename, dest, data))
    }
}

/// Reduce an uploaded filename to a safe single component ending in `.pdf`
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return Ok(FALLBACK_NAME.to_string());
    }

    if !cleaned.to_ascii_lowercase().ends_with(".pdf") || cleaned.len() == ".pdf".len() {
        return Err(Error::UnsupportedFileType(format!(
            "{} (only PDF files are accepted)",
            cleaned
        )));
    }

    Ok(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd.pdf").unwrap(), "passwd.pdf");
        assert_eq!(sanitize_filename("C:\\cases\\Acme.PDF").unwrap(), "Acme.PDF");
        assert_eq!(sanitize_filename("Q3 review (final).pdf").unwrap(), "Q3_review__final_.pdf");
        assert_eq!(sanitize_filename(".hidden.pdf").unwrap(), "hidden.pdf");
        assert_eq!(sanitize_filename("").unwrap(), FALLBACK_NAME);
    }

    #[test]
    fn test_sanitize_rejects_non_pdf() {
        assert!(matches!(
            sanitize_filename("case.docx"),
            Err(Error::UnsupportedFileType(_))
        ));
        assert!(matches!(
            sanitize_filename("..pdf"),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_same_name_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().join("uploads")).unwrap();

        let first = store.save("case.pdf", b"%PDF-1.4 first").unwrap();
        let second = store.save("case.pdf", b"%PDF-1.4 second").unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(std::fs::read(&second.path).unwrap(), b"%PDF-1.4 second");
        assert_ne!(first.content_hash, second.content_hash);

        let files: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(files.len(), 1, "temp files must not be left behind");
    }
}
