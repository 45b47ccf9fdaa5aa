//! PDF loading: one text record per page, in document order

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::PageRecord;

/// PDF files start with this marker
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Default limit for the pdf-extract fallback
const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Loads PDFs into page records.
///
/// Text comes from lopdf page by page. When lopdf yields no text at all the
/// document is retried page by page with pdf-extract on a watchdog thread,
/// since pdf-extract can hang or panic on unusual fonts.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    fallback_timeout: Duration,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }
}

impl PdfLoader {
    /// Create a loader with the default fallback timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the pdf-extract fallback timeout
    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    /// Load a PDF from disk
    pub fn load(&self, path: &Path) -> Result<Vec<PageRecord>> {
        let data = std::fs::read(path).map_err(|e| {
            Error::load(path.display().to_string(), format!("Cannot read file: {}", e))
        })?;
        self.load_bytes(path, &data)
    }

    /// Load a PDF already in memory; `source` is recorded on every page
    pub fn load_bytes(&self, source: &Path, data: &[u8]) -> Result<Vec<PageRecord>> {
        let name = source.display().to_string();

        if !data.starts_with(PDF_MAGIC) {
            return Err(Error::load(&name, "Not a PDF file (missing %PDF- header)"));
        }

        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::load(&name, format!("Malformed PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(Error::load(&name, "Encrypted PDFs are not supported"));
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(Error::load(&name, "PDF has no pages"));
        }

        let mut pages: Vec<PageRecord> = page_numbers
            .iter()
            .map(|&page_number| {
                let text = match doc.extract_text(&[page_number]) {
                    Ok(raw) => cleanup_pdf_text(&raw),
                    Err(e) => {
                        tracing::debug!("lopdf could not extract page {} of {}: {}", page_number, name, e);
                        String::new()
                    }
                };
                PageRecord {
                    page_number,
                    text,
                    source: source.to_path_buf(),
                }
            })
            .collect();

        if !pages.iter().any(PageRecord::has_text) {
            tracing::warn!("lopdf extracted no text from {}, trying pdf-extract", name);
            let texts = self.extract_with_pdf_extract(&name, data)?;
            fill_from_fallback(&mut pages, &texts);
            if !pages.iter().any(PageRecord::has_text) {
                return Err(Error::load(
                    &name,
                    "No extractable text; the PDF may be scanned or image-only",
                ));
            }
        }

        tracing::debug!(
            "Loaded {} pages from {} ({} with text)",
            pages.len(),
            name,
            pages.iter().filter(|p| p.has_text()).count()
        );

        Ok(pages)
    }

    /// Per-page extraction with pdf-extract on a watchdog thread
    fn extract_with_pdf_extract(&self, name: &str, data: &[u8]) -> Result<Vec<String>> {
        let data = data.to_vec();
        self.watchdog(name, move || {
            pdf_extract::extract_text_from_mem_by_pages(&data).map_err(|e| e.to_string())
        })
    }

    /// Run `job` on its own thread, giving up after the fallback timeout.
    ///
    /// A panic inside `job` drops the sender and is reported as a crash.
    fn watchdog<T, F>(&self, name: &str, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> std::result::Result<T, String> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let _ = tx.send(job());
        });

        match rx.recv_timeout(self.fallback_timeout) {
            Ok(Ok(value)) => {
                let _ = handle.join();
                Ok(value)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(Error::load(name, format!("Text extraction failed: {}", e)))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own
                tracing::error!(
                    "pdf-extract timed out after {}ms on {}",
                    self.fallback_timeout.as_millis(),
                    name
                );
                Err(Error::load(
                    name,
                    format!(
                        "Text extraction timed out after {}ms",
                        self.fallback_timeout.as_millis()
                    ),
                ))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                tracing::error!("pdf-extract crashed on {}", name);
                Err(Error::load(name, "Text extraction crashed"))
            }
        }
    }
}

/// Copy fallback text onto the page records.
///
/// Texts are matched to pages by position. If the page counts disagree the
/// joined text is kept on page 1 so nothing is lost.
fn fill_from_fallback(pages: &mut [PageRecord], texts: &[String]) {
    if texts.len() == pages.len() {
        for (page, text) in pages.iter_mut().zip(texts) {
            page.text = cleanup_pdf_text(text);
        }
        return;
    }

    tracing::warn!(
        "pdf-extract returned {} pages but the PDF has {}; keeping all text on page 1",
        texts.len(),
        pages.len()
    );
    if let Some(first) = pages.first_mut() {
        first.text = cleanup_pdf_text(&texts.join("\n"));
    }
}

/// Normalize extracted PDF text.
///
/// Folds typographic ligatures, quotes and dashes to ASCII, drops NULs and
/// collapses blank lines.
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\0' => {}
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2212}' => out.push('-'),
            '\u{2014}' | '\u{2015}' => out.push_str("--"),
            '\u{2018}' | '\u{2019}' | '\u{201A}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => out.push('"'),
            '\u{2022}' => out.push_str("* "),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' => out.push(' '),
            _ => out.push(c),
        }
    }

    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_folds_typography() {
        let raw = "\u{FB01}nancial  \n\n\u{201C}growth\u{201D} \u{2013} 12%\0\n   \n";
        assert_eq!(cleanup_pdf_text(raw), "financial\n\"growth\" - 12%");
    }

    #[test]
    fn test_non_pdf_bytes_fail_with_load_error() {
        let loader = PdfLoader::new();
        let err = loader
            .load_bytes(Path::new("notes.pdf"), b"just some text, not a pdf")
            .unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_truncated_pdf_fails_with_load_error() {
        let loader = PdfLoader::new();
        let err = loader
            .load_bytes(Path::new("broken.pdf"), b"%PDF-1.5\n1 0 obj\n<< /Type /Catalog")
            .unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    fn blank_pages(n: u32) -> Vec<PageRecord> {
        (1..=n)
            .map(|page_number| PageRecord {
                page_number,
                text: String::new(),
                source: "case.pdf".into(),
            })
            .collect()
    }

    #[test]
    fn test_fallback_text_keeps_page_boundaries() {
        let mut pages = blank_pages(3);
        let texts = vec![
            "Intro".to_string(),
            "Revenue grew \u{2013} 12%".to_string(),
            "Outlook".to_string(),
        ];
        fill_from_fallback(&mut pages, &texts);

        assert_eq!(pages[0].text, "Intro");
        assert_eq!(pages[1].text, "Revenue grew - 12%");
        assert_eq!(pages[2].text, "Outlook");
    }

    #[test]
    fn test_fallback_page_count_mismatch_lands_on_first_page() {
        let mut pages = blank_pages(3);
        fill_from_fallback(&mut pages, &["one".to_string(), "two".to_string()]);

        assert_eq!(pages[0].text, "one\ntwo");
        assert!(!pages[1].has_text());
        assert!(!pages[2].has_text());
    }

    #[test]
    fn test_watchdog_returns_job_result() {
        let loader = PdfLoader::new().with_fallback_timeout(Duration::from_secs(5));
        let pages = loader
            .watchdog("case.pdf", || Ok(vec!["page one".to_string()]))
            .unwrap();
        assert_eq!(pages, vec!["page one".to_string()]);

        let err = loader
            .watchdog::<Vec<String>, _>("case.pdf", || Err("bad xref".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("bad xref"));
    }

    #[test]
    fn test_watchdog_times_out() {
        let loader = PdfLoader::new().with_fallback_timeout(Duration::from_millis(50));
        let err = loader
            .watchdog("slow.pdf", || {
                thread::sleep(Duration::from_millis(500));
                Ok(Vec::<String>::new())
            })
            .unwrap_err();

        assert!(matches!(err, Error::Load { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_watchdog_survives_panicking_extractor() {
        let loader = PdfLoader::new().with_fallback_timeout(Duration::from_secs(5));
        let err = loader
            .watchdog::<Vec<String>, _>("odd-fonts.pdf", || panic!("unsupported font"))
            .unwrap_err();

        assert!(matches!(err, Error::Load { .. }));
        assert!(err.to_string().contains("crashed"));
    }

    #[test]
    fn test_missing_file_fails_with_load_error() {
        let loader = PdfLoader::new();
        let err = loader.load(Path::new("/nonexistent/case.pdf")).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }
}
