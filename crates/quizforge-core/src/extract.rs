//! Plain-text extraction from uploaded documents.
//!
//! Tries the structured PDF reader first and falls back to decoding the
//! raw bytes as text. Extraction never fails: a document nothing can be
//! read from becomes the empty string, which the rest of the pipeline
//! handles as "no questions".

use crate::model::{Document, MediaKind};

/// Lossy decodes are rejected once this share of chars are U+FFFD.
const MAX_REPLACEMENT_RATIO: f64 = 0.1;

/// Extract plain text from a document.
pub fn extract_text(document: &Document) -> String {
    let try_pdf = document.kind == MediaKind::Pdf || document.bytes.starts_with(b"%PDF-");

    if try_pdf {
        match extract_pdf(&document.bytes) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!("PDF extracted with pdf_extract: {} chars", text.len());
                return text;
            }
            Ok(_) => {
                tracing::debug!("pdf_extract returned empty text, trying plain decode");
            }
            Err(e) => {
                tracing::debug!("pdf_extract failed: {e}, trying plain decode");
            }
        }
    }

    decode_plain(&document.bytes).unwrap_or_default()
}

fn extract_pdf(bytes: &[u8]) -> anyhow::Result<String> {
    // pdf_extract can panic on malformed PDFs
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(anyhow::anyhow!("PDF extraction failed: {e}")),
        Err(_) => Err(anyhow::anyhow!("PDF extraction panicked (malformed PDF)")),
    }
}

fn decode_plain(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let lossy = String::from_utf8_lossy(bytes);
            let total = lossy.chars().count();
            let replaced = lossy.chars().filter(|&c| c == '\u{FFFD}').count();
            if total == 0 || replaced as f64 / total as f64 >= MAX_REPLACEMENT_RATIO {
                tracing::debug!("rejecting binary content ({replaced}/{total} undecodable)");
                return None;
            }
            lossy.into_owned()
        }
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
