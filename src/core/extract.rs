use thiserror::Error;

/// Text pulled out of an uploaded or fetched document. Pages are split on
/// form feeds when the source carries them, otherwise the whole text is one
/// page.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub pages: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The bytes could not be decoded at all (corrupt or unsupported format).
    #[error("document could not be read: {0}")]
    Unreadable(String),
    /// The document decoded fine but carries no text layer (e.g. a scan).
    #[error("document contains no extractable text")]
    Empty,
}

pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractError>;
}

/// Passthrough extractor for plain-text uploads. PDF extraction lives behind
/// the same trait in the ingestion service.
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Empty);
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::Unreadable(e.to_string()))?
            .to_string();
        if text.trim().is_empty() {
            return Err(ExtractError::Empty);
        }
        let pages: Vec<String> = text
            .split('\u{c}')
            .filter(|p| !p.trim().is_empty())
            .map(|p| p.to_string())
            .collect();
        Ok(ExtractedDocument { text, pages })
    }
}
