//! Document text extraction — media-type dispatch over format-specific
//! extractors.
//!
//! The dispatcher is a registered-capability lookup: each supported
//! media type maps to a pure extractor function, so a new format is one
//! `register` call and never a new branch at a call site.

pub mod docx;
pub mod pdf;

use thiserror::Error;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported media type \"{0}\"")]
    UnsupportedFormat(String),

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// A format extractor: raw bytes in, plain UTF-8 text out. Pure and
/// stateless; no side effects beyond reading the input.
pub type ExtractorFn = fn(&[u8]) -> Result<String, ExtractError>;

/// Media type → extractor lookup. Built once at startup and shared
/// through `AppState`.
pub struct ExtractorRegistry {
    entries: Vec<(&'static str, ExtractorFn)>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        ExtractorRegistry {
            entries: Vec::new(),
        }
    }

    /// The registry with the two shipped formats: PDF and DOCX.
    pub fn with_default_formats() -> Self {
        let mut registry = Self::new();
        registry.register(PDF_MEDIA_TYPE, pdf::extract_text);
        registry.register(DOCX_MEDIA_TYPE, docx::extract_text);
        registry
    }

    /// Registers `extractor` for `media_type`, replacing any previous
    /// registration for the same type.
    pub fn register(&mut self, media_type: &'static str, extractor: ExtractorFn) {
        self.entries.retain(|(mt, _)| *mt != media_type);
        self.entries.push((media_type, extractor));
    }

    pub fn supports(&self, media_type: &str) -> bool {
        self.entries.iter().any(|(mt, _)| *mt == media_type)
    }

    pub fn supported_types(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(mt, _)| *mt).collect()
    }

    /// Routes `bytes` to the extractor registered for `media_type`.
    /// Exactly one extractor runs per call; an unregistered type fails
    /// with `UnsupportedFormat` and invokes none.
    pub fn extract(&self, media_type: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        let (_, extractor) = self
            .entries
            .iter()
            .find(|(mt, _)| *mt == media_type)
            .ok_or_else(|| ExtractError::UnsupportedFormat(media_type.to_string()))?;
        extractor(bytes)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_default_formats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static GUARD_CALLS: AtomicUsize = AtomicUsize::new(0);
    static ROUTED_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn guard_extractor(_bytes: &[u8]) -> Result<String, ExtractError> {
        GUARD_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok("guard".to_string())
    }

    fn routed_extractor(_bytes: &[u8]) -> Result<String, ExtractError> {
        ROUTED_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok("routed".to_string())
    }

    #[test]
    fn test_default_registry_supports_pdf_and_docx() {
        let registry = ExtractorRegistry::with_default_formats();
        assert!(registry.supports(PDF_MEDIA_TYPE));
        assert!(registry.supports(DOCX_MEDIA_TYPE));
        assert_eq!(registry.supported_types().len(), 2);
    }

    #[test]
    fn test_unsupported_type_fails_without_invoking_extractors() {
        let mut registry = ExtractorRegistry::new();
        registry.register("text/x-guard", guard_extractor);

        let err = registry.extract("image/png", b"\x89PNG").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref mt) if mt == "image/png"));
        assert_eq!(GUARD_CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_routes_to_exactly_one_extractor() {
        let mut registry = ExtractorRegistry::new();
        registry.register("text/x-routed", routed_extractor);

        let text = registry.extract("text/x-routed", b"anything").unwrap();
        assert_eq!(text, "routed");
        assert_eq!(ROUTED_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_is_additive() {
        let mut registry = ExtractorRegistry::with_default_formats();
        assert!(!registry.supports("text/plain"));
        registry.register("text/plain", |bytes| {
            String::from_utf8(bytes.to_vec())
                .map_err(|e| ExtractError::Malformed(e.to_string()))
        });
        assert_eq!(registry.extract("text/plain", b"hello").unwrap(), "hello");
        // Existing formats untouched.
        assert!(registry.supports(PDF_MEDIA_TYPE));
    }

    #[test]
    fn test_reregistration_replaces_previous_extractor() {
        let mut registry = ExtractorRegistry::new();
        registry.register("text/x-stub", |_| Ok("first".to_string()));
        registry.register("text/x-stub", |_| Ok("second".to_string()));
        assert_eq!(registry.supported_types().len(), 1);
        assert_eq!(registry.extract("text/x-stub", b"").unwrap(), "second");
    }
}
