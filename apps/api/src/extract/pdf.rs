//! PDF text extraction via `lopdf`, page by page.

use lopdf::Document;
use tracing::debug;

use super::ExtractError;

/// Extracts the text layer of a PDF: pages in document order, words
/// within a page joined by single spaces, each non-empty page followed
/// by a newline.
///
/// A structurally valid PDF with no extractable text (scanned images)
/// yields an empty string, not an error. Unparseable bytes fail with
/// [`ExtractError::Malformed`].
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::Malformed(format!("not a parseable PDF: {e}")))?;

    let mut text = String::new();
    // get_pages is keyed by 1-based page number, so iteration preserves
    // document order.
    for (page_number, _) in doc.get_pages() {
        let page_text = match doc.extract_text(&[page_number]) {
            Ok(raw) => normalize_page(&raw),
            Err(e) => {
                // A page without a text layer is legitimate content-free
                // input, not a malformed document.
                debug!("no text extracted from page {page_number}: {e}");
                String::new()
            }
        };
        if !page_text.is_empty() {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    Ok(text)
}

/// Collapses the layout engine's whitespace runs so words within a page
/// are joined by single spaces.
fn normalize_page(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Builds an in-memory PDF with one page per entry in `pages`. An
    /// empty entry produces a page with no text operations.
    fn make_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page_text in pages {
            let mut operations = Vec::new();
            if !page_text.is_empty() {
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*page_text)]),
                    Operation::new("ET", vec![]),
                ]);
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_two_pages_in_document_order() {
        let bytes = make_pdf(&["Alice Smith", "Engineer"]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "Alice Smith\nEngineer\n");
    }

    #[test]
    fn test_whitespace_collapsed_within_page() {
        let bytes = make_pdf(&["Alice    Smith"]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "Alice Smith\n");
    }

    #[test]
    fn test_textless_pdf_yields_empty_string() {
        let bytes = make_pdf(&["", ""]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_textless_page_between_text_pages_is_skipped() {
        let bytes = make_pdf(&["First", "", "Third"]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "First\nThird\n");
    }

    #[test]
    fn test_unparseable_bytes_are_malformed() {
        let err = extract_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }
}
