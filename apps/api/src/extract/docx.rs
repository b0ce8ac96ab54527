//! DOCX text extraction via `docx-rs`.

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

use super::ExtractError;

/// Extracts the raw textual content of a DOCX document body, one line
/// per paragraph, all formatting markup discarded.
///
/// Fails with [`ExtractError::Malformed`] when the ZIP/XML package
/// cannot be opened or its document body cannot be read.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = read_docx(bytes)
        .map_err(|e| ExtractError::Malformed(format!("not a readable DOCX package: {e}")))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    fn make_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for p in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)));
        }
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_paragraphs_extracted_in_order() {
        let bytes = make_docx(&["Alice Smith", "Engineer at Acme"]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "Alice Smith\nEngineer at Acme\n");
    }

    #[test]
    fn test_empty_document_body() {
        let bytes = make_docx(&[]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_unparseable_bytes_are_malformed() {
        let err = extract_text(b"this is not a zip archive").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn test_zip_without_document_body_is_malformed() {
        // A valid-looking ZIP local file header with no word/document.xml.
        let bytes = b"PK\x03\x04rest-of-a-broken-archive";
        assert!(extract_text(bytes).is_err());
    }
}
