use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::DocumentError;
use crate::translate::parse_document;

// The three ways a document can fail admission.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Failed to read SVG file: {0}")]
    Read(#[from] std::io::Error),
    #[error("SVG validation failed: {0}")]
    Parse(String),
    #[error("SVG has no root element")]
    MissingRoot,
}

// Well-formed XML with a document element. The root need not be `<svg>`.
pub fn validate_str(text: &str) -> Result<(), ValidationError> {
    match parse_document(text) {
        Ok(_) => Ok(()),
        Err(DocumentError::MissingRoot) => Err(ValidationError::MissingRoot),
        Err(e) => Err(ValidationError::Parse(e.to_string())),
    }
}

pub fn validate_path(path: impl AsRef<Path>) -> Result<(), ValidationError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ValidationError::Parse(format!("invalid UTF-8: {e}")))?;
    validate_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_any_rooted_document() {
        assert!(validate_str(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).is_ok());
        assert!(validate_str("<note/>").is_ok());
    }

    #[test]
    fn distinguishes_the_failure_cases() {
        assert!(matches!(validate_str(""), Err(ValidationError::MissingRoot)));
        assert!(matches!(
            validate_str("<?xml version=\"1.0\"?>"),
            Err(ValidationError::MissingRoot)
        ));
        assert!(matches!(
            validate_str("<svg><rect></svg>"),
            Err(ValidationError::Parse(_))
        ));
        assert!(matches!(
            validate_path("/nonexistent/svgprim/missing.svg"),
            Err(ValidationError::Read(_))
        ));
    }

    #[test]
    fn reads_files_from_disk() {
        let path = std::env::temp_dir().join(format!("svgprim_validate_{}.svg", std::process::id()));
        std::fs::write(&path, "<svg><g/></svg>").unwrap();
        assert!(validate_path(&path).is_ok());
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(validate_path(&path), Err(ValidationError::Parse(_))));
        let _ = std::fs::remove_file(path);
    }
}
