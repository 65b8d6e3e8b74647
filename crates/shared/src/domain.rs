use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            pub fn next(self) -> Self {
                Self(self.0.wrapping_add(1))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(AttemptId);
id_newtype!(ResourceId);

pub const CSV_MIME_TYPE: &str = "text/csv";
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A CSV file selected by the user, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl CsvFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        Ok(Self { filename, bytes })
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn has_csv_extension(&self) -> bool {
        Path::new(&self.filename)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }
}

/// Validated form contents: a file is present and the title is trimmed and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionInput {
    pub title: String,
    pub file: CsvFile,
}

impl SubmissionInput {
    pub fn validate(title: &str, file: Option<&CsvFile>) -> Result<Self, ValidationError> {
        let file = file.ok_or(ValidationError::MissingFile)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(Self {
            title: title.to_string(),
            file: file.clone(),
        })
    }
}

/// File name offered when saving the report, derived from the title.
pub fn suggested_pdf_filename(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stem.is_empty() {
        "report.pdf".to_string()
    } else {
        format!("{stem}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> CsvFile {
        CsvFile::new("q1.csv", b"a,b\n1,2\n".to_vec())
    }

    #[test]
    fn missing_file_is_reported_before_blank_title() {
        assert_eq!(
            SubmissionInput::validate("   ", None),
            Err(ValidationError::MissingFile)
        );
    }

    #[test]
    fn whitespace_title_is_rejected() {
        let file = sample_file();
        assert_eq!(
            SubmissionInput::validate(" \t\n", Some(&file)),
            Err(ValidationError::MissingTitle)
        );
    }

    #[test]
    fn title_is_trimmed_on_validation() {
        let file = sample_file();
        let input = SubmissionInput::validate("  Q1 Report  ", Some(&file)).expect("valid");
        assert_eq!(input.title, "Q1 Report");
        assert_eq!(input.file, file);
    }

    #[test]
    fn suggested_filename_strips_path_separators() {
        assert_eq!(suggested_pdf_filename("Q1/Q2: Report"), "Q1_Q2_ Report.pdf");
        assert_eq!(suggested_pdf_filename("  "), "report.pdf");
        assert_eq!(suggested_pdf_filename("..."), "report.pdf");
    }

    #[test]
    fn recognises_csv_extension_case_insensitively() {
        assert!(CsvFile::new("DATA.CSV", Vec::new()).has_csv_extension());
        assert!(!CsvFile::new("data.xlsx", Vec::new()).has_csv_extension());
    }
}
