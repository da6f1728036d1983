// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::mime::{mime_type_for, PDF_MIME_TYPE};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// RFC 5987 `attr-char` minus the characters that must be escaped
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// How the response layer should present the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Render in the browser
    Inline,
    /// Prompt a download
    Attachment,
}

impl Disposition {
    /// Only PDFs are shown inline; everything else downloads.
    pub fn for_mime_type(mime_type: &str) -> Self {
        if mime_type == PDF_MIME_TYPE {
            Self::Inline
        } else {
            Self::Attachment
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A granted file, ready to be handed to the streaming collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    pub absolute_path: PathBuf,
    pub filename: String,
    pub mime_type: String,
    pub disposition: Disposition,
}

impl ResolvedFile {
    /// Classify the file at `absolute_path` by its extension
    pub fn classify(absolute_path: PathBuf) -> Self {
        let filename = file_name_of(&absolute_path);
        let mime_type = mime_type_for(&filename);
        Self {
            disposition: Disposition::for_mime_type(mime_type),
            mime_type: mime_type.to_string(),
            filename,
            absolute_path,
        }
    }

    /// `Content-Disposition` header value.
    ///
    /// Carries an ASCII `filename` fallback and, for non-ASCII names, an
    /// RFC 5987 `filename*` parameter.
    pub fn content_disposition(&self) -> String {
        let fallback: String = self
            .filename
            .chars()
            .map(|c| match c {
                '"' | '\\' => '_',
                c if c.is_ascii() && !c.is_ascii_control() => c,
                _ => '_',
            })
            .collect();

        if self.filename.is_ascii() {
            format!("{}; filename=\"{}\"", self.disposition, fallback)
        } else {
            format!(
                "{}; filename=\"{}\"; filename*=UTF-8''{}",
                self.disposition,
                fallback,
                utf8_percent_encode(&self.filename, FILENAME_ENCODE_SET)
            )
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_is_inline() {
        let file = ResolvedFile::classify(PathBuf::from("/data/docs/report.pdf"));
        assert_eq!(file.filename, "report.pdf");
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.disposition, Disposition::Inline);
    }

    #[test]
    fn test_everything_else_is_attachment() {
        for name in ["a.png", "notes.txt", "page.html", "blob"] {
            let file = ResolvedFile::classify(PathBuf::from("/data").join(name));
            assert_eq!(file.disposition, Disposition::Attachment, "{}", name);
        }
    }

    #[test]
    fn test_content_disposition_ascii() {
        let file = ResolvedFile::classify(PathBuf::from("/data/a \"quoted\".png"));
        assert_eq!(file.content_disposition(), "attachment; filename=\"a _quoted_.png\"");
    }

    #[test]
    fn test_content_disposition_unicode() {
        let file = ResolvedFile::classify(PathBuf::from("/data/résumé.pdf"));
        assert_eq!(
            file.content_disposition(),
            "inline; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }
}
