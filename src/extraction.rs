// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Text extraction from source documents
//!
//! The pipeline only depends on the [`TextExtractor`] trait. The default
//! [`FileTextExtractor`] understands gzip-compressed CAS containers, plain text
//! files and, with the `pdf` cargo feature, raw PDF files.

use crate::error::{ClassifierError, Result};
use flate2::read::GzDecoder;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

lazy_static! {
    static ref SOFA_STRING: Regex = Regex::new(r#"sofaString="([^"]*)""#).unwrap();
    static ref NUMERIC_ENTITY: Regex = Regex::new(r"&#(x[0-9A-Fa-f]+|[0-9]+);").unwrap();
    static ref LINE_HYPHEN: Regex = Regex::new(r"(\w)-[ \t]*\n\s*").unwrap();
}

/// Declared format of the documents in a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Raw PDF file
    Pdf,
    /// Compressed CAS built from PDF-derived annotations
    CasPdf,
    /// Compressed CAS built from XML-derived annotations
    CasXml,
    /// Plain UTF-8 text file
    Txt,
}

impl SourceFormat {
    /// Whether the file name carries this format's extension
    pub fn matches(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match self {
            SourceFormat::Pdf => name.ends_with(".pdf"),
            SourceFormat::CasPdf | SourceFormat::CasXml => name.ends_with(".gz"),
            SourceFormat::Txt => name.ends_with(".txt"),
        }
    }
}

impl FromStr for SourceFormat {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(SourceFormat::Pdf),
            "cas_pdf" => Ok(SourceFormat::CasPdf),
            "cas_xml" => Ok(SourceFormat::CasXml),
            "txt" | "text" => Ok(SourceFormat::Txt),
            other => Err(ClassifierError::configuration(format!(
                "unknown source format '{}' (expected pdf, cas_pdf, cas_xml or txt)",
                other
            ))),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Pdf => "pdf",
            SourceFormat::CasPdf => "cas_pdf",
            SourceFormat::CasXml => "cas_xml",
            SourceFormat::Txt => "txt",
        };
        f.write_str(name)
    }
}

/// Pulls plain text out of a document
pub trait TextExtractor {
    /// Extracted text, or `None` when the file yields no usable text
    fn extract(&self, path: &Path, format: SourceFormat) -> Option<String>;
}

/// Default extractor reading documents from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn read_compressed_cas(path: &Path) -> io::Result<String> {
        let mut decoder = GzDecoder::new(File::open(path)?);
        let mut content = String::new();
        decoder.read_to_string(&mut content)?;
        Ok(content)
    }

    #[cfg(feature = "pdf")]
    fn read_pdf(path: &Path) -> Option<String> {
        let mut doc = match pdf_oxide::PdfDocument::open(path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!("Cannot open PDF {}: {}", path.display(), e);
                return None;
            }
        };
        let pages = doc.page_count().ok()?;
        let mut text = String::new();
        for page in 0..pages {
            match doc.extract_text(page) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => tracing::debug!("Page {} of {} unreadable: {}", page, path.display(), e),
            }
        }
        Some(text)
    }

    #[cfg(not(feature = "pdf"))]
    fn read_pdf(path: &Path) -> Option<String> {
        tracing::debug!("PDF support not compiled in, skipping {}", path.display());
        None
    }
}

impl TextExtractor for FileTextExtractor {
    fn extract(&self, path: &Path, format: SourceFormat) -> Option<String> {
        if !format.matches(path) {
            return None;
        }

        let text = match format {
            SourceFormat::Pdf => Self::read_pdf(path)?,
            SourceFormat::CasPdf | SourceFormat::CasXml => {
                let content = match Self::read_compressed_cas(path) {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::debug!("Cannot decompress {}: {}", path.display(), e);
                        return None;
                    }
                };
                text_from_cas_content(&content, format)?
            }
            SourceFormat::Txt => match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Cannot read {}: {}", path.display(), e);
                    return None;
                }
            },
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Document text stored in a serialized CAS
///
/// Only the CAS formats carry a Sofa; any other format yields `None`.
pub fn text_from_cas_content(content: &str, format: SourceFormat) -> Option<String> {
    let raw = SOFA_STRING.captures(content)?.get(1)?.as_str();
    let text = decode_xml_entities(raw);
    match format {
        SourceFormat::CasPdf => Some(LINE_HYPHEN.replace_all(&text, "$1").into_owned()),
        SourceFormat::CasXml => Some(text),
        _ => None,
    }
}

fn decode_xml_entities(raw: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(raw, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_default()
    });
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Files under `root`, sorted by file name within each directory
///
/// Symbolic links to directories are not followed. Without `recursive` only
/// the files directly inside `root` are returned.
pub(crate) fn scan_files(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !fs::metadata(root)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", root.display()),
        )
        .into());
    }

    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_dir() && entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
