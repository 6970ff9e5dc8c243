//! Source formats, chunk locations, and the chunk type itself

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Supported source formats, detected from the filename extension.
///
/// The set is closed: anything else is rejected up front with
/// [`Error::UnsupportedFormat`] before any extraction work starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// PDF document, extracted page by page
    Pdf,
    /// Comma-separated values, encoding auto-detected
    Csv,
    /// Excel spreadsheet (.xlsx), first worksheet
    Xlsx,
}

impl SourceFormat {
    /// Detect the format from a filename, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(Error::UnsupportedFormat(format!(
                "unsupported file type for '{}' (expected .pdf, .csv, or .xlsx)",
                filename
            ))),
        }
    }

    /// Lowercase name, as reported in summaries ("pdf", "csv", "xlsx")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// Default MIME type for the format, used when the upload doesn't carry one.
    pub fn default_mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Csv => "text/csv",
            Self::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Csv => "CSV",
            Self::Xlsx => "Excel Spreadsheet (.xlsx)",
        }
    }
}

/// Identity of the file a chunk came from.
///
/// `file_id` and `session_id` are caller-supplied; `file_id` is assumed
/// unique within its session and is the key for progress and deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_id: String,
    pub session_id: String,
    pub filename: String,
    pub mime_type: String,
    pub format: SourceFormat,
}

impl SourceFile {
    pub fn new(
        file_id: impl Into<String>,
        session_id: impl Into<String>,
        filename: impl Into<String>,
        mime_type: Option<String>,
    ) -> Result<Self> {
        let filename = filename.into();
        let format = SourceFormat::from_filename(&filename)?;
        Ok(Self {
            file_id: file_id.into(),
            session_id: session_id.into(),
            mime_type: mime_type.unwrap_or_else(|| format.default_mime_type().to_string()),
            filename,
            format,
        })
    }
}

/// One unit handed from an extractor to the chunker: page text for PDFs,
/// a row/column matrix for tabular sources.
#[derive(Debug, Clone)]
pub enum ExtractedContent {
    /// Ordered page texts, one entry per page (possibly empty strings)
    Pages(Vec<PageText>),
    /// Full tabular content loaded in memory
    Table(TableMatrix),
}

/// Text of a single PDF page
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-indexed page number
    pub page_number: u32,
    pub content: String,
}

/// In-memory row/column matrix for CSV/XLSX sources
#[derive(Debug, Clone, Default)]
pub struct TableMatrix {
    /// Header row, as read from the first line/row of the source
    pub headers: Vec<String>,
    /// Data rows (header excluded)
    pub rows: Vec<Vec<String>>,
}

impl TableMatrix {
    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, taken from the header row
    pub fn col_count(&self) -> usize {
        self.headers.len()
    }
}

/// Where a chunk sits in its source document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkLocation {
    /// A prose chunk from one PDF page (1-indexed)
    Page { page_number: u32 },
    /// A window of table rows (1-indexed, inclusive, header excluded)
    Rows { row_start: u32, row_end: u32 },
    /// A row window further split into a column group (both 1-indexed, inclusive)
    Table {
        row_start: u32,
        row_end: u32,
        col_start: u32,
        col_end: u32,
    },
    /// The entire source in a single chunk
    Whole,
}

/// A bounded unit of normalized text, the unit of embedding.
///
/// Chunks are immutable once created; the batcher turns them into
/// [`VectorRecord`](crate::types::VectorRecord)s without touching them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Normalized text content; empty only for a blank source page
    pub content: String,
    /// Structural position within the source
    pub location: ChunkLocation,
    /// Position in the job's chunk stream
    pub chunk_index: u32,
    pub file_id: String,
    pub session_id: String,
    pub filename: String,
    pub mime_type: String,
}

impl Chunk {
    /// Create a new chunk for a source file
    pub fn new(
        source: &SourceFile,
        content: String,
        location: ChunkLocation,
        chunk_index: u32,
    ) -> Self {
        Self {
            content,
            location,
            chunk_index,
            file_id: source.file_id.clone(),
            session_id: source.session_id.clone(),
            filename: source.filename.clone(),
            mime_type: source.mime_type.clone(),
        }
    }

    /// Location fields flattened for index payloads
    pub fn location_fields(&self) -> HashMap<String, serde_json::Value> {
        let mut fields = HashMap::new();
        match self.location {
            ChunkLocation::Page { page_number } => {
                fields.insert("page_number".to_string(), serde_json::json!(page_number));
            }
            ChunkLocation::Rows { row_start, row_end } => {
                fields.insert("row_start".to_string(), serde_json::json!(row_start));
                fields.insert("row_end".to_string(), serde_json::json!(row_end));
            }
            ChunkLocation::Table {
                row_start,
                row_end,
                col_start,
                col_end,
            } => {
                fields.insert("row_start".to_string(), serde_json::json!(row_start));
                fields.insert("row_end".to_string(), serde_json::json!(row_end));
                fields.insert("col_start".to_string(), serde_json::json!(col_start));
                fields.insert("col_end".to_string(), serde_json::json!(col_end));
            }
            ChunkLocation::Whole => {}
        }
        fields
    }
}
