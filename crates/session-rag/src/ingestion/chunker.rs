//! Prose and adaptive tabular chunking

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkLocation, ExtractedContent, PageText, SourceFile, TableMatrix};

use super::normalize::clean;

/// Splits extracted content into bounded chunks.
///
/// Prose sources use a sliding character window with overlap, breaking at
/// sentence boundaries where possible; tabular sources use size-adaptive
/// row windows, optionally split into column groups for wide tables.
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Create a chunker with the given configuration
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Chunk one file's extracted content.
    ///
    /// Chunk indices are sequential over the whole job, so page boundaries
    /// stay visible in the stream even when one page yields several chunks.
    pub fn chunk(&self, source: &SourceFile, content: &ExtractedContent) -> Vec<Chunk> {
        match content {
            ExtractedContent::Pages(pages) => {
                let mut chunks = Vec::new();
                for page in pages {
                    let page_chunks =
                        self.chunk_page(source, page, chunks.len() as u32);
                    chunks.extend(page_chunks);
                }
                chunks
            }
            ExtractedContent::Table(matrix) => self.chunk_table(source, matrix),
        }
    }

    /// Chunk the text of a single page.
    ///
    /// A page that is blank after normalization yields one empty chunk so
    /// page coverage stays visible; the batcher drops empty content before
    /// embedding.
    fn chunk_page(&self, source: &SourceFile, page: &PageText, start_index: u32) -> Vec<Chunk> {
        let location = ChunkLocation::Page {
            page_number: page.page_number,
        };
        let cleaned = clean(&page.content);

        if cleaned.is_empty() {
            return vec![Chunk::new(source, String::new(), location, start_index)];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut index = start_index;

        for segment in self.split_segments(&cleaned) {
            if !current.is_empty() && current.len() + segment.len() > self.config.chunk_size {
                let overlap = self.overlap_tail(&current);
                chunks.push(Chunk::new(
                    source,
                    current.trim().to_string(),
                    location,
                    index,
                ));
                index += 1;
                current = overlap;
            }
            current.push_str(segment);
        }

        if !current.trim().is_empty() {
            chunks.push(Chunk::new(
                source,
                current.trim().to_string(),
                location,
                index,
            ));
        }

        chunks
    }

    /// Sentence segments, with any sentence longer than the window hard-split
    /// at char boundaries so the accumulation loop stays bounded.
    fn split_segments<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut segments = Vec::new();
        for sentence in text.split_sentence_bounds() {
            if sentence.len() <= self.config.chunk_size {
                segments.push(sentence);
                continue;
            }

            let mut rest = sentence;
            while rest.len() > self.config.chunk_size {
                let mut cut = self.config.chunk_size;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                segments.push(&rest[..cut]);
                rest = &rest[cut..];
            }
            if !rest.is_empty() {
                segments.push(rest);
            }
        }
        segments
    }

    /// Tail of the previous chunk carried into the next one as overlap.
    fn overlap_tail(&self, text: &str) -> String {
        if text.len() <= self.config.chunk_overlap {
            return text.to_string();
        }

        let mut start = text.len().saturating_sub(self.config.chunk_overlap);
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        let tail = &text[start..];

        // Prefer starting the overlap at a sentence, then a word boundary
        if let Some(pos) = tail.find(". ") {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }
        tail.to_string()
    }

    /// Size-adaptive tabular chunking.
    fn chunk_table(&self, source: &SourceFile, matrix: &TableMatrix) -> Vec<Chunk> {
        let rows = matrix.row_count();
        let cols = matrix.col_count();

        if rows == 0 && matrix.headers.is_empty() {
            return Vec::new();
        }

        // Small tables: the whole thing, header included
        if rows <= self.config.small_table_rows {
            let content = serialize_window(Some(&matrix.headers), &matrix.rows, 0, cols);
            return vec![Chunk::new(source, clean(&content), ChunkLocation::Whole, 0)];
        }

        // Mid-sized tables: fixed row windows, header only in the first
        if rows <= self.config.large_table_rows {
            return self.row_windows(source, matrix, self.config.rows_per_window);
        }

        // Large tables: derive the window size from a target chunk count
        let target = (rows / self.config.row_divisor).max(1);
        let rows_per = rows / target;

        if cols > self.config.wide_table_cols {
            self.column_grouped_windows(source, matrix, rows_per)
        } else {
            self.row_windows(source, matrix, rows_per)
        }
    }

    /// Plain row windows carrying row-range locations.
    fn row_windows(
        &self,
        source: &SourceFile,
        matrix: &TableMatrix,
        rows_per: usize,
    ) -> Vec<Chunk> {
        let cols = matrix.col_count();
        let mut chunks = Vec::new();

        for (i, window) in matrix.rows.chunks(rows_per).enumerate() {
            let row_start = i * rows_per;
            let header = (i == 0).then_some(matrix.headers.as_slice());
            let content = serialize_window(header, window, 0, cols);

            chunks.push(Chunk::new(
                source,
                clean(&content),
                ChunkLocation::Rows {
                    row_start: (row_start + 1) as u32,
                    row_end: (row_start + window.len()) as u32,
                },
                chunks.len() as u32,
            ));
        }

        chunks
    }

    /// Row windows split into column groups, for wide tables.
    ///
    /// The header slice appears only in the first row window of each column
    /// group, mirroring the header-only-first rule for plain windows.
    fn column_grouped_windows(
        &self,
        source: &SourceFile,
        matrix: &TableMatrix,
        rows_per: usize,
    ) -> Vec<Chunk> {
        let cols = matrix.col_count();
        let group = self.config.col_group_size;
        let mut chunks = Vec::new();

        for (i, window) in matrix.rows.chunks(rows_per).enumerate() {
            let row_start = i * rows_per;
            let mut col_start = 0;

            while col_start < cols {
                let col_end = (col_start + group).min(cols);
                let header = (i == 0).then_some(&matrix.headers[col_start..col_end]);
                let content = serialize_window(header, window, col_start, col_end);

                chunks.push(Chunk::new(
                    source,
                    clean(&content),
                    ChunkLocation::Table {
                        row_start: (row_start + 1) as u32,
                        row_end: (row_start + window.len()) as u32,
                        col_start: (col_start + 1) as u32,
                        col_end: col_end as u32,
                    },
                    chunks.len() as u32,
                ));

                col_start = col_end;
            }
        }

        chunks
    }
}

/// Serialize a window of rows, one line per row, cells joined with " | ".
fn serialize_window(
    header: Option<&[String]>,
    rows: &[Vec<String>],
    col_start: usize,
    col_end: usize,
) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);

    if let Some(header) = header {
        lines.push(header.join(" | "));
    }
    for row in rows {
        let end = col_end.min(row.len());
        let slice = if col_start < end {
            &row[col_start..end]
        } else {
            &[]
        };
        lines.push(slice.join(" | "));
    }

    lines.join("\n")
}
