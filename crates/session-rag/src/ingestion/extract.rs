//! Per-format extraction from raw bytes into chunkable units

use calamine::Reader;

use crate::error::{Error, Result};
use crate::types::{ExtractedContent, PageText, SourceFile, SourceFormat, TableMatrix};

/// Bytes sniffed from the head of a CSV file for encoding detection
const ENCODING_SNIFF_BYTES: usize = 10_000;

/// Multi-format extractor.
///
/// PDF sources become one unit per page; tabular sources are loaded whole
/// into a row/column matrix. The format has already been validated by
/// [`SourceFormat::from_filename`], so dispatch here is total.
pub struct Extractor;

impl Extractor {
    /// Extract the content of a source file
    pub fn extract(&self, source: &SourceFile, data: &[u8]) -> Result<ExtractedContent> {
        match source.format {
            SourceFormat::Pdf => Self::extract_pdf(data, &source.filename),
            SourceFormat::Csv => Self::extract_csv(data, &source.filename),
            SourceFormat::Xlsx => Self::extract_xlsx(data, &source.filename),
        }
    }

    /// Extract PDF text page by page.
    ///
    /// A page whose text extraction fails yields an empty string rather than
    /// failing the job; only a document that cannot be loaded at all is an
    /// extraction error.
    fn extract_pdf(data: &[u8], filename: &str) -> Result<ExtractedContent> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for (page_number, _object_id) in doc.get_pages() {
            let content = match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        filename,
                        page = page_number,
                        error = %e,
                        "page text extraction failed, keeping empty page"
                    );
                    String::new()
                }
            };
            pages.push(PageText {
                page_number,
                content,
            });
        }

        Ok(ExtractedContent::Pages(pages))
    }

    /// Parse CSV bytes into a row/column matrix, auto-detecting the encoding.
    fn extract_csv(data: &[u8], filename: &str) -> Result<ExtractedContent> {
        let encoding = detect_encoding(data);
        let (decoded, _, _) = encoding.decode(data);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(decoded.as_bytes());

        let mut headers: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for (i, result) in reader.records().enumerate() {
            let record = result
                .map_err(|e| Error::extraction(filename, format!("CSV parse error: {}", e)))?;
            let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();

            if i == 0 {
                headers = cells;
            } else {
                rows.push(cells);
            }
        }

        let width = headers.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Ok(ExtractedContent::Table(TableMatrix { headers, rows }))
    }

    /// Load the first worksheet of an XLSX workbook into a matrix.
    fn extract_xlsx(data: &[u8], filename: &str) -> Result<ExtractedContent> {
        let cursor = std::io::Cursor::new(data.to_vec());
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::extraction(filename, format!("failed to open workbook: {}", e)))?;

        let range = match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => range,
            Some(Err(e)) => {
                return Err(Error::extraction(
                    filename,
                    format!("failed to read worksheet: {}", e),
                ))
            }
            None => return Ok(ExtractedContent::Table(TableMatrix::default())),
        };

        let mut row_iter = range.rows();
        let headers: Vec<String> = match row_iter.next() {
            Some(row) => row.iter().map(cell_to_string).collect(),
            None => return Ok(ExtractedContent::Table(TableMatrix::default())),
        };

        let rows: Vec<Vec<String>> = row_iter
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        Ok(ExtractedContent::Table(TableMatrix { headers, rows }))
    }
}

/// Render a spreadsheet cell as text
fn cell_to_string(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(s) => s.clone(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        _ => String::new(),
    }
}

/// Detect the encoding of CSV bytes from the leading sample.
///
/// Valid UTF-8 (including a sample cut mid-character) stays UTF-8; anything
/// else goes through the detector.
fn detect_encoding(data: &[u8]) -> &'static encoding_rs::Encoding {
    let sample = &data[..data.len().min(ENCODING_SNIFF_BYTES)];

    match std::str::from_utf8(sample) {
        Ok(_) => encoding_rs::UTF_8,
        // error_len() == None means the sample ends inside a multi-byte char
        Err(e) if e.error_len().is_none() => encoding_rs::UTF_8,
        Err(_) => {
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(sample, sample.len() == data.len());
            detector.guess(None, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_source() -> SourceFile {
        SourceFile::new("f1", "s1", "data.csv", None).unwrap()
    }

    #[test]
    fn csv_first_row_becomes_headers() {
        let data = b"name,age,city\nalice,30,berlin\nbob,25,lisbon\n";
        let content = Extractor.extract(&csv_source(), data).unwrap();
        match content {
            ExtractedContent::Table(matrix) => {
                assert_eq!(matrix.headers, vec!["name", "age", "city"]);
                assert_eq!(matrix.row_count(), 2);
                assert_eq!(matrix.rows[1], vec!["bob", "25", "lisbon"]);
            }
            _ => panic!("expected table content"),
        }
    }

    #[test]
    fn csv_ragged_rows_are_padded_to_header_width() {
        let data = b"a,b,c\n1,2\n3,4,5,6\n";
        let content = Extractor.extract(&csv_source(), data).unwrap();
        match content {
            ExtractedContent::Table(matrix) => {
                assert_eq!(matrix.col_count(), 3);
                assert_eq!(matrix.rows[0], vec!["1", "2", ""]);
                assert_eq!(matrix.rows[1], vec!["3", "4", "5"]);
            }
            _ => panic!("expected table content"),
        }
    }

    #[test]
    fn csv_latin1_bytes_are_decoded() {
        // "café,prix\ncrème,3" in Latin-1: é = 0xE9, è = 0xE8
        let data = b"caf\xE9,prix\ncr\xE8me,3\n";
        let content = Extractor.extract(&csv_source(), data).unwrap();
        match content {
            ExtractedContent::Table(matrix) => {
                assert_eq!(matrix.headers[0], "café");
                assert_eq!(matrix.rows[0][0], "crème");
            }
            _ => panic!("expected table content"),
        }
    }

    #[test]
    fn empty_csv_yields_empty_matrix() {
        let content = Extractor.extract(&csv_source(), b"").unwrap();
        match content {
            ExtractedContent::Table(matrix) => {
                assert!(matrix.headers.is_empty());
                assert_eq!(matrix.row_count(), 0);
            }
            _ => panic!("expected table content"),
        }
    }

    #[test]
    fn utf8_detection_survives_sample_cut_mid_character() {
        // A two-byte character split exactly at the sniff boundary
        let mut data = vec![b'x'; ENCODING_SNIFF_BYTES - 1];
        data.extend_from_slice("é".as_bytes());
        assert_eq!(detect_encoding(&data), encoding_rs::UTF_8);
    }

    #[test]
    fn malformed_pdf_is_an_extraction_error() {
        let source = SourceFile::new("f1", "s1", "broken.pdf", None).unwrap();
        let err = Extractor.extract(&source, b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn cell_rendering_matches_display_conventions() {
        assert_eq!(cell_to_string(&calamine::Data::Empty), "");
        assert_eq!(
            cell_to_string(&calamine::Data::String("text".to_string())),
            "text"
        );
        assert_eq!(cell_to_string(&calamine::Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&calamine::Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&calamine::Data::Int(-7)), "-7");
        assert_eq!(cell_to_string(&calamine::Data::Bool(true)), "true");
    }
}
