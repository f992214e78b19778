//! Listings loader with encoding and delimiter auto-detection.
//!
//! Reads the ads file into [`RawListing`] rows. The header row is checked
//! against [`REQUIRED_COLUMNS`] before any row is read, so a file with a
//! missing column fails up front.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{RawListing, REQUIRED_COLUMNS};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Loaded rows, in file order
    pub listings: Vec<RawListing>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers as found in the file
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoder = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            return Ok(String::from_utf8_lossy(bytes).into_owned());
        }
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15,
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252,
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc,
            // Unknown label: best effort
            None => return Ok(String::from_utf8_lossy(bytes).into_owned()),
        },
    };

    let (decoded, _, had_errors) = decoder.decode(bytes);
    if had_errors {
        return Err(CsvError::EncodingError {
            encoding: encoding.to_string(),
        });
    }
    Ok(decoded.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded CSV content with an explicit delimiter.
///
/// # Example
/// ```ignore
/// let listings = parse_listings(content, ',')?;
/// println!("{} ads, first model: {}", listings.len(), listings[0].model);
/// ```
pub fn parse_listings(content: &str, delimiter: char) -> CsvResult<Vec<RawListing>> {
    parse_with_headers(content, delimiter).map(|(listings, _)| listings)
}

fn parse_with_headers(content: &str, delimiter: char) -> CsvResult<(Vec<RawListing>, Vec<String>)> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(CsvError::ParseError {
            line: 1,
            message: format!("delimiter '{}' is not an ASCII character", delimiter),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CsvError::ParseError { line: 1, message: e.to_string() })?
        .clone();

    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(CsvError::MissingColumn(column.to_string()));
        }
    }

    let mut listings = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CsvError::ParseError {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let mut listing: RawListing = record
            .deserialize(Some(&headers))
            .map_err(|e| CsvError::ParseError { line, message: e.to_string() })?;
        listing.line = line;
        listings.push(listing);
    }

    Ok((listings, headers.iter().map(String::from).collect()))
}

/// Parse CSV bytes, auto-detecting encoding and (unless given) delimiter.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    let (listings, headers) = parse_with_headers(&content, delimiter)?;

    Ok(ParseResult {
        listings,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse a listings file, auto-detecting encoding and (unless given) delimiter.
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "price,model_year,model,condition,cylinders,fuel,odometer,transmission,type,paint_color,is_4wd,date_posted,days_listed";

    fn csv_with(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s
    }

    #[test]
    fn test_simple_rows() {
        let csv = csv_with(&[
            "9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23,19",
            "25500,,ford f-150,good,6.0,gas,88705.0,automatic,pickup,white,1.0,2018-10-19,50",
        ]);
        let rows = parse_listings(&csv, ',').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, 9400);
        assert_eq!(rows[0].model_year, Some(2011.0));
        assert_eq!(rows[0].paint_color, None);
        assert_eq!(rows[0].is_4wd, Some(true));
        assert_eq!(rows[0].vehicle_type, "SUV");
        assert_eq!(rows[1].model_year, None);
        assert_eq!(rows[1].paint_color.as_deref(), Some("white"));
    }

    #[test]
    fn test_line_numbers_start_after_header() {
        let csv = csv_with(&[
            "1,2011,a,good,4,gas,1,manual,sedan,red,,2018-01-01,1",
            "2,2012,b,fair,4,gas,1,manual,sedan,red,,2018-01-02,2",
        ]);
        let rows = parse_listings(&csv, ',').unwrap();
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[0].is_4wd, None);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "price,model\n100,bmw";
        let err = parse_listings(csv, ',').unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn(ref c) if c == "model_year"));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let csv = csv_with(&[
            "1,2011,a,good,4,gas,1,manual,sedan,red,,2018-01-01,1",
            "cheap,2011,a,good,4,gas,1,manual,sedan,red,,2018-01-01,1",
        ]);
        match parse_listings(&csv, ',').unwrap_err() {
            CsvError::ParseError { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_value_tokens_load_as_none() {
        let csv = csv_with(&[
            "9000,2011.0,bmw x5,good,6.0,gas,NaN,automatic,SUV,NaN,1.0,2018-06-23,19",
            "9000,NA,bmw x5,good,N/A,gas,null,automatic,SUV,NULL,NA,2018-06-23,19",
            "9000,2011.0,bmw x5,good,6.0,gas,inf,automatic,SUV, white ,1.0,2018-06-23,19",
        ]);
        let rows = parse_listings(&csv, ',').unwrap();

        assert_eq!(rows[0].odometer, None);
        assert_eq!(rows[0].paint_color, None);
        assert_eq!(rows[1].model_year, None);
        assert_eq!(rows[1].cylinders, None);
        assert_eq!(rows[1].odometer, None);
        assert_eq!(rows[1].paint_color, None);
        assert_eq!(rows[1].is_4wd, None);
        assert_eq!(rows[2].odometer, None);
        assert_eq!(rows[2].paint_color.as_deref(), Some("white"));
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_listings("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes(b"", None), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_auto_parse_semicolon() {
        let csv = csv_with(&["1,2011,a,good,4,gas,1,manual,sedan,red,0,2018-01-01,1"]).replace(',', ";");
        let result = parse_bytes(csv.as_bytes(), None).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.listings.len(), 1);
        assert_eq!(result.listings[0].is_4wd, Some(false));
        assert_eq!(result.headers.len(), REQUIRED_COLUMNS.len());
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }
}
