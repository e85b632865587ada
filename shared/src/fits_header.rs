//! Header inspection for FITS files.
//!
//! cfitsio hides the raw header records behind typed key lookups, which is
//! awkward when all you want is to dump every card or walk the HDU list of
//! an arbitrary file. This module reads the 2880-byte header blocks
//! directly: each header is a run of 80-character cards ending with `END`,
//! followed by a data unit whose size follows from BITPIX, NAXISn, PCOUNT
//! and GCOUNT.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Size of a FITS logical record
pub const BLOCK_SIZE: usize = 2880;
/// Size of a single header card
pub const CARD_SIZE: usize = 80;

/// One 80-character header record, split into its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCard {
    pub keyword: String,
    /// Raw value text, quotes included for string values
    pub value: Option<String>,
    pub comment: Option<String>,
    /// The card exactly as stored, trailing blanks removed
    pub raw: String,
}

impl HeaderCard {
    /// Parse a single card. Records shorter than 80 characters are treated
    /// as blank-padded.
    pub fn parse(record: &str) -> Self {
        let raw = record.trim_end().to_string();
        let keyword = record.get(..8).unwrap_or(record).trim_end().to_string();

        let has_value = record.get(8..10) == Some("= ");
        if !has_value {
            // COMMENT, HISTORY, blank keywords and END carry free text only
            let text = record.get(8..).unwrap_or("").trim();
            return Self {
                keyword,
                value: None,
                comment: (!text.is_empty()).then(|| text.to_string()),
                raw,
            };
        }

        let field = record.get(10..).unwrap_or("").trim_start();
        let (value, rest) = if field.starts_with('\'') {
            split_quoted(field)
        } else {
            match field.find('/') {
                Some(pos) => (field[..pos].trim_end(), &field[pos..]),
                None => (field.trim_end(), ""),
            }
        };

        let comment = rest
            .trim_start()
            .strip_prefix('/')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Self {
            keyword,
            value: (!value.is_empty()).then(|| value.to_string()),
            comment,
            raw,
        }
    }

    /// Value as a string: quotes removed, `''` unescaped, trailing blanks
    /// dropped. Unquoted values are returned as-is.
    pub fn string_value(&self) -> Option<String> {
        let value = self.value.as_deref()?;
        match value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            Some(inner) => Some(inner.replace("''", "'").trim_end().to_string()),
            None => Some(value.to_string()),
        }
    }

    pub fn int_value(&self) -> Option<i64> {
        self.value.as_deref()?.trim().parse().ok()
    }
}

/// Split `'quoted''string'  / comment` after the closing quote.
fn split_quoted(field: &str) -> (&str, &str) {
    let bytes = field.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return (&field[..=i], &field[i + 1..]);
        }
        i += 1;
    }
    // Unterminated string: take everything
    (field, "")
}

/// An ordered list of header cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<HeaderCard>,
}

impl Header {
    pub fn cards(&self) -> &[HeaderCard] {
        &self.cards
    }

    /// First card with the given keyword (case-insensitive).
    pub fn get(&self, keyword: &str) -> Option<&HeaderCard> {
        self.cards
            .iter()
            .find(|c| c.keyword.eq_ignore_ascii_case(keyword))
    }

    pub fn get_string(&self, keyword: &str) -> Option<String> {
        self.get(keyword).and_then(HeaderCard::string_value)
    }

    pub fn get_int(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderCard::int_value)
    }

    /// Axis lengths in NAXIS1, NAXIS2, ... order
    pub fn axes(&self) -> Vec<usize> {
        let naxis = self.get_int("NAXIS").unwrap_or(0).max(0) as usize;
        (1..=naxis)
            .map(|i| self.get_int(&format!("NAXIS{i}")).unwrap_or(0).max(0) as usize)
            .collect()
    }

    /// Bytes in the data unit following this header, before block padding.
    pub fn data_size(&self) -> u64 {
        let axes = self.axes();
        if axes.is_empty() {
            return 0;
        }
        let bytes_per_value = (self.get_int("BITPIX").unwrap_or(8).unsigned_abs()) / 8;
        let pcount = self.get_int("PCOUNT").unwrap_or(0).max(0) as u64;
        let gcount = self.get_int("GCOUNT").unwrap_or(1).max(1) as u64;

        // Random-groups data skips NAXIS1 (always 0)
        let values: u64 = if self.get("GROUPS").and_then(|c| c.value.as_deref()) == Some("T") {
            axes.iter().skip(1).map(|&n| n as u64).product()
        } else {
            axes.iter().map(|&n| n as u64).product()
        };
        bytes_per_value * gcount * (pcount + values)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for card in &self.cards {
            writeln!(f, "{}", card.raw)?;
        }
        Ok(())
    }
}

/// Kind of header-data unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HduKind {
    Primary,
    Image,
    BinaryTable,
    AsciiTable,
    Other(String),
}

impl fmt::Display for HduKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HduKind::Primary => write!(f, "PrimaryHDU"),
            HduKind::Image => write!(f, "ImageHDU"),
            HduKind::BinaryTable => write!(f, "BinTableHDU"),
            HduKind::AsciiTable => write!(f, "TableHDU"),
            HduKind::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Summary of one HDU, as listed by [`read_hdus`].
#[derive(Debug, Clone, PartialEq)]
pub struct HduSummary {
    pub index: usize,
    pub name: String,
    pub kind: HduKind,
    pub bitpix: i64,
    /// Axis lengths in NAXIS1, NAXIS2, ... order
    pub dimensions: Vec<usize>,
    pub header: Header,
}

impl fmt::Display for HduSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dims = self
            .dimensions
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" x ");
        write!(
            f,
            "{:>3}  {:<10} {:<12} {:>4} cards  BITPIX={:<4} ({})",
            self.index,
            self.name,
            self.kind.to_string(),
            self.header.cards().len(),
            self.bitpix,
            if dims.is_empty() { "no data".to_string() } else { dims }
        )
    }
}

/// Read the primary header of a FITS file.
pub fn read_primary_header(path: &Path) -> Result<Header> {
    let file = File::open(path).map_err(|e| PipelineError::load(path, e))?;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader)
        .map_err(|e| PipelineError::load(path, e))?
        .ok_or_else(|| PipelineError::load(path, "file is empty"))?;
    ensure_simple(&header).map_err(|reason| PipelineError::load(path, reason))?;
    Ok(header)
}

/// Walk every HDU in the file, in order.
pub fn read_hdus(path: &Path) -> Result<Vec<HduSummary>> {
    let file = File::open(path).map_err(|e| PipelineError::load(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hdus = Vec::new();

    while let Some(header) = read_header(&mut reader).map_err(|e| PipelineError::load(path, e))? {
        let index = hdus.len();
        let kind = if index == 0 {
            ensure_simple(&header).map_err(|reason| PipelineError::load(path, reason))?;
            HduKind::Primary
        } else {
            match header.get_string("XTENSION").as_deref() {
                Some("IMAGE") => HduKind::Image,
                Some("BINTABLE") => HduKind::BinaryTable,
                Some("TABLE") => HduKind::AsciiTable,
                Some(other) => HduKind::Other(other.to_string()),
                None => {
                    log::warn!(
                        "{}: trailing data after HDU {} has no XTENSION card, stopping",
                        path.display(),
                        index - 1
                    );
                    break;
                }
            }
        };

        let padded = header.data_size().div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64;
        reader
            .seek(SeekFrom::Current(padded as i64))
            .map_err(|e| PipelineError::load(path, e))?;

        let default_name = if index == 0 { "PRIMARY" } else { "" };
        hdus.push(HduSummary {
            index,
            name: header
                .get_string("EXTNAME")
                .unwrap_or_else(|| default_name.to_string()),
            kind,
            bitpix: header.get_int("BITPIX").unwrap_or(0),
            dimensions: header.axes(),
            header,
        });
    }

    if hdus.is_empty() {
        return Err(PipelineError::load(path, "file is empty"));
    }
    Ok(hdus)
}

fn ensure_simple(header: &Header) -> std::result::Result<(), String> {
    match header.cards().first() {
        Some(card) if card.keyword == "SIMPLE" => Ok(()),
        _ => Err("not a FITS file: first card is not SIMPLE".to_string()),
    }
}

/// Read header blocks up to and including the one holding `END`.
///
/// Returns `Ok(None)` on a clean end of file before any block.
fn read_header<R: Read>(reader: &mut R) -> std::io::Result<Option<Header>> {
    let mut cards = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];
    let mut first = true;

    loop {
        match reader.read_exact(&mut block) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof && first => return Ok(None),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "header ends without an END card",
                ))
            }
            Err(e) => return Err(e),
        }
        first = false;

        for record in block.chunks_exact(CARD_SIZE) {
            let text = String::from_utf8_lossy(record);
            let card = HeaderCard::parse(&text);
            if card.keyword == "END" {
                return Ok(Some(Header { cards }));
            }
            cards.push(card);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn card(text: &str) -> String {
        format!("{text:<80}")
    }

    fn header_block(cards: &[&str]) -> Vec<u8> {
        let mut bytes: Vec<u8> = cards.iter().map(|c| card(c)).collect::<String>().into_bytes();
        bytes.extend(card("END").into_bytes());
        let padded = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        bytes.resize(padded, b' ');
        bytes
    }

    #[test]
    fn test_parse_numeric_card() {
        let c = HeaderCard::parse(&card("NAXIS1  =                  640 / length of data axis 1"));
        assert_eq!(c.keyword, "NAXIS1");
        assert_eq!(c.value.as_deref(), Some("640"));
        assert_eq!(c.int_value(), Some(640));
        assert_eq!(c.comment.as_deref(), Some("length of data axis 1"));
    }

    #[test]
    fn test_parse_string_card_with_slash_and_quote() {
        let c = HeaderCard::parse(&card("OBJECT  = 'M31 / Andromeda''s core' / target name"));
        assert_eq!(c.keyword, "OBJECT");
        assert_eq!(c.string_value().as_deref(), Some("M31 / Andromeda's core"));
        assert_eq!(c.comment.as_deref(), Some("target name"));
    }

    #[test]
    fn test_parse_commentary_card() {
        let c = HeaderCard::parse(&card("HISTORY processed with dark subtraction"));
        assert_eq!(c.keyword, "HISTORY");
        assert_eq!(c.value, None);
        assert_eq!(c.comment.as_deref(), Some("processed with dark subtraction"));
    }

    #[test]
    fn test_string_value_trims_padding() {
        let c = HeaderCard::parse(&card("DATE-OBS= '2024-03-01T04:05:06.5'"));
        assert_eq!(c.string_value().as_deref(), Some("2024-03-01T04:05:06.5"));
    }

    #[test]
    fn test_read_header_stops_at_end() {
        let bytes = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                  -32",
            "NAXIS   =                    0",
        ]);
        let mut cursor = Cursor::new(bytes);
        let header = read_header(&mut cursor).unwrap().unwrap();
        assert_eq!(header.cards().len(), 3);
        assert_eq!(header.get_int("bitpix"), Some(-32));
        assert_eq!(header.data_size(), 0);
        assert!(read_header(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_data_size() {
        let bytes = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                  100",
            "NAXIS2  =                   50",
        ]);
        let header = read_header(&mut Cursor::new(bytes)).unwrap().unwrap();
        assert_eq!(header.axes(), vec![100, 50]);
        assert_eq!(header.data_size(), 100 * 50 * 2);
    }

    #[test]
    fn test_read_hdus_walks_extensions() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("multi.fits");

        let mut bytes = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                   10",
            "NAXIS2  =                   10",
        ]);
        bytes.extend(vec![0u8; BLOCK_SIZE]);
        bytes.extend(header_block(&[
            "XTENSION= 'IMAGE   '",
            "BITPIX  =                  -32",
            "NAXIS   =                    1",
            "NAXIS1  =                    4",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "EXTNAME = 'ERRORS  '",
        ]));
        bytes.extend(vec![0u8; BLOCK_SIZE]);
        std::fs::write(&path, bytes).unwrap();

        let hdus = read_hdus(&path).unwrap();
        assert_eq!(hdus.len(), 2);
        assert_eq!(hdus[0].kind, HduKind::Primary);
        assert_eq!(hdus[0].name, "PRIMARY");
        assert_eq!(hdus[0].dimensions, vec![10, 10]);
        assert_eq!(hdus[1].kind, HduKind::Image);
        assert_eq!(hdus[1].name, "ERRORS");
        assert_eq!(hdus[1].bitpix, -32);
    }

    #[test]
    fn test_rejects_non_fits() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bogus.fits");
        std::fs::write(&path, header_block(&["NOTFITS =                    1"])).unwrap();
        assert!(matches!(
            read_primary_header(&path),
            Err(PipelineError::Load { .. })
        ));
    }
}
