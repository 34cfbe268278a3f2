//! # Raw header-card scanning
//!
//! Raw exposure files start with a block of fixed-width 80-byte header cards of
//! the form `KEY     = value / comment`. Only the head of the file is scanned
//! (the data payload behind it can be gigabytes), and only the known key set is
//! kept. Missing or mangled cards simply leave their key absent from the map; a
//! readable file never fails on content.

use ahash::AHashMap;
use camino::Utf8Path;
use std::fs::File;
use std::io::Read;

use crate::almanac_errors::AlmanacError;
use crate::constants::HEADER_SCAN_BYTES;

/// Upper-case header key to trimmed raw value.
pub type HeaderMap = AHashMap<String, String>;

/// Width of one header card in bytes.
const CARD_BYTES: usize = 80;

/// Header cards extracted from raw exposure files.
pub const HEADER_KEYS: [&str; 21] = [
    "DATE-OBS", "FIELDID", "DESIGNID", "CONFIGID", "SEEING", "EXPTYPE", "NREAD", "IMAGETYP",
    "LAMPQRTZ", "LAMPTHAR", "LAMPUNE", "FOCUS", "NAME", "PLATEID", "CARTID", "MAPID", "PLATETYP",
    "OBSCMNT", "COLLPIST", "COLPITCH", "DITHPIX",
];

/// Read the header cards of one raw exposure file.
///
/// Scans at most [`HEADER_SCAN_BYTES`] from the start of the file, walking
/// 80-byte cards until the `END` card or the end of the scanned block.
///
/// Arguments
/// -----------------
/// * `path`: path to one chip's raw exposure file.
///
/// Return
/// ----------
/// * The extracted [`HeaderMap`]; only I/O failures error, never card content.
pub fn read_exposure_headers(path: &Utf8Path) -> Result<HeaderMap, AlmanacError> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; HEADER_SCAN_BYTES];
    let n_read = read_up_to(&mut file, &mut buffer)?;
    buffer.truncate(n_read);
    Ok(parse_header_block(&buffer))
}

/// Fill `buffer` from `reader` as far as possible (plain `read` may return short).
fn read_up_to(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Walk the 80-byte cards of a header block and extract the known keys.
pub(crate) fn parse_header_block(block: &[u8]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(HEADER_KEYS.len());
    for card in block.chunks(CARD_BYTES) {
        let card = String::from_utf8_lossy(card);
        let Some((raw_key, raw_value)) = card.split_once('=') else {
            if card.trim_end() == "END" {
                break;
            }
            continue;
        };

        let key = raw_key.trim();
        if !HEADER_KEYS.contains(&key) {
            continue;
        }

        headers.insert(key.to_string(), strip_card_value(raw_value));
    }
    headers
}

/// Strip an inline comment and the quoting convention from a card value.
///
/// A `/` introduces a comment; everything before the **last** slash is kept so
/// that values legitimately containing slashes survive.
fn strip_card_value(raw: &str) -> String {
    let value = match raw.rsplit_once('/') {
        Some((before, _comment)) => before,
        None => raw,
    };
    value.trim().trim_matches('\'').trim().to_string()
}

#[cfg(test)]
mod headers_test {
    use super::*;

    /// Lay out `KEY = value` pairs as a padded 80-byte card block.
    fn card_block(cards: &[&str]) -> Vec<u8> {
        let mut block = Vec::new();
        for card in cards {
            let mut bytes = card.as_bytes().to_vec();
            bytes.resize(CARD_BYTES, b' ');
            block.extend_from_slice(&bytes);
        }
        block
    }

    #[test]
    fn test_parse_known_cards() {
        let block = card_block(&[
            "SIMPLE  =                    T / conforms to FITS standard",
            "IMAGETYP= 'Object  '           / object, dark, flat",
            "FIELDID =                  101",
            "NAME    = '8297-57131-01'",
            "DITHPIX =               12.994",
            "END",
            "IMAGETYP= 'ShouldNotBeSeen'",
        ]);
        let headers = parse_header_block(&block);
        assert_eq!(headers.get("IMAGETYP").unwrap(), "Object");
        assert_eq!(headers.get("FIELDID").unwrap(), "101");
        assert_eq!(headers.get("NAME").unwrap(), "8297-57131-01");
        assert_eq!(headers.get("DITHPIX").unwrap(), "12.994");
        // SIMPLE is not in the known key set.
        assert!(!headers.contains_key("SIMPLE"));
    }

    #[test]
    fn test_value_with_slash_keeps_body() {
        let block = card_block(&["OBSCMNT = 'clouds w/ wind / observer note'"]);
        let headers = parse_header_block(&block);
        assert_eq!(headers.get("OBSCMNT").unwrap(), "clouds w/ wind");
    }

    #[test]
    fn test_binary_garbage_is_ignored() {
        let mut block = card_block(&["CONFIGID=                 1234"]);
        block.extend(std::iter::repeat(0xFFu8).take(CARD_BYTES));
        let headers = parse_header_block(&block);
        assert_eq!(headers.get("CONFIGID").unwrap(), "1234");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apR-a-40760003.apz");
        let mut contents = card_block(&["IMAGETYP= 'ArcLamp '", "END"]);
        contents.extend_from_slice(&[0u8; 256]);
        std::fs::write(&path, &contents).unwrap();

        let utf8 = camino::Utf8Path::from_path(&path).unwrap();
        let headers = read_exposure_headers(utf8).unwrap();
        assert_eq!(headers.get("IMAGETYP").unwrap(), "ArcLamp");
    }
}
