//! Text decoding for uploaded files.
//!
//! Uploads come from spreadsheets exported on arbitrary machines, so the
//! decoder handles:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast-path with strict validation
//! - Fallback encoding detection using chardetng
//! - Replacement characters for undecodable sequences

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Decode raw upload bytes into text.
///
/// Returns the decoded content and a normalized label for the encoding used
/// (e.g. "utf-8", "utf-8-sig", "utf-16le", "windows-1252").
pub fn decode_upload(bytes: &[u8]) -> (String, String) {
    if bytes.is_empty() {
        return (String::new(), "utf-8".to_string());
    }

    // BOM markers first
    if let Some(rest) = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        let (cow, _) = UTF_8.decode_without_bom_handling(rest);
        return (cow.into_owned(), "utf-8-sig".to_string());
    }
    if let Some(rest) = bytes.strip_prefix(&[0xff, 0xfe]) {
        let (cow, _) = UTF_16LE.decode_without_bom_handling(rest);
        return (cow.into_owned(), "utf-16le".to_string());
    }
    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let (cow, _) = UTF_16BE.decode_without_bom_handling(rest);
        return (cow.into_owned(), "utf-16be".to_string());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), "utf-8".to_string());
    }

    let encoding = detect_encoding(bytes);
    let (cow, _had_errors) = encoding.decode_without_bom_handling(bytes);
    (cow.into_owned(), encoding.name().to_lowercase())
}

fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    detector.guess(None, true)
}
