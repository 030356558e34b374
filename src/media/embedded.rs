//! Descriptive metadata embedded in JPEG files (IPTC-IIM).
//!
//! Reads the Photoshop APP13 segment, finds the 8BIM resource 0x0404 and
//! decodes the Application Record (record 2) datasets editors fill in:
//!
//! | Dataset | Meaning |
//! |---------|---------|
//! | 2:05    | Object name (title) |
//! | 2:25    | Keywords (repeatable) |
//! | 2:80    | By-line (author) |
//! | 2:116   | Copyright notice |
//! | 2:120   | Caption / abstract |
//!
//! Anything unparseable yields empty metadata; a file with a broken header
//! is still a perfectly good file.

use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbeddedMeta {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub keywords: Vec<String>,
}

impl EmbeddedMeta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

const APP13: u8 = 0xED;
const START_OF_SCAN: u8 = 0xDA;
const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const IPTC_RESOURCE: u16 = 0x0404;

/// Read embedded metadata from a JPEG. Other formats have none.
pub fn read(path: &Path) -> EmbeddedMeta {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    if !is_jpeg {
        return EmbeddedMeta::default();
    }
    match std::fs::read(path) {
        Ok(bytes) => app13_segments(&bytes)
            .find_map(iptc_resource)
            .map(decode_iim)
            .unwrap_or_default(),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "embedded metadata unreadable");
            EmbeddedMeta::default()
        }
    }
}

/// Payloads of every APP13 segment before the image data.
fn app13_segments(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut pos = 2; // past SOI
    std::iter::from_fn(move || {
        while pos + 4 <= data.len() {
            if data[pos] != 0xFF {
                return None;
            }
            let marker = data[pos + 1];
            if marker == START_OF_SCAN {
                return None;
            }
            let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let start = pos + 4;
            let end = (pos + 2 + len).min(data.len());
            pos += 2 + len.max(2);
            if marker == APP13 && start <= end {
                return Some(&data[start..end]);
            }
        }
        None
    })
}

/// Walk the 8BIM resource blocks of an APP13 payload looking for IPTC data.
fn iptc_resource(segment: &[u8]) -> Option<&[u8]> {
    let mut rest = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);
    while rest.len() >= 12 {
        let block = rest.strip_prefix(b"8BIM".as_slice())?;
        let id = u16::from_be_bytes([block[0], block[1]]);
        // Pascal-string name, padded to an even length
        let name_len = *block.get(2)? as usize;
        let mut at = 2 + 1 + name_len + (1 + name_len) % 2;
        let size_bytes = block.get(at..at + 4)?;
        let size = u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]])
            as usize;
        at += 4;
        let payload = block.get(at..at + size)?;
        if id == IPTC_RESOURCE {
            return Some(payload);
        }
        rest = block.get(at + size + size % 2..)?;
    }
    None
}

/// Decode IIM datasets: `0x1C record dataset len_hi len_lo data...`.
fn decode_iim(mut data: &[u8]) -> EmbeddedMeta {
    let mut meta = EmbeddedMeta::default();
    while let [0x1C, record, dataset, hi, lo, tail @ ..] = data {
        let len = u16::from_be_bytes([*hi, *lo]) as usize;
        let Some(value) = tail.get(..len) else {
            break;
        };
        data = &tail[len..];
        if *record != 2 {
            continue;
        }
        let value = String::from_utf8_lossy(value).trim().to_string();
        if value.is_empty() {
            continue;
        }
        match *dataset {
            5 => meta.title = Some(value),
            25 => meta.keywords.push(value),
            80 => meta.author = Some(value),
            116 => meta.copyright = Some(value),
            120 => meta.caption = Some(value),
            _ => {}
        }
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dataset(number: u8, value: &[u8]) -> Vec<u8> {
        let mut out = vec![0x1C, 0x02, number];
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value);
        out
    }

    /// A minimal JPEG: SOI, one APP13 segment carrying `iim`, SOS.
    fn jpeg_with(iim: &[u8]) -> Vec<u8> {
        let mut resource = PHOTOSHOP_HEADER.to_vec();
        resource.extend_from_slice(b"8BIM");
        resource.extend_from_slice(&IPTC_RESOURCE.to_be_bytes());
        resource.extend_from_slice(&[0, 0]); // empty pascal name, padded
        resource.extend_from_slice(&(iim.len() as u32).to_be_bytes());
        resource.extend_from_slice(iim);
        if iim.len() % 2 == 1 {
            resource.push(0);
        }

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, APP13];
        jpeg.extend_from_slice(&((resource.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&resource);
        jpeg.extend_from_slice(&[0xFF, START_OF_SCAN, 0x00, 0x02]);
        jpeg
    }

    #[test]
    fn decode_all_fields() {
        let mut iim = dataset(5, b"Dawn");
        iim.extend(dataset(25, b"sky"));
        iim.extend(dataset(80, b"Ana"));
        iim.extend(dataset(116, b"(c) Ana"));
        iim.extend(dataset(120, b"First light"));
        iim.extend(dataset(25, b"morning"));

        let meta = decode_iim(&iim);
        assert_eq!(meta.title.as_deref(), Some("Dawn"));
        assert_eq!(meta.caption.as_deref(), Some("First light"));
        assert_eq!(meta.author.as_deref(), Some("Ana"));
        assert_eq!(meta.copyright.as_deref(), Some("(c) Ana"));
        assert_eq!(meta.keywords, vec!["sky", "morning"]);
    }

    #[test]
    fn decode_skips_other_records() {
        let iim = [0x1C, 0x01, 0x05, 0x00, 0x03, b'f', b'o', b'o'];
        assert!(decode_iim(&iim).is_empty());
    }

    #[test]
    fn decode_stops_on_truncated_dataset() {
        let iim = [0x1C, 0x02, 0x05, 0x00, 0x09, b'x'];
        assert!(decode_iim(&iim).is_empty());
    }

    #[test]
    fn reads_jpeg_on_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        std::fs::write(&path, jpeg_with(&dataset(120, b"Harbour at dusk"))).unwrap();

        let meta = read(&path);
        assert_eq!(meta.caption.as_deref(), Some("Harbour at dusk"));
    }

    #[test]
    fn non_jpeg_has_no_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.pdf");
        std::fs::write(&path, jpeg_with(&dataset(5, b"x"))).unwrap();
        assert!(read(&path).is_empty());
    }

    #[test]
    fn missing_file_has_no_metadata() {
        assert!(read(Path::new("/nonexistent/photo.jpg")).is_empty());
    }
}
