// Big-endian primitive readers over a byte window

use crate::core::error::{CsdError, Result};

pub fn read_be_int(bytes: &[u8], offset: usize, width: usize) -> Option<i64> {
    let field = bytes.get(offset..offset.checked_add(width)?)?;
    match width {
        1 => Some(i64::from(field[0] as i8)),
        2 => Some(i64::from(i16::from_be_bytes(field.try_into().ok()?))),
        4 => Some(i64::from(i32::from_be_bytes(field.try_into().ok()?))),
        8 => Some(i64::from_be_bytes(field.try_into().ok()?)),
        _ => None,
    }
}

pub fn read_be_f64(bytes: &[u8], offset: usize) -> Option<f64> {
    let field = bytes.get(offset..offset.checked_add(8)?)?;
    Some(f64::from_be_bytes(field.try_into().ok()?))
}

pub fn read_be_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let field = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes(field.try_into().ok()?))
}

/// Decoded text plus whether the UTF-8 stage was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub fell_back: bool,
}

fn trim_field(s: &str) -> &str {
    s.trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
}

/// UTF-8, then the printable 7-bit ASCII subset, then `default`.
///
/// A stage that produces nothing after trimming counts as failed, so zeroed
/// regions end up at `default` as well.
pub fn decode_text(raw: &[u8], default: &str) -> DecodedText {
    if let Ok(s) = std::str::from_utf8(raw) {
        let trimmed = trim_field(s);
        if !trimmed.is_empty() {
            return DecodedText {
                text: trimmed.to_string(),
                fell_back: false,
            };
        }
        return DecodedText {
            text: default.to_string(),
            fell_back: false,
        };
    }

    let printable: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| (0x20..=0x7e).contains(b))
        .collect();
    let text = match std::str::from_utf8(&printable) {
        Ok(s) if !trim_field(s).is_empty() => trim_field(s).to_string(),
        _ => default.to_string(),
    };

    DecodedText {
        text,
        fell_back: true,
    }
}

pub fn read_fixed_text(bytes: &[u8], offset: usize, length: usize, default: &str) -> DecodedText {
    let end = offset.saturating_add(length).min(bytes.len());
    let raw = bytes.get(offset..end).unwrap_or(&[]);
    decode_text(raw, default)
}

/// 2-byte length, then up to `length` bytes of a `capacity`-byte region.
/// A length larger than the region is clamped to it.
pub fn read_length_prefixed_text(
    bytes: &[u8],
    offset: usize,
    capacity: usize,
    default: &str,
) -> DecodedText {
    let len = bytes
        .get(offset..offset.saturating_add(2))
        .and_then(|b| b.try_into().ok())
        .map(|b: [u8; 2]| u16::from_be_bytes(b) as usize)
        .unwrap_or(0);

    let start = offset.saturating_add(2);
    let end = start
        .saturating_add(len.min(capacity))
        .min(bytes.len());
    let raw = bytes.get(start..end).unwrap_or(&[]);
    decode_text(raw, default)
}

/// Bounds-checked view over one header region.
///
/// Every read is checked against the region so a short buffer surfaces as a
/// structural error rather than a panic.
pub struct ByteWindow<'a> {
    bytes: &'a [u8],
    region: &'static str,
}

impl<'a> ByteWindow<'a> {
    pub fn new(bytes: &'a [u8], region: &'static str, needed: usize) -> Result<Self> {
        if bytes.len() < needed {
            return Err(CsdError::Structural {
                region,
                needed,
                available: bytes.len(),
            });
        }
        Ok(Self {
            bytes: &bytes[..needed],
            region,
        })
    }

    fn short(&self, offset: usize, width: usize) -> CsdError {
        CsdError::Structural {
            region: self.region,
            needed: offset + width,
            available: self.bytes.len(),
        }
    }

    pub fn u8(&self, offset: usize) -> Result<u8> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or_else(|| self.short(offset, 1))
    }

    pub fn i16(&self, offset: usize) -> Result<i16> {
        read_be_int(self.bytes, offset, 2)
            .map(|v| v as i16)
            .ok_or_else(|| self.short(offset, 2))
    }

    pub fn i32(&self, offset: usize) -> Result<i32> {
        read_be_int(self.bytes, offset, 4)
            .map(|v| v as i32)
            .ok_or_else(|| self.short(offset, 4))
    }

    pub fn i64(&self, offset: usize) -> Result<i64> {
        read_be_int(self.bytes, offset, 8).ok_or_else(|| self.short(offset, 8))
    }

    pub fn f64(&self, offset: usize) -> Result<f64> {
        read_be_f64(self.bytes, offset).ok_or_else(|| self.short(offset, 8))
    }

    pub fn fixed_text(&self, offset: usize, length: usize, default: &str) -> DecodedText {
        read_fixed_text(self.bytes, offset, length, default)
    }

    pub fn prefixed_text(&self, offset: usize, capacity: usize, default: &str) -> DecodedText {
        read_length_prefixed_text(self.bytes, offset, capacity, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be_int_widths() {
        let bytes = [0xff, 0xfe, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02];
        assert_eq!(read_be_int(&bytes, 0, 1), Some(-1));
        assert_eq!(read_be_int(&bytes, 0, 2), Some(-2));
        assert_eq!(read_be_int(&bytes, 2, 4), Some(1 << 8));
        assert_eq!(
            read_be_int(&bytes, 1, 8),
            Some(i64::from_be_bytes([0xfe, 0, 0, 1, 0, 0, 0, 2]))
        );
        assert_eq!(read_be_int(&bytes, 0, 3), None);
        assert_eq!(read_be_int(&bytes, 6, 4), None);
    }

    #[test]
    fn test_read_be_f64() {
        let bytes = 37.5f64.to_be_bytes();
        assert_eq!(read_be_f64(&bytes, 0), Some(37.5));
        assert_eq!(read_be_f64(&bytes, 1), None);
    }

    #[test]
    fn test_fixed_text_trims() {
        let mut bytes = b"ACME GmbH   ".to_vec();
        bytes.extend_from_slice(&[0, 0, 0]);
        let decoded = read_fixed_text(&bytes, 0, bytes.len(), "x");
        assert_eq!(decoded.text, "ACME GmbH");
        assert!(!decoded.fell_back);

        let decoded = read_fixed_text(b"  Sensor A\0\0", 0, 12, "x");
        assert_eq!(decoded.text, "  Sensor A");
    }

    #[test]
    fn test_length_prefixed_text() {
        let mut bytes = vec![0u8, 4];
        bytes.extend_from_slice(b"TempXXXXXX");
        let decoded = read_length_prefixed_text(&bytes, 0, 10, "x");
        assert_eq!(decoded.text, "Temp");
    }

    #[test]
    fn test_length_prefix_clamped_to_capacity() {
        let mut bytes = vec![0xffu8, 0xff];
        bytes.extend_from_slice(b"abc");
        bytes.extend_from_slice(b"not part of field");
        let decoded = read_length_prefixed_text(&bytes, 0, 3, "x");
        assert_eq!(decoded.text, "abc");
    }

    #[test]
    fn test_invalid_utf8_keeps_ascii() {
        let bytes = [b'k', 0xff, b'P', b'a'];
        let decoded = decode_text(&bytes, "fallback");
        assert_eq!(decoded.text, "kPa");
        assert!(decoded.fell_back);
    }

    #[test]
    fn test_garbage_uses_default() {
        let bytes = [0xff, 0xfe, 0x80, 0x81];
        let decoded = decode_text(&bytes, "Channel 3");
        assert_eq!(decoded.text, "Channel 3");
        assert!(decoded.fell_back);

        let zeroed = [0u8; 16];
        assert_eq!(decode_text(&zeroed, "Channel 1").text, "Channel 1");
    }

    #[test]
    fn test_window_rejects_short_buffer() {
        let bytes = [0u8; 10];
        match ByteWindow::new(&bytes, "file header", 34) {
            Err(CsdError::Structural {
                needed, available, ..
            }) => {
                assert_eq!(needed, 34);
                assert_eq!(available, 10);
            }
            _ => panic!("expected structural error"),
        }
    }
}
