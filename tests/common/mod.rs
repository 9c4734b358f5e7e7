//! In-memory construction of TIFF structures.
#![allow(dead_code)]

use std::io::Cursor;

use rawmeta::decoder::Decoder;

pub const BYTE: u16 = 1;
pub const ASCII: u16 = 2;
pub const SHORT: u16 = 3;
pub const LONG: u16 = 4;
pub const RATIONAL: u16 = 5;
pub const UNDEFINED: u16 = 7;
pub const SRATIONAL: u16 = 10;
pub const FLOAT: u16 = 11;
pub const DOUBLE: u16 = 12;

/// One directory entry with its four value bytes already encoded.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub tag: u16,
    pub type_: u16,
    pub count: u32,
    pub value: [u8; 4],
}

/// A directory written by [`TiffBuilder::ifd`].
#[derive(Clone, Copy, Debug)]
pub struct Ifd {
    pub offset: u32,
    next_at: usize,
}

/// Appends TIFF structures to a buffer. Offsets are relative to the start
/// of the buffer, which holds the header.
pub struct TiffBuilder {
    pub bytes: Vec<u8>,
    big_endian: bool,
}

impl TiffBuilder {
    pub fn little() -> TiffBuilder {
        TiffBuilder::with_signature(*b"II", false)
    }

    pub fn big() -> TiffBuilder {
        TiffBuilder::with_signature(*b"MM", true)
    }

    fn with_signature(signature: [u8; 2], big_endian: bool) -> TiffBuilder {
        let mut builder = TiffBuilder {
            bytes: signature.to_vec(),
            big_endian,
        };
        builder.put_u16(42);
        builder.put_u32(0);
        builder
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn put_u16(&mut self, value: u16) {
        let bytes = self.u16_bytes(value);
        self.bytes.extend_from_slice(&bytes);
    }

    pub fn put_u32(&mut self, value: u32) {
        let bytes = self.u32_bytes(value);
        self.bytes.extend_from_slice(&bytes);
    }

    pub fn set_u32(&mut self, at: usize, value: u32) {
        let bytes = self.u32_bytes(value);
        self.bytes[at..at + 4].copy_from_slice(&bytes);
    }

    /// Points the header at the first directory.
    pub fn set_first(&mut self, ifd: Ifd) {
        self.set_u32(4, ifd.offset);
    }

    /// Sets the "next IFD" link of `ifd`.
    pub fn link(&mut self, ifd: Ifd, next: u32) {
        self.set_u32(ifd.next_at, next);
    }

    /// Rewrites the value field of entry `index` of `ifd`, for entries whose
    /// data is appended after the directory.
    pub fn patch(&mut self, ifd: Ifd, index: usize, offset: u32) {
        self.set_u32(ifd.offset as usize + 2 + 12 * index + 8, offset);
    }

    /// Appends raw data at an even offset.
    pub fn blob(&mut self, data: &[u8]) -> u32 {
        if self.bytes.len() % 2 == 1 {
            self.bytes.push(0);
        }
        let offset = self.len();
        self.bytes.extend_from_slice(data);
        offset
    }

    pub fn rationals(&mut self, values: &[(u32, u32)]) -> u32 {
        let mut data = Vec::new();
        for &(num, den) in values {
            data.extend_from_slice(&self.u32_bytes(num));
            data.extend_from_slice(&self.u32_bytes(den));
        }
        self.blob(&data)
    }

    pub fn longs(&mut self, values: &[u32]) -> u32 {
        let data: Vec<u8> = values.iter().flat_map(|&v| self.u32_bytes(v)).collect();
        self.blob(&data)
    }

    /// Appends a directory with a zero "next IFD" link.
    pub fn ifd(&mut self, fields: &[Field]) -> Ifd {
        if self.bytes.len() % 2 == 1 {
            self.bytes.push(0);
        }
        let offset = self.len();
        self.put_u16(fields.len() as u16);
        for field in fields {
            self.put_u16(field.tag);
            self.put_u16(field.type_);
            self.put_u32(field.count);
            self.bytes.extend_from_slice(&field.value);
        }
        let next_at = self.bytes.len();
        self.put_u32(0);
        Ifd { offset, next_at }
    }

    pub fn short(&self, tag: u16, value: u16) -> Field {
        let mut bytes = [0u8; 4];
        bytes[..2].copy_from_slice(&self.u16_bytes(value));
        Field {
            tag,
            type_: SHORT,
            count: 1,
            value: bytes,
        }
    }

    pub fn shorts(&self, tag: u16, values: [u16; 2]) -> Field {
        let mut bytes = [0u8; 4];
        bytes[..2].copy_from_slice(&self.u16_bytes(values[0]));
        bytes[2..].copy_from_slice(&self.u16_bytes(values[1]));
        Field {
            tag,
            type_: SHORT,
            count: 2,
            value: bytes,
        }
    }

    pub fn long(&self, tag: u16, value: u32) -> Field {
        Field {
            tag,
            type_: LONG,
            count: 1,
            value: self.u32_bytes(value),
        }
    }

    /// An entry whose value lives at `offset`.
    pub fn at(&self, tag: u16, type_: u16, count: u32, offset: u32) -> Field {
        Field {
            tag,
            type_,
            count,
            value: self.u32_bytes(offset),
        }
    }

    /// An entry with up to four value bytes stored inline as given.
    pub fn inline(&self, tag: u16, type_: u16, count: u32, value: [u8; 4]) -> Field {
        Field {
            tag,
            type_,
            count,
            value,
        }
    }

    /// A NUL terminated string, inline when it fits.
    pub fn ascii(&mut self, tag: u16, text: &str) -> Field {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        let count = data.len() as u32;
        if data.len() <= 4 {
            let mut value = [0u8; 4];
            value[..data.len()].copy_from_slice(&data);
            self.inline(tag, ASCII, count, value)
        } else {
            let offset = self.blob(&data);
            self.at(tag, ASCII, count, offset)
        }
    }

    pub fn into_decoder(self) -> Decoder<Cursor<Vec<u8>>> {
        Decoder::new(Cursor::new(self.bytes)).expect("in-memory stream has a length")
    }

    fn u16_bytes(&self, value: u16) -> [u8; 2] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    fn u32_bytes(&self, value: u32) -> [u8; 4] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }
}

/// A minimal baseline JPEG header: SOI, an optional APP1 Exif segment
/// carrying `exif`, SOF0, SOS and EOI.
pub fn jpeg(width: u16, height: u16, precision: u8, exif: Option<&[u8]>) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    if let Some(tiff) = exif {
        data.extend_from_slice(&[0xFF, 0xE1]);
        data.extend_from_slice(&(2 + 6 + tiff.len() as u16).to_be_bytes());
        data.extend_from_slice(b"Exif\0\0");
        data.extend_from_slice(tiff);
    }
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 17, precision]);
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
    data.extend_from_slice(&[0xFF, 0xDA, 0x00, 12, 3, 1, 0x00, 2, 0x11, 3, 0x11, 0, 63, 0]);
    data.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56, 0xFF, 0xD9]);
    data
}
