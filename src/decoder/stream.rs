//! All IO functionality needed for RAW metadata decoding

use std::io::{self, Read, Seek};

/// Byte order of the TIFF file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// little endian byte order
    LittleEndian,
    /// big endian byte order
    BigEndian,
}

impl ByteOrder {
    /// Maps the two byte signature at the start of a TIFF stream.
    pub fn from_signature(signature: [u8; 2]) -> Option<ByteOrder> {
        match &signature {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }
}

macro_rules! read_fn {
    ($name:ident, $type:ty) => {
        /// reads an $type
        #[inline(always)]
        fn $name(&mut self) -> Result<$type, io::Error> {
            let mut n = [0u8; std::mem::size_of::<$type>()];
            self.read_exact(&mut n)?;
            Ok(match self.byte_order() {
                ByteOrder::LittleEndian => <$type>::from_le_bytes(n),
                ByteOrder::BigEndian => <$type>::from_be_bytes(n),
            })
        }
    };
}

/// Reader that is aware of the byte order.
pub trait EndianReader: Read {
    /// Byte order that should be adhered to
    fn byte_order(&self) -> ByteOrder;

    read_fn!(read_u8, u8);
    read_fn!(read_u16, u16);
    read_fn!(read_i8, i8);
    read_fn!(read_i16, i16);
    read_fn!(read_u32, u32);
    read_fn!(read_i32, i32);
    read_fn!(read_u64, u64);

    /// Reads a 32 bit float by reinterpreting four ordered bytes.
    #[inline(always)]
    fn read_f32(&mut self) -> Result<f32, io::Error> {
        self.read_u32().map(f32::from_bits)
    }

    /// Reads a 64 bit float by reinterpreting eight ordered bytes.
    #[inline(always)]
    fn read_f64(&mut self) -> Result<f64, io::Error> {
        self.read_u64().map(f64::from_bits)
    }
}

///
/// ## SmartReader Reader
///

/// Reader that is aware of the byte order.
#[derive(Debug)]
pub struct SmartReader<R> {
    pub(super) reader: R,
    pub byte_order: ByteOrder,
}

impl<R> SmartReader<R> {
    /// Wraps a reader
    pub fn wrap(reader: R, byte_order: ByteOrder) -> SmartReader<R> {
        SmartReader { reader, byte_order }
    }
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> SmartReader<R> {
    pub fn goto_offset(&mut self, offset: u64) -> io::Result<()> {
        self.seek(io::SeekFrom::Start(offset)).map(|_| ())
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    /// Length of the underlying stream. The cursor is left where it was.
    pub fn stream_len(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(io::SeekFrom::End(0))?;
        self.goto_offset(pos)?;
        Ok(len)
    }
}

impl<R: Read> EndianReader for SmartReader<R> {
    #[inline(always)]
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

impl<R: Read> Read for SmartReader<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R: Read + Seek> Seek for SmartReader<R> {
    #[inline]
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.reader.seek(pos)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reader(bytes: &[u8], byte_order: ByteOrder) -> SmartReader<io::Cursor<Vec<u8>>> {
        SmartReader::wrap(io::Cursor::new(bytes.to_vec()), byte_order)
    }

    #[test]
    fn test_short_and_long_round_trip() {
        let samples: [[u8; 4]; 4] = [
            [0x00, 0x00, 0x00, 0x00],
            [0x12, 0x34, 0x56, 0x78],
            [0xff, 0x00, 0x80, 0x01],
            [0xff, 0xff, 0xff, 0xff],
        ];
        for bytes in samples {
            let mut le = reader(&bytes, ByteOrder::LittleEndian);
            assert_eq!(le.read_u32().unwrap().to_le_bytes(), bytes);
            let mut be = reader(&bytes, ByteOrder::BigEndian);
            assert_eq!(be.read_u32().unwrap().to_be_bytes(), bytes);

            let mut le = reader(&bytes[..2], ByteOrder::LittleEndian);
            assert_eq!(le.read_u16().unwrap().to_le_bytes(), bytes[..2]);
            let mut be = reader(&bytes[..2], ByteOrder::BigEndian);
            assert_eq!(be.read_u16().unwrap().to_be_bytes(), bytes[..2]);
        }
    }

    #[test]
    fn test_byte_significance() {
        let mut le = reader(&[0x01, 0x02], ByteOrder::LittleEndian);
        assert_eq!(le.read_u16().unwrap(), 0x0201);
        let mut be = reader(&[0x01, 0x02], ByteOrder::BigEndian);
        assert_eq!(be.read_u16().unwrap(), 0x0102);
    }

    #[test]
    fn test_signed_reinterprets_bits() {
        let mut le = reader(&[0xfe, 0xff, 0xff, 0xff, 0x80], ByteOrder::LittleEndian);
        assert_eq!(le.read_i32().unwrap(), -2);
        assert_eq!(le.read_i8().unwrap(), i8::MIN);
    }

    #[test]
    fn test_short_read_fails() {
        let mut le = reader(&[0x01, 0x02, 0x03], ByteOrder::LittleEndian);
        let err = le.read_u32().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_double_is_byte_order_dependent() {
        let value = 1.5f64;
        let mut le = reader(&value.to_le_bytes(), ByteOrder::LittleEndian);
        assert_eq!(le.read_f64().unwrap(), value);
        let mut be = reader(&value.to_be_bytes(), ByteOrder::BigEndian);
        assert_eq!(be.read_f64().unwrap(), value);
    }

    #[test]
    fn test_stream_len_keeps_position() {
        let mut r = reader(&[0; 10], ByteOrder::BigEndian);
        r.goto_offset(3).unwrap();
        assert_eq!(r.stream_len().unwrap(), 10);
        assert_eq!(r.position().unwrap(), 3);
    }

    #[test]
    fn test_signature() {
        assert_eq!(ByteOrder::from_signature(*b"II"), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::from_signature(*b"MM"), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::from_signature(*b"IM"), None);
    }
}
