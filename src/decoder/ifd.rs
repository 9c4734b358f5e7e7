//! Function for reading TIFF tags

use std::fmt;
use std::io::{self, Read, Seek};

use super::stream::{EndianReader, SmartReader};
use crate::error::{RawError, RawFormatError, RawResult};
use crate::tags::Type;

/// Turns an offset field value into an absolute stream position.
///
/// Offset fields hold at most a LONG. Values outside `0..=u32::MAX`, and sums
/// with `base` that overflow, are reported as lying outside the `len` byte
/// stream.
pub fn resolve_offset(value: f64, base: u64, len: u64) -> RawResult<u64> {
    let out_of_bounds =
        || -> RawError { RawFormatError::OffsetOutOfBounds(value as u64, len).into() };
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(out_of_bounds());
    }
    (value as u64).checked_add(base).ok_or_else(out_of_bounds)
}

/// Where the value bytes of an entry live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueLocation {
    /// The value fits the 4 byte field of the entry itself, at this position.
    Inline(u64),
    /// The entry field holds an offset; this is the absolute position it resolves to.
    Indirect(u64),
}

impl ValueLocation {
    pub fn position(self) -> u64 {
        match self {
            ValueLocation::Inline(pos) | ValueLocation::Indirect(pos) => pos,
        }
    }
}

/// Resolves the value location of an entry whose 4 byte value field starts at
/// the current reader position.
///
/// Values wider than 4 bytes are stored elsewhere; the field then holds an
/// offset relative to `base`. The reader is advanced past the offset in that
/// case and left untouched otherwise.
pub fn tag_data_location<R: Read + Seek>(
    reader: &mut SmartReader<R>,
    type_: Type,
    count: u32,
    base: u64,
) -> io::Result<ValueLocation> {
    if type_.value_bytes(count) > 4 {
        let offset = reader.read_u32()?;
        Ok(ValueLocation::Indirect(u64::from(offset) + base))
    } else {
        Ok(ValueLocation::Inline(reader.position()?))
    }
}

/// Reads one scalar of the given field type and widens it to `f64`.
///
/// Rationals are divided out, a zero denominator yields `0.0`. Field types
/// outside the known vocabulary are read as a single signed byte.
pub fn read_value<R: EndianReader>(reader: &mut R, type_: Type) -> io::Result<f64> {
    Ok(match type_ {
        Type::BYTE | Type::ASCII | Type::UNDEFINED => f64::from(reader.read_u8()?),
        Type::SHORT => f64::from(reader.read_u16()?),
        Type::LONG | Type::IFD => f64::from(reader.read_u32()?),
        Type::RATIONAL => {
            let numerator = reader.read_u32()?;
            let denominator = reader.read_u32()?;
            ratio(f64::from(numerator), f64::from(denominator))
        }
        Type::SBYTE => f64::from(reader.read_i8()?),
        Type::SSHORT => f64::from(reader.read_i16()?),
        Type::SLONG => f64::from(reader.read_i32()?),
        Type::SRATIONAL => {
            let numerator = reader.read_i32()?;
            let denominator = reader.read_i32()?;
            ratio(f64::from(numerator), f64::from(denominator))
        }
        Type::FLOAT => f64::from(reader.read_f32()?),
        Type::DOUBLE => reader.read_f64()?,
        Type::LONG8 => reader.read_u64()? as f64,
        Type::Unknown(_) => f64::from(reader.read_i8()?),
    })
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// One 12 byte directory entry.
///
/// An IFD entry has four fields:
///
/// Tag   2 bytes
/// Type  2 bytes
/// Count 4 bytes
/// Value 4 bytes either a pointer the value itself
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    pub tag: u16,
    pub type_: Type,
    pub count: u32,
    /// Absolute position of the value field inside the entry.
    pub value_position: u64,
    pub location: ValueLocation,
}

impl fmt::Debug for Entry {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Entry {{ tag: {:#06x}, type_: {:?}, count: {}, location: {:?} }}",
            self.tag, self.type_, self.count, self.location
        )
    }
}

impl Entry {
    /// Reads the entry at the current position, resolving indirect values
    /// against `base`. The reader is left at the start of the next entry.
    pub fn read<R: Read + Seek>(reader: &mut SmartReader<R>, base: u64) -> io::Result<Entry> {
        let tag = reader.read_u16()?;
        let type_ = Type::from_u16_exhaustive(reader.read_u16()?);
        let count = reader.read_u32()?;
        let value_position = reader.position()?;
        let location = tag_data_location(reader, type_, count, base)?;
        let entry = Entry {
            tag,
            type_,
            count,
            value_position,
            location,
        };
        reader.goto_offset(entry.next_entry())?;
        Ok(entry)
    }

    /// Position of the entry that follows this one.
    #[inline(always)]
    pub fn next_entry(&self) -> u64 {
        self.value_position + 4
    }

    pub fn value_bytes(&self) -> u64 {
        self.type_.value_bytes(self.count)
    }

    /// Reads the first value of the entry.
    pub fn val<R: Read + Seek>(&self, reader: &mut SmartReader<R>) -> io::Result<f64> {
        reader.goto_offset(self.location.position())?;
        read_value(reader, self.type_)
    }

    /// Reads `n` consecutive values, regardless of the declared count.
    pub fn vals<R: Read + Seek>(&self, reader: &mut SmartReader<R>, n: usize) -> io::Result<Vec<f64>> {
        reader.goto_offset(self.location.position())?;
        (0..n).map(|_| read_value(reader, self.type_)).collect()
    }

    /// Reads up to `max` raw bytes of the value.
    pub fn raw_bytes<R: Read + Seek>(
        &self,
        reader: &mut SmartReader<R>,
        max: usize,
    ) -> io::Result<Vec<u8>> {
        let len = usize::try_from(self.value_bytes()).map_or(max, |len| len.min(max));
        let mut buf = vec![0; len];
        reader.goto_offset(self.location.position())?;
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}
