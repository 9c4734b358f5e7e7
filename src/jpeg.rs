//! Baseline JPEG header parsing.
//!
//! Walks the marker segments of a JPEG stream up to and including the first
//! start-of-scan header and describes the frame, the tables and the scan.
//! The entropy coded data after SOS is not touched.

use std::io::{self, Read};

use log::trace;

use crate::error::{CapacityError, JpegFormatError, RawResult};

/// Start Of Image marker
pub const SOI: u8 = 0xD8;
/// End Of Image marker
pub const EOI: u8 = 0xD9;
/// Start Of Frame (baseline DCT) marker
pub const SOF0: u8 = 0xC0;
/// Start Of Frame (extended sequential DCT) marker
pub const SOF1: u8 = 0xC1;
/// Define Huffman Table marker
pub const DHT: u8 = 0xC4;
/// Start Of Scan marker
pub const SOS: u8 = 0xDA;
/// Define Quantization Table marker
pub const DQT: u8 = 0xDB;
/// Define Restart Interval marker
pub const DRI: u8 = 0xDD;
/// Application segment 0 (JFIF) marker
pub const APP0: u8 = 0xE0;

/// Largest symbol count of one Huffman table.
pub const MAX_HUFFMAN_SYMBOLS: usize = 162;
pub const MAX_COMPONENTS: usize = 6;
pub const MAX_TABLES: usize = 4;

/// Natural (row-major) index of the i-th coefficient in zig-zag order.
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// How much of the stream has to be present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// Only the frame header is required. Huffman tables are skipped.
    InfoOnly,
    /// Frame, quantization and Huffman tables, scan header and restart
    /// interval are all required.
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Low byte of the SOF marker, `0xC0` or `0xC1`.
    pub marker: u8,
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    pub components: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColourComponent {
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table: u8,
    pub dc_table: u8,
    pub ac_table: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantTable {
    /// Coefficients in natural order.
    pub values: [u16; 64],
    pub precise: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HuffmanTable {
    /// `offsets[n]` is the number of codes shorter than `n + 1` bits.
    pub offsets: [u8; 17],
    pub symbols: [u8; MAX_HUFFMAN_SYMBOLS],
}

impl HuffmanTable {
    pub fn symbol_count(&self) -> usize {
        usize::from(self.offsets[16])
    }

    /// Symbols whose codes are `length` bits long. `None` unless `length` is
    /// in `1..=16`.
    pub fn symbols_of_length(&self, length: usize) -> Option<&[u8]> {
        let start = usize::from(*self.offsets.get(length.checked_sub(1)?)?);
        let end = usize::from(*self.offsets.get(length)?);
        self.symbols.get(start..end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanComponent {
    /// One-based component id.
    pub id: u8,
    pub dc_table: u8,
    pub ac_table: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scan {
    pub components: Vec<ScanComponent>,
    pub spectral_start: u8,
    pub spectral_end: u8,
    pub approx_high: u8,
    pub approx_low: u8,
}

/// Structural description of a JPEG header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JpegInfo {
    pub frame: Frame,
    /// Indexed by one-based component id minus one.
    pub components: [Option<ColourComponent>; MAX_COMPONENTS],
    pub quant_tables: [Option<QuantTable>; MAX_TABLES],
    pub dc_tables: [Option<HuffmanTable>; MAX_TABLES],
    pub ac_tables: [Option<HuffmanTable>; MAX_TABLES],
    pub scan: Option<Scan>,
    pub restart_interval: Option<u16>,
    /// The stream numbered its components from zero.
    pub zero_based: bool,
}

impl JpegInfo {
    /// Parses the marker segments of the stream at the current position,
    /// which must be a start-of-image marker. The reader is left just past
    /// the SOS header, or at the end of the stream.
    pub fn parse<R: Read>(reader: &mut R, mode: ParseMode) -> RawResult<JpegInfo> {
        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic)?;
        if magic != [0xFF, SOI] {
            return Err(JpegFormatError::SoiNotFound(u16::from_be_bytes(magic)).into());
        }

        let mut state = ParseState::default();
        while let Some(marker) = next_marker(reader)? {
            match marker {
                EOI => break,
                // Stuffed zero and standalone markers without a length field
                0x00 | 0x01 | 0xD0..=0xD8 => continue,
                _ => {}
            }

            let mut length = [0u8; 2];
            reader.read_exact(&mut length)?;
            let length = u16::from_be_bytes(length);
            if length < 2 {
                return Err(JpegFormatError::InvalidSegmentLength(marker, length).into());
            }
            let body_len = usize::from(length - 2);
            trace!("jpeg segment 0xff{:02x}, {} bytes", marker, body_len);

            if marker == DHT && mode == ParseMode::InfoOnly {
                skip(reader, body_len)?;
                continue;
            }
            match marker {
                SOF0 | SOF1 | DHT | DQT | SOS | DRI => {
                    let mut data = vec![0u8; body_len];
                    reader.read_exact(&mut data)?;
                    let mut body = Segment::new(marker, &data);
                    match marker {
                        SOF0 | SOF1 => state.parse_sof(&mut body)?,
                        DHT => state.parse_dht(&mut body)?,
                        DQT => state.parse_dqt(&mut body)?,
                        DRI => state.parse_dri(&mut body)?,
                        _ => {
                            state.parse_sos(&mut body)?;
                            break;
                        }
                    }
                }
                // APP0 and everything else are skipped verbatim
                _ => skip(reader, body_len)?,
            }
        }

        state.finish(mode)
    }

    pub fn width(&self) -> u16 {
        self.frame.width
    }

    pub fn height(&self) -> u16 {
        self.frame.height
    }

    pub fn precision(&self) -> u8 {
        self.frame.precision
    }

    pub fn component_count(&self) -> u8 {
        self.frame.components
    }
}

/// Finds the next marker byte. Bytes that are not `0xFF` are skipped, as are
/// `0xFF` fill bytes. `None` at the end of the stream.
fn next_marker<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    let mut skipped = 0usize;
    loop {
        if reader.read(&mut byte)? == 0 {
            return Ok(None);
        }
        if byte[0] == 0xFF {
            break;
        }
        skipped += 1;
    }
    loop {
        if reader.read(&mut byte)? == 0 {
            return Ok(None);
        }
        if byte[0] != 0xFF {
            break;
        }
    }
    if skipped > 0 {
        trace!("resynchronized after {} stray bytes", skipped);
    }
    Ok(Some(byte[0]))
}

fn skip<R: Read>(reader: &mut R, len: usize) -> io::Result<()> {
    let copied = io::copy(&mut reader.by_ref().take(len as u64), &mut io::sink())?;
    if copied < len as u64 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

/// Big-endian view over one segment body.
struct Segment<'a> {
    marker: u8,
    data: &'a [u8],
    pos: usize,
}

impl<'a> Segment<'a> {
    fn new(marker: u8, data: &'a [u8]) -> Segment<'a> {
        Segment {
            marker,
            data,
            pos: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn u8(&mut self) -> Result<u8, JpegFormatError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(JpegFormatError::TruncatedSegment(self.marker))?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, JpegFormatError> {
        Ok(u16::from(self.u8()?) << 8 | u16::from(self.u8()?))
    }

    /// High and low nibble.
    fn nibbles(&mut self) -> Result<(u8, u8), JpegFormatError> {
        let byte = self.u8()?;
        Ok((byte >> 4, byte & 0x0f))
    }
}

#[derive(Default)]
struct ParseState {
    frame: Option<Frame>,
    components: [Option<ColourComponent>; MAX_COMPONENTS],
    quant_tables: [Option<QuantTable>; MAX_TABLES],
    dc_tables: [Option<HuffmanTable>; MAX_TABLES],
    ac_tables: [Option<HuffmanTable>; MAX_TABLES],
    scan: Option<Scan>,
    restart_interval: Option<u16>,
    zero_based: bool,
}

impl ParseState {
    /// Maps a stream component id to a one-based id in `1..=6`.
    fn component_id(&self, raw: u8) -> Result<u8, JpegFormatError> {
        let id = if self.zero_based { raw.checked_add(1) } else { Some(raw) };
        match id {
            Some(id @ 1..=6) => Ok(id),
            _ => Err(JpegFormatError::ComponentIdOutOfRange(raw)),
        }
    }

    fn parse_sof(&mut self, body: &mut Segment) -> RawResult<()> {
        if self.frame.is_some() {
            return Err(JpegFormatError::DuplicateFrame.into());
        }
        let precision = body.u8()?;
        let height = body.u16()?;
        let width = body.u16()?;
        let count = body.u8()?;
        if precision == 0 || precision > 16 {
            return Err(JpegFormatError::InvalidPrecision(precision).into());
        }
        if count == 0 || usize::from(count) > MAX_COMPONENTS {
            return Err(JpegFormatError::InvalidComponentCount(count).into());
        }
        if width == 0 || height == 0 {
            return Err(JpegFormatError::ZeroDimension(width, height).into());
        }

        for _ in 0..count {
            let raw = body.u8()?;
            if raw == 0 {
                self.zero_based = true;
            }
            let id = self.component_id(raw)?;
            let (h_sampling, v_sampling) = body.nibbles()?;
            let quant_table = body.u8()?;
            if usize::from(quant_table) >= MAX_TABLES {
                return Err(JpegFormatError::QuantTableIdOutOfRange(quant_table).into());
            }
            let slot = &mut self.components[usize::from(id - 1)];
            if slot.is_some() {
                return Err(JpegFormatError::DuplicateComponent(id).into());
            }
            *slot = Some(ColourComponent {
                h_sampling,
                v_sampling,
                quant_table,
                ..ColourComponent::default()
            });
        }

        self.frame = Some(Frame {
            marker: body.marker,
            precision,
            width,
            height,
            components: count,
        });
        Ok(())
    }

    fn parse_dqt(&mut self, body: &mut Segment) -> RawResult<()> {
        while body.remaining() > 0 {
            let (class, id) = body.nibbles()?;
            if usize::from(id) >= MAX_TABLES {
                return Err(JpegFormatError::QuantTableIdOutOfRange(id).into());
            }
            let precise = class != 0;
            let mut values = [0u16; 64];
            for &index in ZIGZAG.iter() {
                values[index] = if precise {
                    body.u16()?
                } else {
                    u16::from(body.u8()?)
                };
            }
            self.quant_tables[usize::from(id)] = Some(QuantTable { values, precise });
        }
        Ok(())
    }

    fn parse_dht(&mut self, body: &mut Segment) -> RawResult<()> {
        while body.remaining() > 0 {
            let (class, id) = body.nibbles()?;
            if usize::from(id) >= MAX_TABLES {
                return Err(JpegFormatError::HuffmanTableIdOutOfRange(id).into());
            }
            if class > 1 {
                return Err(JpegFormatError::InvalidHuffmanClass(class).into());
            }

            let mut counts = [0usize; 17];
            for length in 1..=16 {
                counts[length] = counts[length - 1] + usize::from(body.u8()?);
            }
            let total = counts[16];
            if total > MAX_HUFFMAN_SYMBOLS {
                return Err(CapacityError::TooManyHuffmanSymbols(total).into());
            }

            let mut table = HuffmanTable {
                offsets: [0; 17],
                symbols: [0; MAX_HUFFMAN_SYMBOLS],
            };
            for (offset, &count) in table.offsets.iter_mut().zip(counts.iter()) {
                // bounded by the check above
                *offset = count as u8;
            }
            for symbol in table.symbols[..total].iter_mut() {
                *symbol = body.u8()?;
            }

            let tables = if class == 0 {
                &mut self.dc_tables
            } else {
                &mut self.ac_tables
            };
            tables[usize::from(id)] = Some(table);
        }
        Ok(())
    }

    fn parse_sos(&mut self, body: &mut Segment) -> RawResult<()> {
        if self.frame.is_none() {
            return Err(JpegFormatError::ScanBeforeFrame.into());
        }

        let count = body.u8()?;
        let mut seen = [false; MAX_COMPONENTS];
        let mut components = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let raw = body.u8()?;
            let id = self.component_id(raw)?;
            let index = usize::from(id - 1);
            if seen[index] {
                return Err(JpegFormatError::DuplicateComponent(id).into());
            }
            seen[index] = true;

            let (dc_table, ac_table) = body.nibbles()?;
            for table in [dc_table, ac_table] {
                if usize::from(table) >= MAX_TABLES {
                    return Err(JpegFormatError::HuffmanTableIdOutOfRange(table).into());
                }
            }
            let component = self.components[index]
                .as_mut()
                .ok_or(JpegFormatError::ComponentIdOutOfRange(raw))?;
            component.dc_table = dc_table;
            component.ac_table = ac_table;
            components.push(ScanComponent {
                id,
                dc_table,
                ac_table,
            });
        }

        let spectral_start = body.u8()?;
        let spectral_end = body.u8()?;
        let (approx_high, approx_low) = body.nibbles()?;
        if spectral_start != 0 || spectral_end != 63 {
            return Err(
                JpegFormatError::UnsupportedSpectralSelection(spectral_start, spectral_end).into(),
            );
        }
        if approx_high != 0 || approx_low != 0 {
            return Err(JpegFormatError::UnsupportedApproximation(approx_high, approx_low).into());
        }
        if body.remaining() != 0 {
            return Err(JpegFormatError::ScanLengthMismatch(body.data.len(), body.pos).into());
        }

        self.scan = Some(Scan {
            components,
            spectral_start,
            spectral_end,
            approx_high,
            approx_low,
        });
        Ok(())
    }

    fn parse_dri(&mut self, body: &mut Segment) -> RawResult<()> {
        self.restart_interval = Some(body.u16()?);
        Ok(())
    }

    fn finish(self, mode: ParseMode) -> RawResult<JpegInfo> {
        let frame = self.frame.ok_or(JpegFormatError::MissingFrame)?;
        if mode == ParseMode::Full {
            if self.quant_tables.iter().all(Option::is_none) {
                return Err(JpegFormatError::MissingSegment("DQT").into());
            }
            if self.dc_tables.iter().chain(&self.ac_tables).all(Option::is_none) {
                return Err(JpegFormatError::MissingSegment("DHT").into());
            }
            if self.scan.is_none() {
                return Err(JpegFormatError::MissingSegment("SOS").into());
            }
            if self.restart_interval.is_none() {
                return Err(JpegFormatError::MissingSegment("DRI").into());
            }
        }
        Ok(JpegInfo {
            frame,
            components: self.components,
            quant_tables: self.quant_tables,
            dc_tables: self.dc_tables,
            ac_tables: self.ac_tables,
            scan: self.scan,
            restart_interval: self.restart_interval,
            zero_based: self.zero_based,
        })
    }
}
