//! Tag tables of the main, EXIF and GPS directories.

use std::io::{self, Read, Seek};

use log::{debug, trace};

use super::ifd::{resolve_offset, Entry};
use super::makernote::{magic_text, MakerNoteContext, MAGIC_LEN};
use super::stream::EndianReader;
use super::timestamp::{parse_timestamp, STAMP_LEN};
use super::{Decoder, ParseSession, Table, Task, Visit};
use crate::directory::{ByteRange, DirectoryOrigin, ExifData, FixedText};
use crate::error::{RawError, RawResult, SoftDataError};
use crate::jpeg::{JpegInfo, ParseMode};
use crate::tags::{ExifTag, GpsTag, Tag};

/// Compression code recorded for strips that turn out to hold a JPEG.
const COMPRESSION_JPEG: u16 = 6;
/// Distance from a JPEG strip to the TIFF structure some files place behind it.
const NESTED_TIFF_SKIP: u64 = 12;
/// `CFAPattern` starts with its 2x2 repeat dimensions.
const CFA_REPEAT_2X2: u32 = 0x0002_0002;

impl<R: Read + Seek> Decoder<R> {
    pub(super) fn dispatch_main(
        &mut self,
        session: &mut ParseSession,
        visit: &mut Visit,
        entry: &Entry,
    ) -> RawResult<()> {
        let reader = &mut self.reader;
        let dir = &mut visit.dir;
        match Tag::from_u16_exhaustive(entry.tag) {
            Tag::NewSubfileType | Tag::SubfileType => {}
            Tag::ImageWidth => dir.frame.width = Some(entry.val(reader)? as u32),
            Tag::ImageLength => dir.frame.height = Some(entry.val(reader)? as u32),
            Tag::BitsPerSample => {
                dir.frame.samples_per_pixel = Some(entry.count as u16);
                dir.frame.bits_per_sample = Some(entry.val(reader)? as u16);
            }
            Tag::Compression => dir.frame.compression = Some(entry.val(reader)? as u16),
            Tag::PhotometricInterpretation => {
                dir.frame.photometric_interpretation = Some(entry.val(reader)? as u16)
            }
            Tag::Orientation => dir.frame.orientation = Some(entry.val(reader)? as u16),
            Tag::SamplesPerPixel => {
                dir.frame.samples_per_pixel = Some(entry.val(reader)? as u16)
            }
            Tag::RowsPerStrip => dir.rows_per_strip = Some(entry.val(reader)? as u32),
            Tag::StripByteCounts => dir.strip_byte_counts = Some(entry.val(reader)? as u32),
            Tag::XResolution => dir.frame.x_resolution = Some(entry.val(reader)?),
            Tag::YResolution => dir.frame.y_resolution = Some(entry.val(reader)?),
            Tag::PlanarConfiguration => {
                dir.frame.planar_configuration = Some(entry.val(reader)? as u16)
            }
            Tag::TileWidth => dir.frame.tile_width = Some(entry.val(reader)? as u32),
            Tag::TileLength => dir.frame.tile_length = Some(entry.val(reader)? as u32),
            Tag::TileOffsets => {
                let offset = resolve_offset(entry.val(reader)?, visit.base, self.len)?;
                dir.tile_offset = Some(offset)
            }
            Tag::Make => set_text(&mut dir.exif.make, entry.raw_bytes(reader, FixedText::LEN)?),
            Tag::Model => set_text(&mut dir.exif.model, entry.raw_bytes(reader, FixedText::LEN)?),
            Tag::Software => {
                set_text(&mut dir.exif.software, entry.raw_bytes(reader, FixedText::LEN)?)
            }
            Tag::Artist => set_text(&mut dir.exif.artist, entry.raw_bytes(reader, FixedText::LEN)?),
            Tag::Copyright => {
                set_text(&mut dir.exif.copyright, entry.raw_bytes(reader, FixedText::LEN)?)
            }
            Tag::DateTime => self.read_timestamp(session, &mut visit.dir.exif, entry)?,
            Tag::StripOffsets | Tag::JpegInterchangeFormat => {
                dir.data_offset = Some(resolve_offset(entry.val(reader)?, visit.base, self.len)?);
                self.probe_strip(visit)?;
            }
            Tag::JpegInterchangeFormatLength => dir.jpeg_length = Some(entry.val(reader)? as u32),
            Tag::SubIfd => {
                // Slots beyond the ceiling would fail anyway.
                let wanted = self.limits.max_directories.saturating_add(1);
                let count = usize::try_from(entry.count).map_or(wanted, |c| c.min(wanted));
                for value in entry.vals(reader, count)? {
                    visit.children.push(Task::directory(
                        resolve_offset(value, visit.base, self.len)?,
                        visit.base,
                        reader.byte_order,
                        visit.depth + 1,
                        DirectoryOrigin::SubIfd,
                    ));
                }
            }
            Tag::ExifIfd => {
                let offset = resolve_offset(entry.val(reader)?, visit.base, self.len)?;
                self.read_table(session, visit, offset, Table::Exif)?;
            }
            Tag::GpsIfd => {
                let offset = resolve_offset(entry.val(reader)?, visit.base, self.len)?;
                self.read_table(session, visit, offset, Table::Gps)?;
            }
            Tag::IccProfile | Tag::AsShotIccProfile => {
                dir.exif.icc_profile = Some(ByteRange {
                    offset: entry.location.position(),
                    length: entry.count,
                })
            }
            Tag::ExposureTime => dir.exif.exposure_time = Some(entry.val(reader)?),
            Tag::FNumber => dir.exif.f_number = Some(entry.val(reader)?),
            Tag::FocalLength => dir.exif.focal_length = Some(entry.val(reader)?),
            Tag::ImageNumber => dir.exif.image_count = Some(entry.val(reader)? as u32),
            _ => trace!("skipping tag {:?}", entry),
        }
        Ok(())
    }

    pub(super) fn dispatch_exif(
        &mut self,
        session: &mut ParseSession,
        visit: &mut Visit,
        entry: &Entry,
    ) -> RawResult<()> {
        let reader = &mut self.reader;
        let exif = &mut visit.dir.exif;
        match ExifTag::from_u16_exhaustive(entry.tag) {
            ExifTag::ExposureTime => {
                if exif.exposure_time.is_none() {
                    exif.exposure_time = Some(entry.val(reader)?);
                }
            }
            ExifTag::FNumber => {
                if exif.f_number.is_none() {
                    exif.f_number = Some(entry.val(reader)?);
                }
            }
            ExifTag::IsoSpeedRatings => {
                if exif.iso.is_none() {
                    exif.iso = Some(entry.val(reader)? as u32);
                }
            }
            ExifTag::DateTimeOriginal | ExifTag::DateTimeDigitized => {
                if exif.date_time.is_none() {
                    self.read_timestamp(session, &mut visit.dir.exif, entry)?;
                }
            }
            ExifTag::ShutterSpeedValue => {
                let exponent = -entry.val(reader)?;
                if exponent < 128.0 && exif.exposure_time.is_none() {
                    exif.exposure_time = Some(exponent.exp2());
                }
            }
            ExifTag::ApertureValue => {
                let apex = entry.val(reader)?;
                if exif.f_number.is_none() {
                    exif.f_number = Some((apex / 2.0).exp2());
                }
            }
            ExifTag::FocalLength => exif.focal_length = Some(entry.val(reader)?),
            ExifTag::MakerNote => self.read_makernote(session, visit, entry)?,
            ExifTag::CfaPattern => {
                reader.goto_offset(entry.location.position())?;
                if entry.count >= 8 && reader.read_u32()? == CFA_REPEAT_2X2 {
                    let mut pattern = [0u8; 4];
                    reader.read_exact(&mut pattern)?;
                    visit.dir.util.cfa_pattern = Some(pattern);
                }
            }
            _ => trace!("skipping exif tag {:?}", entry),
        }
        Ok(())
    }

    pub(super) fn dispatch_gps(&mut self, visit: &mut Visit, entry: &Entry) -> RawResult<()> {
        let reader = &mut self.reader;
        let gps = &mut visit.dir.exif.gps;
        match GpsTag::from_u16_exhaustive(entry.tag) {
            GpsTag::VersionId => {
                let values = entry.vals(reader, 4)?;
                gps.version = Some([
                    values[0] as u8,
                    values[1] as u8,
                    values[2] as u8,
                    values[3] as u8,
                ]);
            }
            GpsTag::LatitudeRef => gps.latitude_ref = reference(entry.raw_bytes(reader, 1)?),
            GpsTag::LongitudeRef => gps.longitude_ref = reference(entry.raw_bytes(reader, 1)?),
            GpsTag::Latitude => gps.latitude = Some(degrees(&entry.vals(reader, 3)?)),
            GpsTag::Longitude => gps.longitude = Some(degrees(&entry.vals(reader, 3)?)),
            _ => trace!("skipping gps tag {:?}", entry),
        }
        Ok(())
    }

    /// Probes freshly captured strip data for an embedded JPEG.
    ///
    /// Only done while the bit depth is still unknown. A JPEG found there
    /// defines the directory geometry, and a second TIFF structure may follow
    /// it at a fixed distance.
    fn probe_strip(&mut self, visit: &mut Visit) -> RawResult<()> {
        let dir = &mut visit.dir;
        let offset = match dir.data_offset {
            Some(offset) if offset != 0 && dir.frame.bits_per_sample.is_none() => offset,
            _ => return Ok(()),
        };
        if offset >= self.len {
            debug!("strip offset {} lies past the end of the stream", offset);
            return Ok(());
        }

        self.reader.goto_offset(offset)?;
        match JpegInfo::parse(&mut self.reader, ParseMode::InfoOnly) {
            Ok(info) => {
                debug!(
                    "strip at {} holds a {}x{} jpeg",
                    offset,
                    info.width(),
                    info.height()
                );
                dir.frame.compression = Some(COMPRESSION_JPEG);
                dir.frame.width = Some(u32::from(info.width()));
                dir.frame.height = Some(u32::from(info.height()));
                dir.frame.bits_per_sample = Some(u16::from(info.precision()));
                dir.frame.samples_per_pixel = Some(u16::from(info.component_count()));
                visit.children.push(Task::header(
                    offset + NESTED_TIFF_SKIP,
                    self.reader.byte_order,
                    visit.depth + 1,
                ));
                Ok(())
            }
            Err(RawError::Io(err)) if err.kind() != io::ErrorKind::UnexpectedEof => {
                Err(RawError::Io(err))
            }
            Err(err) => {
                debug!("strip at {} is not a jpeg: {}", offset, err);
                Ok(())
            }
        }
    }

    fn read_timestamp(
        &mut self,
        session: &mut ParseSession,
        exif: &mut ExifData,
        entry: &Entry,
    ) -> RawResult<()> {
        let bytes = entry.raw_bytes(&mut self.reader, STAMP_LEN)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]).into_owned();
        match parse_timestamp(&text) {
            Some(seconds) => {
                exif.date_time = Some(seconds);
                exif.date_time_text = Some(text);
            }
            None => session.warn(SoftDataError::MalformedTimestamp(text)),
        }
        Ok(())
    }

    /// Hands the MakerNote to the vendor decoder claiming its magic.
    fn read_makernote(
        &mut self,
        session: &mut ParseSession,
        visit: &mut Visit,
        entry: &Entry,
    ) -> RawResult<()> {
        let mut magic = [0u8; MAGIC_LEN];
        self.reader.goto_offset(entry.location.position())?;
        self.reader.read_exact(&mut magic)?;

        let decoder = match self.makernotes.find(&magic) {
            Some(decoder) => decoder,
            None => {
                session.warn(SoftDataError::UnsupportedMakerNote(magic_text(&magic)));
                return Ok(());
            }
        };
        debug!("{} makernote at {}", decoder.vendor(), entry.location.position());

        let byte_order = self.reader.byte_order;
        let mut ctx = MakerNoteContext::new(
            &mut self.reader,
            &mut visit.dir,
            visit.depth,
            &mut visit.children,
            &mut session.warnings,
        );
        let result = decoder.decode(&mut ctx);
        self.reader.byte_order = byte_order;
        result
    }
}

fn set_text(field: &mut Option<FixedText>, bytes: Vec<u8>) {
    if let Some(text) = FixedText::from_bytes(&bytes) {
        *field = Some(text);
    }
}

fn reference(bytes: Vec<u8>) -> Option<char> {
    match bytes.first() {
        Some(&b) if b.is_ascii_alphabetic() => Some(char::from(b)),
        _ => None,
    }
}

/// Degrees, minutes and seconds folded into decimal degrees.
fn degrees(values: &[f64]) -> f64 {
    values[0] + values[1] / 60.0 + values[2] / 3600.0
}
