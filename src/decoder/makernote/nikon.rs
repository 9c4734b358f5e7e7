//! Nikon type 3 MakerNote, as found in NEF files.
//!
//! Layout after the `Nikon\0` magic: an embedded TIFF header (byte order,
//! 0x002a, offset 8) followed by a directory. Offsets inside the note are
//! relative to the start of that header.

use std::io::{Read, Seek};

use log::debug;

use super::{MakerNoteContext, MakerNoteDecoder, MAGIC_LEN};
use crate::decoder::ifd::{resolve_offset, Entry};
use crate::decoder::stream::{ByteOrder, EndianReader};
use crate::directory::{BlackLevels, LensInfo, WhiteBalance};
use crate::error::{RawResult, SoftDataError};
use crate::tags::{NikonTag, Type};

const MAGIC: &[u8; 6] = b"Nikon\0";
/// Offset of the first directory inside the embedded header.
const FIRST_IFD: u32 = 8;
const MAX_SERIAL_LEN: u32 = 16;
/// Black levels are stored for 14 bit samples.
const BLACK_LEVEL_DEPTH: u16 = 14;

pub struct NikonMakerNote;

impl<R: Read + Seek> MakerNoteDecoder<R> for NikonMakerNote {
    fn vendor(&self) -> &'static str {
        "Nikon"
    }

    fn matches(&self, magic: &[u8; MAGIC_LEN]) -> bool {
        magic[..MAGIC.len()].eq_ignore_ascii_case(MAGIC)
    }

    fn decode(&self, ctx: &mut MakerNoteContext<'_, R>) -> RawResult<()> {
        let base = ctx.reader.position()?;
        let mut signature = [0u8; 2];
        ctx.reader.read_exact(&mut signature)?;
        let byte_order = ByteOrder::from_signature(signature).unwrap_or(ctx.reader.byte_order);
        ctx.reader.byte_order = byte_order;

        let _magic = ctx.reader.read_u16()?;
        let version = ctx.reader.read_u32()?;
        if version != FIRST_IFD {
            ctx.warn(SoftDataError::MakerNoteVersion(version));
            return Ok(());
        }

        let count = ctx.reader.read_u16()?;
        debug!("nikon makernote at {} with {} entries", base, count);
        for _ in 0..count {
            let entry = Entry::read(ctx.reader, base)?;
            if let Type::Unknown(type_) = entry.type_ {
                ctx.warn(SoftDataError::UnknownFieldType(entry.tag, type_));
            }
            read_tag(ctx, &entry, base)?;
            ctx.reader.byte_order = byte_order;
            ctx.reader.goto_offset(entry.next_entry())?;
        }
        Ok(())
    }
}

fn read_tag<R: Read + Seek>(
    ctx: &mut MakerNoteContext<'_, R>,
    entry: &Entry,
    base: u64,
) -> RawResult<()> {
    let exif = &mut ctx.directory.exif;
    let util = &mut ctx.directory.util;
    match NikonTag::from_u16_exhaustive(entry.tag) {
        NikonTag::IsoSpeed => {
            if exif.iso.is_none() {
                let values = entry.vals(ctx.reader, 2)?;
                exif.iso = Some(values[1] as u32);
            }
        }
        NikonTag::WbRbLevels => {
            let n = if entry.count >= 3 { 3 } else { 2 };
            let values = entry.vals(ctx.reader, n)?;
            util.white_balance = Some(WhiteBalance {
                red: values[0],
                blue: values[1],
                green: values.get(2).copied().unwrap_or(1.0),
            });
        }
        NikonTag::Preview => {
            let value = entry.val(ctx.reader)?;
            let len = ctx.reader.stream_len()?;
            let offset = resolve_offset(value, base, len)?;
            debug!("nikon preview directory at {}", offset);
            ctx.announce_preview(offset, base);
        }
        NikonTag::SerialNumber => {
            if entry.count > MAX_SERIAL_LEN {
                ctx.warn(SoftDataError::SerialNumberTooLong(entry.count));
            } else {
                let bytes = entry.raw_bytes(ctx.reader, MAX_SERIAL_LEN as usize)?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                let serial = String::from_utf8_lossy(&bytes[..end]).trim().to_owned();
                if !serial.is_empty() {
                    exif.serial_number = Some(serial);
                }
            }
        }
        NikonTag::BlackLevel => {
            if entry.type_ == Type::SHORT && entry.count == 4 {
                let shift = match ctx.directory.frame.bits_per_sample {
                    Some(bps @ 1..=BLACK_LEVEL_DEPTH) => BLACK_LEVEL_DEPTH - bps,
                    _ => 0,
                };
                let values = entry.vals(ctx.reader, 4)?;
                let level = |v: f64| (v as u16) >> shift;
                ctx.directory.util.black_levels = Some(BlackLevels {
                    red: level(values[0]),
                    green_red: level(values[1]),
                    blue: level(values[2]),
                    green_blue: level(values[3]),
                });
            }
        }
        NikonTag::LensType => {
            let lens_type = entry.val(ctx.reader)? as u8;
            exif.lens.get_or_insert_with(LensInfo::default).lens_type = Some(lens_type);
        }
        NikonTag::Lens => {
            let values = entry.vals(ctx.reader, 4)?;
            let lens = exif.lens.get_or_insert_with(LensInfo::default);
            lens.focal_range = Some((values[0], values[1]));
            lens.f_number_range = Some((values[2], values[3]));
        }
        NikonTag::ContrastCurve | NikonTag::LinearizationTable => {
            ctx.directory.meta_offset = Some(entry.location.position());
        }
        NikonTag::ColorBalance => {
            let bytes = entry.raw_bytes(ctx.reader, 4)?;
            if let Ok(version) = <[u8; 4]>::try_from(bytes.as_slice()) {
                util.color_balance_version = Some(version);
            }
        }
        NikonTag::ImageCount => {
            if exif.image_count.is_none() {
                exif.image_count = Some(entry.val(ctx.reader)? as u32);
            }
        }
        NikonTag::ShutterCount => {
            if exif.shutter_count.is_none() {
                exif.shutter_count = Some(entry.val(ctx.reader)? as u32);
            }
        }
        _ => {}
    }
    Ok(())
}
