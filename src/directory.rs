use core::fmt;

use crate::decoder::stream::ByteOrder;

/// How the walker reached a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectoryOrigin {
    /// First directory after a TIFF header, or linked from one through "next IFD".
    Chain,
    /// Listed by the `SubIFDs` tag of its parent.
    SubIfd,
    /// Preview directory announced inside a vendor MakerNote.
    MakerNotePreview,
}

/// A text field of at most 64 bytes, kept as the raw bytes found in the file.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedText([u8; FixedText::LEN]);

impl FixedText {
    pub const LEN: usize = 64;

    /// Copies up to 64 bytes. A field whose first byte is zero counts as unset.
    pub fn from_bytes(bytes: &[u8]) -> Option<FixedText> {
        let len = bytes.len().min(Self::LEN);
        if len == 0 || bytes[0] == 0 {
            return None;
        }
        let mut text = [0; Self::LEN];
        text[..len].copy_from_slice(&bytes[..len]);
        Some(FixedText(text))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// The bytes up to the first NUL, with invalid UTF-8 replaced.
    pub fn to_string_lossy(&self) -> String {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(Self::LEN);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Debug for FixedText {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), fmt)
    }
}

/// Geometry and sample layout of one image plane.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageFrame {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bits_per_sample: Option<u16>,
    pub compression: Option<u16>,
    pub samples_per_pixel: Option<u16>,
    pub photometric_interpretation: Option<u16>,
    pub planar_configuration: Option<u16>,
    pub x_resolution: Option<f64>,
    pub y_resolution: Option<f64>,
    pub tile_width: Option<u32>,
    pub tile_length: Option<u32>,
    pub orientation: Option<u16>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LensInfo {
    pub lens_type: Option<u8>,
    /// Shortest and longest focal length in millimetres.
    pub focal_range: Option<(f64, f64)>,
    /// F-number at the shortest and at the longest focal length.
    pub f_number_range: Option<(f64, f64)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpsInfo {
    pub version: Option<[u8; 4]>,
    pub latitude_ref: Option<char>,
    /// Decimal degrees, unsigned; see `latitude_ref`.
    pub latitude: Option<f64>,
    pub longitude_ref: Option<char>,
    pub longitude: Option<f64>,
}

/// Position and length of an embedded ICC profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u32,
}

/// Camera and capture description.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExifData {
    pub make: Option<FixedText>,
    pub model: Option<FixedText>,
    pub software: Option<FixedText>,
    pub artist: Option<FixedText>,
    pub copyright: Option<FixedText>,
    pub focal_length: Option<f64>,
    /// Seconds.
    pub exposure_time: Option<f64>,
    pub f_number: Option<f64>,
    pub iso: Option<u32>,
    pub image_count: Option<u32>,
    pub shutter_count: Option<u32>,
    pub serial_number: Option<String>,
    pub lens: Option<LensInfo>,
    pub gps: GpsInfo,
    pub icc_profile: Option<ByteRange>,
    /// Seconds since the Unix epoch, the stamp read as UTC.
    pub date_time: Option<i64>,
    /// The stamp as written, `YYYY:MM:DD HH:MM:SS`.
    pub date_time_text: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WhiteBalance {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Per-channel black levels, already scaled to the sample depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlackLevels {
    pub red: u16,
    pub green_red: u16,
    pub blue: u16,
    pub green_blue: u16,
}

/// Sensor data needed by a raw developer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawUtil {
    /// 2x2 colour filter array, row major.
    pub cfa_pattern: Option<[u8; 4]>,
    pub white_balance: Option<WhiteBalance>,
    pub black_levels: Option<BlackLevels>,
    pub color_balance_version: Option<[u8; 4]>,
}

/// An Image File Directory (IFD) after tag dispatch.
///
/// Fields are `None` until a tag sets them, so a legitimate zero is never
/// mistaken for an absent value.
#[doc(alias = "IFD")]
#[derive(Clone, Debug, PartialEq)]
pub struct Directory {
    /// Slot in visiting order.
    pub index: usize,
    /// Absolute position of the entry count.
    pub offset: u64,
    pub depth: usize,
    pub origin: DirectoryOrigin,
    pub byte_order: ByteOrder,
    pub entry_count: u16,
    pub frame: ImageFrame,
    pub exif: ExifData,
    pub util: RawUtil,
    /// Strip or JPEG thumbnail data.
    pub data_offset: Option<u64>,
    pub strip_byte_counts: Option<u32>,
    pub rows_per_strip: Option<u32>,
    pub jpeg_length: Option<u32>,
    pub tile_offset: Option<u64>,
    /// Vendor data such as a linearization table.
    pub meta_offset: Option<u64>,
}

impl Directory {
    pub fn new(
        index: usize,
        offset: u64,
        depth: usize,
        origin: DirectoryOrigin,
        byte_order: ByteOrder,
    ) -> Directory {
        Directory {
            index,
            offset,
            depth,
            origin,
            byte_order,
            entry_count: 0,
            frame: ImageFrame::default(),
            exif: ExifData::default(),
            util: RawUtil::default(),
            data_offset: None,
            strip_byte_counts: None,
            rows_per_strip: None,
            jpeg_length: None,
            tile_offset: None,
            meta_offset: None,
        }
    }

    /// `width * height * bits_per_sample`, zero when any of them is unset.
    pub fn pixel_volume(&self) -> u64 {
        let frame = &self.frame;
        match (frame.width, frame.height, frame.bits_per_sample) {
            (Some(w), Some(h), Some(bps)) => u64::from(w) * u64::from(h) * u64::from(bps),
            _ => 0,
        }
    }

    /// A 3-sample, 6-bit frame is how embedded preview JPEGs show up.
    pub fn is_thumbnail_shaped(&self) -> bool {
        self.frame.bits_per_sample == Some(6) && self.frame.samples_per_pixel == Some(3)
    }
}
