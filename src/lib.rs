//! Metadata of TIFF-based camera RAW files
//!
//! RAW formats such as Nikon's NEF are TIFF containers: a chain of image file
//! directories (IFDs) with sub-IFDs for the sensor frame and previews, EXIF
//! and GPS tables, and a vendor MakerNote holding yet another directory.
//! Previews are frequently stored as baseline JPEG strips.
//!
//! [`decoder::Decoder`] walks all of these, probes JPEG strips with
//! [`jpeg::JpegInfo`], and reconciles the directories into one description
//! of the main image. No pixel data is decoded.
//!
//! # Related Links
//! * <https://web.archive.org/web/20210108073850/https://www.adobe.io/open/standards/TIFF.html> - The TIFF specification
//! * <https://www.w3.org/Graphics/JPEG/itu-t81.pdf> - ITU T.81, the JPEG specification

pub mod decoder;
mod directory;
mod error;
pub mod jpeg;
pub mod tags;

pub use self::directory::{
    BlackLevels, ByteRange, Directory, DirectoryOrigin, ExifData, FixedText, GpsInfo,
    ImageFrame, LensInfo, RawUtil, WhiteBalance,
};
pub use self::error::{
    CapacityError, JpegFormatError, RawError, RawFormatError, RawResult, SoftDataError,
};
