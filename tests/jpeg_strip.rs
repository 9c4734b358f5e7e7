mod common;

use common::{jpeg, TiffBuilder, LONG, RATIONAL};
use rawmeta::{DirectoryOrigin, FixedText};

const NEW_SUBFILE_TYPE: u16 = 254;
const IMAGE_WIDTH: u16 = 256;
const IMAGE_LENGTH: u16 = 257;
const BITS_PER_SAMPLE: u16 = 258;
const COMPRESSION: u16 = 259;
const MAKE: u16 = 271;
const MODEL: u16 = 272;
const STRIP_OFFSETS: u16 = 273;
const ORIENTATION: u16 = 274;
const SAMPLES_PER_PIXEL: u16 = 277;
const STRIP_BYTE_COUNTS: u16 = 279;
const SUB_IFD: u16 = 330;
const EXIF_IFD: u16 = 34665;

/// The TIFF structure carried in the APP1 segment of the preview.
fn exif_segment() -> Vec<u8> {
    let mut tiff = TiffBuilder::little();
    let fields = [
        tiff.ascii(MAKE, "NIKON CORPORATION"),
        tiff.ascii(MODEL, "NIKON D850"),
        tiff.short(ORIENTATION, 6),
    ];
    let ifd = tiff.ifd(&fields);
    tiff.set_first(ifd);
    tiff.bytes
}

/// IFD0 holds a preview JPEG strip and the EXIF table, its SubIFD the
/// sensor frame.
fn nef_like(preview: &[u8], raw: (u32, u32, u16)) -> TiffBuilder {
    let mut tiff = TiffBuilder::little();
    let preview_at = tiff.blob(preview);
    let raw_at = tiff.blob(&[0; 16]);

    let raw_fields = [
        tiff.long(NEW_SUBFILE_TYPE, 0),
        tiff.long(IMAGE_WIDTH, raw.0),
        tiff.long(IMAGE_LENGTH, raw.1),
        tiff.short(BITS_PER_SAMPLE, raw.2),
        tiff.short(COMPRESSION, 34713),
        tiff.long(STRIP_OFFSETS, raw_at),
        tiff.short(SAMPLES_PER_PIXEL, 1),
    ];
    let raw_ifd = tiff.ifd(&raw_fields);

    let exposure = tiff.rationals(&[(1, 250)]);
    let f_number = tiff.rationals(&[(56, 10)]);
    let exif_fields = [
        tiff.at(0x829a, RATIONAL, 1, exposure),
        tiff.at(0x829d, RATIONAL, 1, f_number),
        tiff.short(0x8827, 400),
        tiff.ascii(0x9003, "2019:11:02 08:15:00"),
    ];
    let exif = tiff.ifd(&exif_fields);

    let fields = [
        tiff.long(NEW_SUBFILE_TYPE, 1),
        tiff.long(STRIP_OFFSETS, preview_at),
        tiff.long(STRIP_BYTE_COUNTS, preview.len() as u32),
        tiff.at(SUB_IFD, LONG, 1, raw_ifd.offset),
        tiff.long(EXIF_IFD, exif.offset),
    ];
    let ifd = tiff.ifd(&fields);
    tiff.set_first(ifd);
    tiff
}

#[test]
fn jpeg_strip_defines_the_preview_geometry() {
    let preview = jpeg(160, 120, 8, Some(&exif_segment()));
    let meta = nef_like(&preview, (4000, 3000, 14))
        .into_decoder()
        .decode()
        .unwrap();

    let frame = &meta.directories[0].frame;
    assert_eq!(frame.compression, Some(6));
    assert_eq!(frame.width, Some(160));
    assert_eq!(frame.height, Some(120));
    assert_eq!(frame.bits_per_sample, Some(8));
    assert_eq!(frame.samples_per_pixel, Some(3));
}

#[test]
fn tiff_behind_the_jpeg_header_is_walked() {
    let preview = jpeg(160, 120, 8, Some(&exif_segment()));
    let meta = nef_like(&preview, (4000, 3000, 14))
        .into_decoder()
        .decode()
        .unwrap();

    let seen: Vec<_> = meta
        .directories
        .iter()
        .map(|d| (d.origin, d.depth))
        .collect();
    assert_eq!(
        seen,
        [
            (DirectoryOrigin::Chain, 0),
            (DirectoryOrigin::Chain, 1),
            (DirectoryOrigin::SubIfd, 1),
        ]
    );
    let nested = &meta.directories[1];
    assert_eq!(nested.exif.make, FixedText::from_bytes(b"NIKON CORPORATION"));
    assert_eq!(nested.frame.orientation, Some(6));
}

#[test]
fn sensor_frame_is_main_and_collects_the_rest() {
    let preview = jpeg(160, 120, 8, Some(&exif_segment()));
    let meta = nef_like(&preview, (4000, 3000, 14))
        .into_decoder()
        .decode()
        .unwrap();
    assert_eq!(meta.main_index, 2);

    let main = &meta.main;
    assert_eq!(main.frame.width, Some(4000));
    assert_eq!(main.frame.height, Some(3000));
    assert_eq!(main.frame.bits_per_sample, Some(14));
    assert_eq!(main.frame.compression, Some(34713));
    assert_eq!(main.frame.samples_per_pixel, Some(1));
    assert_eq!(main.frame.orientation, Some(6));

    let exif = &main.exif;
    assert_eq!(exif.make.map(|t| t.to_string_lossy()).as_deref(), Some("NIKON CORPORATION"));
    assert_eq!(exif.model.map(|t| t.to_string_lossy()).as_deref(), Some("NIKON D850"));
    assert_eq!(exif.exposure_time, Some(0.004));
    assert_eq!(exif.f_number, Some(5.6));
    assert_eq!(exif.iso, Some(400));
    assert_eq!(exif.date_time_text.as_deref(), Some("2019:11:02 08:15:00"));
    assert!(meta.warnings.is_empty());
}

#[test]
fn preview_shaped_strip_never_wins() {
    // Far larger than the sensor frame, but 6 bit with 3 components.
    let preview = jpeg(8000, 6000, 6, None);
    let meta = nef_like(&preview, (400, 300, 12))
        .into_decoder()
        .decode()
        .unwrap();

    assert_eq!(meta.directories.len(), 2);
    assert!(meta.directories[0].is_thumbnail_shaped());
    assert_eq!(meta.main_index, 1);
    assert_eq!(meta.main.frame.width, Some(400));
    assert_eq!(meta.main.exif.iso, Some(400));
}

#[test]
fn strips_that_are_not_jpeg_are_left_alone() {
    for strip in [vec![0x12, 0x34, 0x56, 0x78], vec![0xFF, 0xD8]] {
        let mut tiff = TiffBuilder::little();
        let fields = [
            tiff.long(IMAGE_WIDTH, 32),
            tiff.long(IMAGE_LENGTH, 16),
            tiff.long(STRIP_OFFSETS, 0),
        ];
        let ifd = tiff.ifd(&fields);
        tiff.set_first(ifd);
        let at = tiff.blob(&strip);
        tiff.patch(ifd, 2, at);

        let meta = tiff.into_decoder().decode().unwrap();
        assert_eq!(meta.directories.len(), 1);
        let dir = &meta.main;
        assert_eq!(dir.data_offset, Some(u64::from(at)));
        assert_eq!(dir.frame.width, Some(32));
        assert_eq!(dir.frame.compression, None);
        assert_eq!(dir.frame.bits_per_sample, None);
    }
}
