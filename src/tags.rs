macro_rules! tags {
    {
        // Permit arbitrary meta items, which include documentation.
        $( #[$enum_attr:meta] )*
        $vis:vis enum $name:ident($ty:tt) $(unknown(#[$unknown_meta:meta] $unknown_doc:ident))* {
            // Each of the `Name = Val,` permitting documentation.
            $($(#[$ident_attr:meta])* $tag:ident = $val:expr,)*
        }
    } => {
        $( #[$enum_attr] )*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        #[non_exhaustive]
        pub enum $name {
            $($(#[$ident_attr])* $tag,)*
            $(
                #[$unknown_meta]
                Unknown($ty),
            )*
        }

        impl $name {
            #[inline(always)]
            const fn __from_inner_type(n: $ty) -> Result<Self, $ty> {
                match n {
                    $( $val => Ok($name::$tag), )*
                    n => Err(n),
                }
            }

            #[inline(always)]
            const fn __to_inner_type(&self) -> $ty {
                match *self {
                    $( $name::$tag => $val, )*
                    $( $name::Unknown($unknown_doc) => { $unknown_doc }, )*
                }
            }
        }

        tags!($name, $ty, $($unknown_doc)*);
    };
    // For u16 tags, provide direct inherent primitive conversion methods.
    ($name:tt, u16, $($unknown_doc:ident)*) => {
        impl $name {
            #[inline(always)]
            pub const fn from_u16(val: u16) -> Option<Self> {
                match Self::__from_inner_type(val) {
                    Ok(v) => Some(v),
                    Err(_) => None,
                }
            }

            $(
            #[inline(always)]
            pub const fn from_u16_exhaustive($unknown_doc: u16) -> Self {
                match Self::__from_inner_type($unknown_doc) {
                    Ok(v) => v,
                    Err(_) => $name::Unknown($unknown_doc),
                }
            }
            )*

            #[inline(always)]
            pub const fn to_u16(&self) -> u16 {
                Self::__to_inner_type(self)
            }
        }
    };
}

tags! {
/// Tags of the main (image) directory table.
pub enum Tag(u16) unknown(
    /// A private or extension tag
    unknown
) {
    NewSubfileType = 254,
    SubfileType = 255,
    ImageWidth = 256,
    ImageLength = 257,
    BitsPerSample = 258,
    Compression = 259,
    PhotometricInterpretation = 262,
    Make = 271,
    Model = 272,
    StripOffsets = 273,
    Orientation = 274,
    SamplesPerPixel = 277,
    RowsPerStrip = 278,
    StripByteCounts = 279,
    XResolution = 282,
    YResolution = 283,
    PlanarConfiguration = 284,
    Software = 305,
    DateTime = 306,
    Artist = 315,
    TileWidth = 322,
    TileLength = 323,
    TileOffsets = 324,
    SubIfd = 330,
    // Thumbnail stream of a JPEG-compressed directory
    JpegInterchangeFormat = 513,
    JpegInterchangeFormatLength = 514,
    Copyright = 33432,
    ExposureTime = 33434,
    FNumber = 33437,
    ExifIfd = 34665,
    IccProfile = 34675,
    GpsIfd = 34853,
    FocalLength = 37386,
    ImageNumber = 37393,
    AsShotIccProfile = 50831,
}
}

tags! {
/// Tags of the EXIF sub-directory table.
pub enum ExifTag(u16) unknown(
    /// A tag this decoder does not interpret
    unknown
) {
    ExposureTime = 0x829a,
    FNumber = 0x829d,
    IsoSpeedRatings = 0x8827,
    DateTimeOriginal = 0x9003,
    DateTimeDigitized = 0x9004,
    /// APEX shutter speed, `-log2(exposure)`
    ShutterSpeedValue = 0x9201,
    /// APEX aperture, `2 * log2(f_number)`
    ApertureValue = 0x9202,
    FocalLength = 0x920a,
    MakerNote = 0x927c,
    CfaPattern = 0xa302,
}
}

tags! {
/// Tags of the GPS sub-directory table.
pub enum GpsTag(u16) unknown(
    /// A tag this decoder does not interpret
    unknown
) {
    VersionId = 0,
    LatitudeRef = 1,
    Latitude = 2,
    LongitudeRef = 3,
    Longitude = 4,
}
}

tags! {
/// Tags of the Nikon (type 3) MakerNote table.
///
/// See <https://exiv2.org/tags-nikon.html>.
pub enum NikonTag(u16) unknown(
    /// A tag this decoder does not interpret
    unknown
) {
    /// First value is unused, the second is the ISO speed
    IsoSpeed = 0x0002,
    Quality = 0x0004,
    /// R, B then G multipliers
    WbRbLevels = 0x000c,
    ProgramShift = 0x000d,
    /// Offset of a nested preview directory, relative to the MakerNote base
    Preview = 0x0011,
    SerialNumber = 0x001d,
    BlackLevel = 0x003d,
    LensType = 0x0083,
    Lens = 0x0084,
    ContrastCurve = 0x008c,
    LinearizationTable = 0x0096,
    ColorBalance = 0x0097,
    ImageCount = 0x00a5,
    ShutterCount = 0x00a7,
}
}

tags! {
/// The type of an IFD entry (a 2 byte field).
pub enum Type(u16) unknown(
    /// A field type outside the TIFF 6.0 / BigTIFF vocabulary
    unknown
) {
    /// 8-bit unsigned integer
    BYTE = 1,
    /// 8-bit byte that contains a 7-bit ASCII code; the last byte must be zero
    ASCII = 2,
    /// 16-bit unsigned integer
    SHORT = 3,
    /// 32-bit unsigned integer
    LONG = 4,
    /// Fraction stored as two 32-bit unsigned integers
    RATIONAL = 5,
    /// 8-bit signed integer
    SBYTE = 6,
    /// 8-bit byte that may contain anything, depending on the field
    UNDEFINED = 7,
    /// 16-bit signed integer
    SSHORT = 8,
    /// 32-bit signed integer
    SLONG = 9,
    /// Fraction stored as two 32-bit signed integers
    SRATIONAL = 10,
    /// 32-bit IEEE floating point
    FLOAT = 11,
    /// 64-bit IEEE floating point
    DOUBLE = 12,
    /// 32-bit unsigned integer (offset)
    IFD = 13,
    /// BigTIFF 64-bit unsigned integer
    LONG8 = 16,
}
}

impl Type {
    /// All field types with a defined element width.
    pub const KNOWN: [Type; 14] = [
        Type::BYTE,
        Type::ASCII,
        Type::SHORT,
        Type::LONG,
        Type::RATIONAL,
        Type::SBYTE,
        Type::UNDEFINED,
        Type::SSHORT,
        Type::SLONG,
        Type::SRATIONAL,
        Type::FLOAT,
        Type::DOUBLE,
        Type::IFD,
        Type::LONG8,
    ];

    /// Width of one element in bytes. Unknown types are treated as one byte wide.
    pub fn byte_len(&self) -> u8 {
        match *self {
            Type::BYTE | Type::SBYTE | Type::ASCII | Type::UNDEFINED => 1,
            Type::SHORT | Type::SSHORT => 2,
            Type::LONG | Type::SLONG | Type::FLOAT | Type::IFD => 4,
            Type::LONG8 | Type::DOUBLE | Type::RATIONAL | Type::SRATIONAL => 8,
            Type::Unknown(_) => 1,
        }
    }

    /// Total size of `count` elements.
    pub fn value_bytes(&self, count: u32) -> u64 {
        u64::from(self.byte_len()) * u64::from(count)
    }
}
