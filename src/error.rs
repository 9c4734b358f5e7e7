use std::io;

use quick_error::quick_error;

quick_error! {
    /// Raw metadata error kinds.
    #[derive(Debug)]
    pub enum RawError {
        /// The TIFF container is not formatted properly
        Format(err: RawFormatError) {
            from()
            display("format error: {}", err)
            source(err)
        }
        /// An embedded or standalone JPEG header is not formatted properly
        Jpeg(err: JpegFormatError) {
            from()
            display("jpeg error: {}", err)
            source(err)
        }
        /// A configured ceiling was exceeded
        Capacity(err: CapacityError) {
            from()
            display("capacity exceeded: {}", err)
            source(err)
        }
        /// An I/O Error occurred while decoding the file
        Io(err: io::Error) {
            from()
            display("{}", err)
            source(err)
        }
    }
}

quick_error! {
    /// Structural errors in the TIFF container.
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum RawFormatError {
        SignatureNotFound(found: u16) {
            display("byte order signature not found, got 0x{:04x}", found)
        }
        OffsetOutOfBounds(offset: u64, len: u64) {
            display("offset {} lies outside the {} byte stream", offset, len)
        }
        NoDirectories {
            display("no image file directory found")
        }
    }
}

quick_error! {
    /// Structural errors in a JPEG marker stream.
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum JpegFormatError {
        SoiNotFound(found: u16) {
            display("start of image marker not found, got 0x{:04x}", found)
        }
        InvalidSegmentLength(marker: u8, length: u16) {
            display("segment 0xff{:02x} declares invalid length {}", marker, length)
        }
        TruncatedSegment(marker: u8) {
            display("segment 0xff{:02x} ends before its contents", marker)
        }
        DuplicateFrame {
            display("more than one start of frame segment")
        }
        InvalidPrecision(precision: u8) {
            display("sample precision {} is outside 1..=16", precision)
        }
        InvalidComponentCount(count: u8) {
            display("component count {} is outside 1..=6", count)
        }
        ZeroDimension(width: u16, height: u16) {
            display("frame dimensions {}x{} must be nonzero", width, height)
        }
        ComponentIdOutOfRange(id: u8) {
            display("component id {} is outside 1..=6", id)
        }
        DuplicateComponent(id: u8) {
            display("component id {} appears twice", id)
        }
        QuantTableIdOutOfRange(id: u8) {
            display("quantization table id {} is greater than 3", id)
        }
        HuffmanTableIdOutOfRange(id: u8) {
            display("huffman table id {} is greater than 3", id)
        }
        InvalidHuffmanClass(class: u8) {
            display("huffman table class {} is neither DC nor AC", class)
        }
        ScanBeforeFrame {
            display("start of scan precedes start of frame")
        }
        UnsupportedSpectralSelection(start: u8, end: u8) {
            display("spectral selection {}..={} is not baseline", start, end)
        }
        UnsupportedApproximation(high: u8, low: u8) {
            display("successive approximation {}/{} is not baseline", high, low)
        }
        ScanLengthMismatch(declared: usize, consumed: usize) {
            display("scan header declares {} bytes but {} were consumed", declared, consumed)
        }
        MissingFrame {
            display("no start of frame segment")
        }
        MissingSegment(name: &'static str) {
            display("required {} segment is missing", name)
        }
    }
}

quick_error! {
    /// Ceilings bounding the walk and the table sizes.
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum CapacityError {
        TooManyDirectories(limit: usize) {
            display("more than {} image file directories", limit)
        }
        DirectoryTooDeep(limit: usize) {
            display("directory nesting deeper than {}", limit)
        }
        TooManyHuffmanSymbols(count: usize) {
            display("huffman table holds {} symbols, at most 162 allowed", count)
        }
    }
}

quick_error! {
    /// Problems that leave a field unset without stopping the walk.
    ///
    /// These are collected on [`RawMetadata::warnings`](crate::decoder::RawMetadata).
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum SoftDataError {
        MalformedTimestamp(text: String) {
            display("malformed timestamp {:?}", text)
        }
        UnknownFieldType(tag: u16, type_: u16) {
            display("tag {:#06x} has unknown field type {}", tag, type_)
        }
        UnsupportedMakerNote(magic: String) {
            display("no MakerNote decoder for vendor magic {:?}", magic)
        }
        MakerNoteVersion(found: u32) {
            display("MakerNote version sentinel is {}, expected 8", found)
        }
        SerialNumberTooLong(count: u32) {
            display("serial number of {} bytes exceeds 16", count)
        }
    }
}

/// Result of a metadata decoding process
pub type RawResult<T> = Result<T, RawError>;
