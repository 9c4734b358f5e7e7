//! Vendor MakerNote decoders.
//!
//! The EXIF MakerNote tag points at a proprietary block that starts with a
//! short vendor magic. A [`MakerNoteDecoder`] claims blocks by that magic and
//! reads the vendor tags into the owning directory. Supporting a new vendor
//! means implementing the trait and registering it on the decoder.

use std::io::{Read, Seek};

use log::warn;

use super::stream::SmartReader;
use super::Task;
use crate::directory::{Directory, DirectoryOrigin};
use crate::error::{RawResult, SoftDataError};

mod nikon;

pub use self::nikon::NikonMakerNote;

/// Length of the vendor magic at the start of every MakerNote.
pub const MAGIC_LEN: usize = 10;

/// Decoder for one vendor's MakerNote dialect.
pub trait MakerNoteDecoder<R> {
    /// Vendor name, used in log messages.
    fn vendor(&self) -> &'static str;

    /// Whether this decoder understands a note starting with `magic`.
    fn matches(&self, magic: &[u8; MAGIC_LEN]) -> bool;

    /// Reads the note. The reader is positioned right after the magic, with
    /// the byte order of the enclosing directory. Problems that only affect
    /// single fields are reported through [`MakerNoteContext::warn`].
    fn decode(&self, ctx: &mut MakerNoteContext<'_, R>) -> RawResult<()>;
}

/// What a MakerNote decoder may touch while it runs.
pub struct MakerNoteContext<'a, R> {
    pub reader: &'a mut SmartReader<R>,
    /// The directory whose EXIF table holds the MakerNote tag.
    pub directory: &'a mut Directory,
    depth: usize,
    children: &'a mut Vec<Task>,
    warnings: &'a mut Vec<SoftDataError>,
}

impl<'a, R: Read + Seek> MakerNoteContext<'a, R> {
    pub(crate) fn new(
        reader: &'a mut SmartReader<R>,
        directory: &'a mut Directory,
        depth: usize,
        children: &'a mut Vec<Task>,
        warnings: &'a mut Vec<SoftDataError>,
    ) -> Self {
        MakerNoteContext {
            reader,
            directory,
            depth,
            children,
            warnings,
        }
    }

    /// Queues a preview directory at the absolute `offset`, read with the
    /// current byte order and `base` for its own indirect values.
    pub fn announce_preview(&mut self, offset: u64, base: u64) {
        self.children.push(Task::directory(
            offset,
            base,
            self.reader.byte_order,
            self.depth + 1,
            DirectoryOrigin::MakerNotePreview,
        ));
    }

    pub fn warn(&mut self, warning: SoftDataError) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// The set of vendor decoders a [`Decoder`](super::Decoder) consults.
pub struct MakerNoteRegistry<R> {
    decoders: Vec<Box<dyn MakerNoteDecoder<R>>>,
}

impl<R: Read + Seek> MakerNoteRegistry<R> {
    pub fn empty() -> Self {
        MakerNoteRegistry {
            decoders: Vec::new(),
        }
    }

    /// A registry with every built-in vendor.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(NikonMakerNote));
        registry
    }

    /// Adds a decoder. Earlier registrations win when magics overlap.
    pub fn register(&mut self, decoder: Box<dyn MakerNoteDecoder<R>>) {
        self.decoders.push(decoder);
    }

    pub fn find(&self, magic: &[u8; MAGIC_LEN]) -> Option<&dyn MakerNoteDecoder<R>> {
        self.decoders
            .iter()
            .find(|decoder| decoder.matches(magic))
            .map(|decoder| &**decoder)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// Printable form of a magic for diagnostics.
pub(crate) fn magic_text(magic: &[u8; MAGIC_LEN]) -> String {
    let end = magic.iter().position(|&b| b == 0).unwrap_or(MAGIC_LEN);
    String::from_utf8_lossy(&magic[..end]).into_owned()
}
