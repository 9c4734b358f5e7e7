use std::io::{Read, Seek};

use log::{debug, trace, warn};

use self::ifd::Entry;
use self::makernote::{MakerNoteDecoder, MakerNoteRegistry};
use self::stream::{ByteOrder, EndianReader, SmartReader};
use crate::directory::{Directory, DirectoryOrigin};
use crate::error::{CapacityError, RawError, RawFormatError, RawResult, SoftDataError};

mod dispatch;
pub mod ifd;
pub mod makernote;
pub mod reconcile;
pub mod stream;
mod timestamp;

/// TIFF version word following the byte order signature.
const TIFF_VERSION: u16 = 42;
/// Size of one directory entry.
const ENTRY_LEN: u64 = 12;

/// Decoding limits
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct Limits {
    /// The maximum number of image file directories visited in one parse.
    /// Every chained directory, sub-IFD, MakerNote preview and nested TIFF
    /// takes one slot. Exceeding it fails the parse.
    pub max_directories: usize,
    /// How deeply directories may nest below the top-level chain.
    pub max_depth: usize,
}

impl Limits {
    /// A configuration without directory or nesting ceilings.
    ///
    /// Start from here to impose only selected ceilings. The ceilings are also
    /// what stops a walk through self-referencing directories, so without
    /// them such a file is followed until memory runs out.
    pub fn unlimited() -> Limits {
        Limits {
            max_directories: usize::MAX,
            max_depth: usize::MAX,
        }
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_directories: 8,
            max_depth: 4,
        }
    }
}

/// Everything learned from one file.
#[derive(Clone, Debug)]
pub struct RawMetadata {
    /// Byte order of the outermost TIFF header.
    pub byte_order: ByteOrder,
    /// All directories in visiting order.
    pub directories: Vec<Directory>,
    /// Index of the directory chosen as the main image.
    pub main_index: usize,
    /// The main directory with unset fields back-filled from the others.
    pub main: Directory,
    pub warnings: Vec<SoftDataError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TaskKind {
    /// A TIFF header at `base`, starting a new chain.
    Header,
    Directory {
        offset: u64,
        origin: DirectoryOrigin,
    },
}

/// A directory (or header) waiting to be visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Task {
    kind: TaskKind,
    /// Indirect values are relative to this position.
    base: u64,
    byte_order: ByteOrder,
    depth: usize,
}

impl Task {
    pub(crate) fn header(base: u64, byte_order: ByteOrder, depth: usize) -> Task {
        Task {
            kind: TaskKind::Header,
            base,
            byte_order,
            depth,
        }
    }

    pub(crate) fn directory(
        offset: u64,
        base: u64,
        byte_order: ByteOrder,
        depth: usize,
        origin: DirectoryOrigin,
    ) -> Task {
        Task {
            kind: TaskKind::Directory { offset, origin },
            base,
            byte_order,
            depth,
        }
    }
}

/// State of one top-level parse.
///
/// Pending directories live on an explicit stack; children are pushed in
/// reverse after their parent is done, so directories are visited in
/// pre-order, and the "next IFD" of a chain after all children.
pub(crate) struct ParseSession {
    limits: Limits,
    pending: Vec<Task>,
    directories: Vec<Directory>,
    warnings: Vec<SoftDataError>,
    byte_order: Option<ByteOrder>,
}

impl ParseSession {
    pub(crate) fn new(limits: Limits) -> ParseSession {
        ParseSession {
            limits,
            pending: Vec::new(),
            directories: Vec::new(),
            warnings: Vec::new(),
            byte_order: None,
        }
    }

    /// Claims the next directory slot.
    fn allocate(&self, depth: usize) -> RawResult<usize> {
        if depth > self.limits.max_depth {
            return Err(CapacityError::DirectoryTooDeep(self.limits.max_depth).into());
        }
        let index = self.directories.len();
        if index >= self.limits.max_directories {
            return Err(CapacityError::TooManyDirectories(self.limits.max_directories).into());
        }
        Ok(index)
    }

    fn warn(&mut self, warning: SoftDataError) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// A directory being filled in, with the children it announces.
pub(crate) struct Visit {
    dir: Directory,
    base: u64,
    depth: usize,
    children: Vec<Task>,
}

/// The representation of a TIFF-based RAW file being decoded
pub struct Decoder<R>
where
    R: Read + Seek,
{
    reader: SmartReader<R>,
    len: u64,
    limits: Limits,
    makernotes: MakerNoteRegistry<R>,
}

impl<R: Read + Seek> Decoder<R> {
    /// Create a new decoder that decodes from the stream ```r```
    pub fn new(r: R) -> RawResult<Decoder<R>> {
        let mut reader = SmartReader::wrap(r, ByteOrder::LittleEndian);
        let len = reader.stream_len()?;
        Ok(Decoder {
            reader,
            len,
            limits: Default::default(),
            makernotes: MakerNoteRegistry::with_builtin(),
        })
    }

    pub fn with_limits(mut self, limits: Limits) -> Decoder<R> {
        self.limits = limits;
        self
    }

    /// Registers another MakerNote vendor.
    pub fn with_makernote(mut self, decoder: Box<dyn MakerNoteDecoder<R>>) -> Decoder<R> {
        self.makernotes.register(decoder);
        self
    }

    /// Replaces the MakerNote vendors, e.g. with [`MakerNoteRegistry::empty`].
    pub fn with_makernotes(mut self, registry: MakerNoteRegistry<R>) -> Decoder<R> {
        self.makernotes = registry;
        self
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Walks every directory of the file and reconciles them into one main
    /// image description.
    pub fn decode(&mut self) -> RawResult<RawMetadata> {
        let mut session = ParseSession::new(self.limits);
        session
            .pending
            .push(Task::header(0, ByteOrder::LittleEndian, 0));
        self.walk(&mut session)?;

        let ParseSession {
            directories,
            warnings,
            byte_order,
            ..
        } = session;
        let byte_order = byte_order.ok_or(RawFormatError::NoDirectories)?;
        let main_index =
            reconcile::select_main(&directories).ok_or(RawFormatError::NoDirectories)?;
        let main = reconcile::merge(&directories, main_index);
        debug!(
            "{} directories, main image is directory {}",
            directories.len(),
            main_index
        );

        Ok(RawMetadata {
            byte_order,
            directories,
            main_index,
            main,
            warnings,
        })
    }

    fn walk(&mut self, session: &mut ParseSession) -> RawResult<()> {
        while let Some(task) = session.pending.pop() {
            match task.kind {
                TaskKind::Header => self.read_header(session, task)?,
                TaskKind::Directory { offset, origin } => {
                    self.read_directory(session, task, offset, origin)?
                }
            }
        }
        Ok(())
    }

    /// Reads a TIFF header and queues the first directory of its chain.
    ///
    /// A missing signature fails the parse at the top level. For a TIFF
    /// nested in strip data it only means there is no second structure.
    fn read_header(&mut self, session: &mut ParseSession, task: Task) -> RawResult<()> {
        let nested = task.depth > 0;
        if nested && task.base.saturating_add(8) > self.len {
            debug!("no room for a nested tiff header at {}", task.base);
            return Ok(());
        }

        self.reader.goto_offset(task.base)?;
        let mut signature = [0u8; 2];
        self.reader.read_exact(&mut signature)?;
        let byte_order = match ByteOrder::from_signature(signature) {
            Some(byte_order) => byte_order,
            None if nested => {
                debug!("no nested tiff header at {}", task.base);
                return Ok(());
            }
            None => {
                return Err(
                    RawFormatError::SignatureNotFound(u16::from_be_bytes(signature)).into(),
                )
            }
        };
        self.reader.byte_order = byte_order;
        session.byte_order.get_or_insert(byte_order);

        let version = self.reader.read_u16()?;
        if version != TIFF_VERSION {
            debug!("tiff header at {} has version {}", task.base, version);
        }
        match self.reader.read_u32()? {
            0 => trace!("tiff header at {} has no directories", task.base),
            first => session.pending.push(Task::directory(
                u64::from(first) + task.base,
                task.base,
                byte_order,
                task.depth,
                DirectoryOrigin::Chain,
            )),
        }
        Ok(())
    }

    fn read_directory(
        &mut self,
        session: &mut ParseSession,
        task: Task,
        offset: u64,
        origin: DirectoryOrigin,
    ) -> RawResult<()> {
        let index = session.allocate(task.depth)?;
        self.check_offset(offset)?;
        self.reader.byte_order = task.byte_order;
        self.reader.goto_offset(offset)?;
        let entry_count = self.reader.read_u16()?;
        trace!(
            "directory {} at {} ({:?}, depth {}) with {} entries",
            index,
            offset,
            origin,
            task.depth,
            entry_count
        );

        let mut dir = Directory::new(index, offset, task.depth, origin, task.byte_order);
        dir.entry_count = entry_count;
        let mut visit = Visit {
            dir,
            base: task.base,
            depth: task.depth,
            children: Vec::new(),
        };

        for _ in 0..entry_count {
            let entry = Entry::read(&mut self.reader, task.base)?;
            self.note_unknown_type(session, &entry);
            self.dispatch_main(session, &mut visit, &entry)?;
            self.reader.byte_order = task.byte_order;
            self.reader.goto_offset(entry.next_entry())?;
        }

        if origin == DirectoryOrigin::Chain {
            self.reader
                .goto_offset(offset + 2 + u64::from(entry_count) * ENTRY_LEN)?;
            match self.reader.read_u32()? {
                0 => {}
                next => session.pending.push(Task::directory(
                    u64::from(next) + task.base,
                    task.base,
                    task.byte_order,
                    task.depth,
                    DirectoryOrigin::Chain,
                )),
            }
        }
        session.pending.extend(visit.children.drain(..).rev());
        session.directories.push(visit.dir);
        Ok(())
    }

    /// Reads an EXIF or GPS table into the directory being visited.
    fn read_table(
        &mut self,
        session: &mut ParseSession,
        visit: &mut Visit,
        offset: u64,
        table: Table,
    ) -> RawResult<()> {
        self.check_offset(offset)?;
        let byte_order = self.reader.byte_order;
        self.reader.goto_offset(offset)?;
        let entry_count = self.reader.read_u16()?;
        trace!("{:?} table at {} with {} entries", table, offset, entry_count);

        for _ in 0..entry_count {
            let entry = Entry::read(&mut self.reader, visit.base)?;
            self.note_unknown_type(session, &entry);
            match table {
                Table::Exif => self.dispatch_exif(session, visit, &entry)?,
                Table::Gps => self.dispatch_gps(visit, &entry)?,
            }
            self.reader.byte_order = byte_order;
            self.reader.goto_offset(entry.next_entry())?;
        }
        Ok(())
    }

    fn note_unknown_type(&self, session: &mut ParseSession, entry: &Entry) {
        if let crate::tags::Type::Unknown(type_) = entry.type_ {
            session.warn(SoftDataError::UnknownFieldType(entry.tag, type_));
        }
    }

    fn check_offset(&self, offset: u64) -> RawResult<()> {
        if offset.saturating_add(2) > self.len {
            return Err(RawError::Format(RawFormatError::OffsetOutOfBounds(
                offset, self.len,
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum Table {
    Exif,
    Gps,
}
