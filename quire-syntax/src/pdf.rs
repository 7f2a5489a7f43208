//! The starting point for reading PDF files.

use crate::error::{Error, Feature, OptionParse, Result};
use crate::object::dict::keys::{ENCRYPT, ROOT, SIZE};
use crate::object::{Dict, ObjRef, Object};
use crate::reader::Reader;
use crate::table::IndirectObjectTable;
use crate::xref::{SectionKind, XRefChain, find_last_xref_pos, read_chain};
use log::{debug, warn};
use memchr::memmem;

/// The window at the start of a file in which the header has to appear.
const HEADER_WINDOW: usize = 1024;

/// The version of a PDF file, as given in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    /// The major version.
    pub major: u8,
    /// The minor version.
    pub minor: u8,
}

impl Version {
    pub(crate) fn read(data: &[u8]) -> Option<Self> {
        let window = &data[..data.len().min(HEADER_WINDOW)];
        let pos = memmem::find(window, b"%PDF-")?;

        let mut r = Reader::new_with(data, pos + 5);
        let major = r.read_byte().filter(u8::is_ascii_digit)? - b'0';
        r.forward_tag(b".")?;
        let minor = r.read_byte().filter(u8::is_ascii_digit)? - b'0';

        Some(Self { major, minor })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A PDF file.
///
/// Objects are read lazily through the [`IndirectObjectTable`] the file owns.
#[derive(Debug)]
pub struct Pdf {
    version: Version,
    trailer: Dict,
    startxref: usize,
    xref_kind: SectionKind,
    table: IndirectObjectTable,
}

impl Pdf {
    /// Read a PDF file from its bytes.
    ///
    /// Fails if the header, the cross-reference chain or the trailer can't be read,
    /// and for encrypted files.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let version = Version::read(&data).or_parse_error(0, "%PDF- header")?;
        let startxref = find_last_xref_pos(&data).or_parse_error(data.len(), "startxref")?;
        let XRefChain {
            entries,
            trailer,
            kind,
            sections,
        } = read_chain(&data, startxref)?;

        if trailer.contains_key(ENCRYPT) {
            return Err(Error::Unsupported(Feature::Encryption));
        }

        if trailer.get_ref(ROOT).is_none() {
            return Err(Error::parse(startxref, "/Root in trailer"));
        }

        debug!(
            "read {} cross-reference entries from {} sections",
            entries.len(),
            sections.len()
        );

        // Each object takes up at least one byte of the file, so the table never needs more
        // slots than that.
        let limit = u32::try_from(data.len().saturating_add(entries.len())).unwrap_or(u32::MAX);

        if let Some((num, _)) = entries.last_key_value()
            && *num >= limit
        {
            return Err(Error::parse(startxref, "object number in range"));
        }

        let size = match trailer.get_i64(SIZE).and_then(|s| u32::try_from(s).ok()) {
            Some(size) if size > limit => {
                warn!("ignoring trailer /Size {size}, the file is too small for it");

                0
            }
            size => size.unwrap_or(0),
        };
        let table = IndirectObjectTable::new(data, &entries, size);

        Ok(Self {
            version,
            trailer,
            startxref,
            xref_kind: kind,
            table,
        })
    }

    /// The version from the file header.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The trailer dictionary of the newest cross-reference section.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Mutable access to the trailer, for example to change `/Info`.
    pub fn trailer_mut(&mut self) -> &mut Dict {
        &mut self.trailer
    }

    /// The reference to the document catalog.
    pub fn root(&self) -> ObjRef {
        // Checked when the file was read, and the trailer can only lose it by mutation.
        self.trailer.get_ref(ROOT).unwrap_or(ObjRef::new(0, 0))
    }

    /// The resolved document catalog.
    pub fn catalog(&self) -> &Object {
        self.table.resolve_ref(self.root())
    }

    /// The byte offset of the newest cross-reference section.
    pub fn startxref(&self) -> usize {
        self.startxref
    }

    /// Whether the newest cross-reference section is a stream.
    pub fn xref_kind(&self) -> SectionKind {
        self.xref_kind
    }

    /// The object numbers of all objects that are not free, in ascending order.
    pub fn objects(&self) -> impl Iterator<Item = u32> + '_ {
        self.table.live_objects()
    }

    /// Resolve an object.
    pub fn resolve(&self, obj_ref: ObjRef) -> &Object {
        self.table.resolve_ref(obj_ref)
    }

    /// The indirect object table of the file.
    pub fn table(&self) -> &IndirectObjectTable {
        &self.table
    }

    /// Mutable access to the indirect object table.
    pub fn table_mut(&mut self) -> &mut IndirectObjectTable {
        &mut self.table
    }

    /// The raw bytes of the file.
    pub fn data(&self) -> &[u8] {
        self.table.data()
    }
}
