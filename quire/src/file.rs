use log::debug;
use quire_syntax::object::{ObjRef, Object};
use quire_syntax::{Error, IndirectObjectTable, Pdf, Result};
use quire_write::SaveOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// An open PDF file.
///
/// The whole file is read into memory when it is opened, so the file on disk is not kept
/// open. Saving writes to a temporary file next to the target first, which then replaces the
/// target. If anything fails on the way, the target stays untouched.
#[derive(Debug)]
pub struct File {
    path: Option<PathBuf>,
    pdf: Pdf,
    save_on_close: Option<SaveOptions>,
}

impl File {
    /// Open the file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            pdf: Pdf::new(data)?,
            save_on_close: None,
        })
    }

    /// Read a file from memory. Such a file has no path, so it can only be saved with
    /// [`File::save_as`] or [`File::to_bytes`].
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            path: None,
            pdf: Pdf::new(data)?,
            save_on_close: None,
        })
    }

    /// The path the file was opened from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying PDF.
    pub fn pdf(&self) -> &Pdf {
        &self.pdf
    }

    /// Mutable access to the underlying PDF.
    pub fn pdf_mut(&mut self) -> &mut Pdf {
        &mut self.pdf
    }

    /// The indirect object table.
    pub fn table(&self) -> &IndirectObjectTable {
        self.pdf.table()
    }

    /// Mutable access to the indirect object table.
    pub fn table_mut(&mut self) -> &mut IndirectObjectTable {
        self.pdf.table_mut()
    }

    /// Resolve an object.
    pub fn resolve(&self, obj_ref: ObjRef) -> &Object {
        self.pdf.resolve(obj_ref)
    }

    /// The document catalog.
    pub fn catalog(&self) -> &Object {
        self.pdf.catalog()
    }

    /// Serialize the file with the given options, without touching the disk.
    pub fn to_bytes(&self, options: &SaveOptions) -> Result<Vec<u8>> {
        quire_write::write(&self.pdf, options)
    }

    /// Save the file to the path it was opened from.
    ///
    /// Afterwards, the file reflects the saved state: all objects are unmodified, and
    /// another incremental save appends to what was just written.
    pub fn save(&mut self, options: &SaveOptions) -> Result<()> {
        let path = self.path.clone().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "the file has no path to save to",
            ))
        })?;

        self.save_as(path, options)
    }

    /// Save the file to the given path, which becomes the path of the file.
    pub fn save_as(&mut self, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_bytes(options)?;

        write_staged(path, &data)?;
        debug!("saved {} bytes to {}", data.len(), path.display());

        self.pdf = Pdf::new(data)?;
        self.path = Some(path.to_path_buf());

        Ok(())
    }

    /// Save the file with the given options when it is closed.
    pub fn save_on_close(&mut self, options: SaveOptions) {
        self.save_on_close = Some(options);
    }

    /// Close the file, saving it if a save was requested with [`File::save_on_close`].
    pub fn close(mut self) -> Result<()> {
        match self.save_on_close.take() {
            Some(options) => self.save(&options),
            None => Ok(()),
        }
    }
}

/// Write data to a temporary file in the directory of `path` and move it over `path`.
fn write_staged(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    // The temporary file is deleted when it is dropped before being persisted.
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(())
}
