//! Project container writer.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::NamedTempFile;

use crate::core::MovieFormat;
use crate::module::{ModuleSelection, ModuleSet};
use crate::movie::Movie;
use crate::util::{Error, Result};

/// Output stream that tracks how many bytes were written.
pub struct OStream<W: Write = StagedFile> {
    writer: W,
    pos: u64,
}

impl OStream {
    /// Stage a new file for `path`. The target is only replaced by [`commit`](Self::commit).
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(StagedFile::create(path)?))
    }

    /// Flush and move the staged file over the target.
    pub fn commit(self) -> Result<()> {
        self.writer.commit()
    }
}

/// Temporary file next to a target path.
///
/// Dropping it without [`commit`](Self::commit) deletes the temporary file and
/// leaves the target as it was.
pub struct StagedFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl StagedFile {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let target = path.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir).map_err(|e| Error::from_open(&target, e))?;
        tracing::trace!(temp = %temp.path().display(), target = %target.display(), "staging project file");

        Ok(Self { target, writer: BufWriter::with_capacity(256 * 1024, temp) })
    }

    /// Flush, sync and rename over the target.
    pub fn commit(self) -> Result<()> {
        let temp = self.writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<W: Write> OStream<W> {
    /// Wrap an arbitrary writer.
    pub fn new(writer: W) -> Self {
        Self { writer, pos: 0 }
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Write bytes and advance position.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Flush buffered data.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Write for OStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Write a complete project: movie block, presence mask, every module block.
///
/// The movie's `load_frame_count` is refreshed from its records first. Every
/// module in `modules` gets a block; modules outside `selection` write their
/// placeholder. Returns the number of bytes written.
pub fn write_container<W: Write>(
    out: &mut OStream<W>,
    movie: &mut Movie,
    format: &dyn MovieFormat,
    binary: bool,
    modules: &ModuleSet,
    selection: ModuleSelection,
) -> Result<u64> {
    let start = out.pos();

    movie.load_frame_count = movie.records.len();
    format.serialize(movie, out, binary)?;
    tracing::debug!(bytes = out.pos() - start, frames = movie.load_frame_count, binary, "movie block written");

    out.write_u32(selection.bits())?;

    let mut block = Vec::new();
    for (id, codec) in modules.iter() {
        block.clear();
        let include = selection.contains(id);
        codec.save(&mut block, include)?;
        let len = u32::try_from(block.len())
            .map_err(|_| Error::invalid(format!("{id} block exceeds 4 GiB")))?;

        out.write_u32(len)?;
        out.write_bytes(&block)?;
        tracing::debug!(module = %id, include, bytes = len, "module block written");
    }

    Ok(out.pos() - start)
}
