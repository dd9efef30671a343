//! Project container reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;

use super::format::*;
use crate::core::MovieFormat;
use crate::module::{ModuleId, ModuleSelection, ModuleSet};
use crate::movie::Movie;
use crate::util::{Error, Result};

/// Read-only view of a whole project file.
/// Supports both memory-mapped and buffered I/O modes.
pub struct IStream {
    inner: StreamInner,
}

enum StreamInner {
    /// Memory-mapped file (preferred)
    Mmap(Mmap),
    /// File contents read into memory (fallback, also used for empty files)
    Buffer(Vec<u8>),
}

impl IStream {
    /// Open a file for reading, memory-mapped when the `mmap` feature is on.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, cfg!(feature = "mmap"))
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| Error::from_open(path, e))?;
        let size = file.metadata()?.len();

        let inner = if use_mmap && size > 0 {
            // Safety: the map is read-only and dropped before any save can
            // rewrite the file from this process.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            StreamInner::Mmap(mmap)
        } else {
            let mut buf = Vec::with_capacity(size as usize);
            file.read_to_end(&mut buf)?;
            StreamInner::Buffer(buf)
        };

        Ok(Self { inner })
    }

    /// Whole file contents.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        match &self.inner {
            StreamInner::Mmap(mmap) => mmap,
            StreamInner::Buffer(buf) => buf,
        }
    }

    /// Total file size.
    #[inline]
    pub fn size(&self) -> u64 {
        self.bytes().len() as u64
    }

    /// Check if the file is memory-mapped.
    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self.inner, StreamInner::Mmap(_))
    }
}

/// What happened to one module block during a load.
#[derive(Debug)]
pub enum BlockOutcome {
    /// The module accepted its block.
    Loaded { bytes: u32 },
    /// The file has no block for this module; the module was reset.
    Missing,
    /// The block was unusable; the module was reset.
    Failed(Error),
}

/// Per-module result of reading the module section.
#[derive(Debug)]
pub struct LoadReport {
    /// Presence mask as stored in the file.
    pub selection: ModuleSelection,
    /// Outcome per module in canonical order.
    pub blocks: Vec<(ModuleId, BlockOutcome)>,
    /// Bytes after the last known module (written by a newer writer).
    pub trailing_bytes: u64,
}

impl LoadReport {
    /// Modules whose blocks were rejected.
    pub fn failures(&self) -> impl Iterator<Item = (ModuleId, &Error)> {
        self.blocks.iter().filter_map(|(id, outcome)| match outcome {
            BlockOutcome::Failed(err) => Some((*id, err)),
            _ => None,
        })
    }

    /// Outcome for a single module.
    pub fn outcome(&self, id: ModuleId) -> Option<&BlockOutcome> {
        self.blocks.iter().find(|(m, _)| *m == id).map(|(_, o)| o)
    }

    /// True if every known module got a block and accepted it.
    pub fn is_clean(&self) -> bool {
        self.blocks.iter().all(|(_, o)| matches!(o, BlockOutcome::Loaded { .. }))
    }
}

/// Parse the movie block and advance `input` past it.
pub fn read_movie(input: &mut &[u8], format: &dyn MovieFormat) -> Result<Movie> {
    format.parse(input)
}

/// Read the presence mask and hand every module its block, in canonical
/// order, regardless of the mask.
///
/// Failures are isolated: a module that rejects its block is reset and the
/// next module continues from the following frame. A truncated frame ends the
/// pass and resets everything after it. A truncated mask is reported against
/// the first module.
pub fn read_modules(input: &mut &[u8], modules: &mut ModuleSet) -> LoadReport {
    let mut mask_error = None;
    let bits = match read_presence_mask(input) {
        Mask::Bits(bits) => Some(bits),
        Mask::End => {
            tracing::debug!("no module section, resetting all modules");
            None
        }
        Mask::Truncated { available } => {
            tracing::warn!(available, "presence mask truncated, resetting all modules");
            mask_error = Some(format!("presence mask truncated: {available} of {PRESENCE_MASK_SIZE} bytes"));
            None
        }
    };

    let mut blocks = Vec::with_capacity(ModuleId::COUNT);
    let mut exhausted = bits.is_none();
    for (id, codec) in modules.iter_mut() {
        if let Some(reason) = mask_error.take() {
            codec.reset();
            blocks.push((id, BlockOutcome::Failed(Error::ModuleLoad { module: id, reason })));
            continue;
        }
        if exhausted {
            codec.reset();
            blocks.push((id, BlockOutcome::Missing));
            continue;
        }

        let outcome = match next_frame(input) {
            Frame::Block(payload) => match codec.load(payload) {
                Ok(()) => {
                    tracing::debug!(module = %id, bytes = payload.len(), "module block loaded");
                    BlockOutcome::Loaded { bytes: payload.len() as u32 }
                }
                Err(err) => {
                    tracing::warn!(module = %id, error = %err, "module block rejected, using defaults");
                    codec.reset();
                    BlockOutcome::Failed(Error::ModuleLoad { module: id, reason: err.to_string() })
                }
            },
            Frame::End => {
                tracing::debug!(module = %id, "file ends before module block, using defaults");
                exhausted = true;
                codec.reset();
                BlockOutcome::Missing
            }
            Frame::Truncated { expected, available } => {
                tracing::warn!(module = %id, expected, available, "module block truncated, using defaults");
                exhausted = true;
                codec.reset();
                BlockOutcome::Failed(Error::ModuleLoad {
                    module: id,
                    reason: format!("block truncated: {available} of {expected} bytes"),
                })
            }
        };
        blocks.push((id, outcome));
    }

    let trailing_bytes = input.len() as u64;
    if trailing_bytes > 0 {
        tracing::debug!(trailing_bytes, "ignoring data after last known module");
    }

    LoadReport {
        selection: ModuleSelection::from_bits(bits.unwrap_or_default()),
        blocks,
        trailing_bytes,
    }
}

/// Read a complete container: movie first, then every module.
///
/// Modules are only touched once the movie parsed successfully.
pub fn read_container(
    mut input: &[u8],
    format: &dyn MovieFormat,
    modules: &mut ModuleSet,
) -> Result<(Movie, LoadReport)> {
    let movie = read_movie(&mut input, format)?;
    let report = read_modules(&mut input, modules);
    Ok((movie, report))
}

/// Layout summary of a project file, without interpreting module contents.
#[derive(Debug)]
pub struct ContainerInfo {
    pub movie: Movie,
    /// Size of the movie block in bytes.
    pub movie_bytes: u64,
    /// Presence mask, `None` if the file has no module section.
    pub selection: Option<ModuleSelection>,
    /// Payload size per known module; `None` where the file has no block.
    pub blocks: Vec<(ModuleId, Option<u32>)>,
    pub trailing_bytes: u64,
    /// Set if the mask or a block frame runs past the end of the file.
    pub truncated: bool,
}

/// Walk a project file and describe its layout.
pub fn scan_container(bytes: &[u8], format: &dyn MovieFormat) -> Result<ContainerInfo> {
    let mut input = bytes;
    let movie = read_movie(&mut input, format)?;
    let movie_bytes = (bytes.len() - input.len()) as u64;
    let mut truncated = false;
    let selection = match read_presence_mask(&mut input) {
        Mask::Bits(bits) => Some(ModuleSelection::from_bits(bits)),
        Mask::End => None,
        Mask::Truncated { .. } => {
            truncated = true;
            None
        }
    };

    let blocks = ModuleId::ALL
        .into_iter()
        .map(|id| {
            let size = match next_frame(&mut input) {
                Frame::Block(payload) => Some(payload.len() as u32),
                Frame::End => None,
                Frame::Truncated { .. } => {
                    truncated = true;
                    None
                }
            };
            (id, size)
        })
        .collect();

    Ok(ContainerInfo {
        movie,
        movie_bytes,
        selection,
        blocks,
        trailing_bytes: input.len() as u64,
        truncated,
    })
}
