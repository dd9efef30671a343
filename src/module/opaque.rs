//! Pass-through codec for module blocks the host does not interpret.

use std::io::Write;

use crate::core::ModuleCodec;
use crate::util::Result;

/// Keeps a module block as raw bytes.
///
/// Loading stores the payload verbatim, saving writes it back. An excluded
/// save writes an empty placeholder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpaqueModule {
    payload: Vec<u8>,
}

impl OpaqueModule {
    /// Create an opaque module holding the given payload.
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    /// Stored payload.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Check if the module holds no data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl ModuleCodec for OpaqueModule {
    fn save(&self, out: &mut dyn Write, include: bool) -> Result<()> {
        if include {
            out.write_all(&self.payload)?;
        }
        Ok(())
    }

    fn load(&mut self, block: &[u8]) -> Result<()> {
        self.payload = block.to_vec();
        Ok(())
    }

    fn reset(&mut self) {
        self.payload.clear();
    }
}
