//! Binary project container.
//!
//! ## File Structure
//!
//! ```text
//! +------------------------+
//! | Movie block            |  movie format, self-delimiting
//! +------------------------+
//! | Presence mask          |  4 bytes (u32 LE), bit i = ModuleId::ALL[i]
//! +------------------------+
//! | Block length           |  4 bytes (u32 LE)   \
//! | Block payload          |  length bytes        > once per module,
//! +------------------------+                     /  canonical order
//! | ...                    |
//! +------------------------+
//! ```
//!
//! Every module block is present even when its bit is clear; an excluded
//! module writes a placeholder (normally zero length). Readers stop after the
//! last module they know, so modules can be appended to the canonical order
//! without breaking old files.

mod format;
mod reader;
mod writer;

pub use format::*;
pub use reader::*;
pub use writer::*;
