//! # tasproj
//!
//! Project files for a TAS (tool-assisted speedrun) editor: a binary container
//! bundling the recorded movie with independently versioned auxiliary modules
//! (markers, bookmarks, greenzone, history, piano roll, selection), plus the
//! save/load/autosave lifecycle around it.
//!
//! ## Modules
//!
//! - [`util`] - Error handling
//! - [`core`] - Collaborator traits (module codecs, movie format, host hooks, clock)
//! - [`movie`] - Primary movie dataset and its FM2-style serializer
//! - [`module`] - Canonical module order, presence mask, module set
//! - [`container`] - On-disk container layout
//! - [`project`] - Project identity, save/load orchestration, autosave
//! - [`settings`] - Persistent user settings
//!
//! ## Example
//!
//! ```ignore
//! use tasproj::prelude::*;
//!
//! let mut project = Project::builder()
//!     .module(ModuleId::Markers, markers.clone())
//!     .build();
//! project.load("run.fm3")?;
//! project.mark_changed();
//! project.save()?;
//! ```

pub mod util;
pub mod core;
pub mod movie;
pub mod module;
pub mod container;
pub mod project;
pub mod settings;

// Re-export commonly used types
pub use util::{Error, Result};
pub use project::{Project, ProjectBuilder};

/// Crate version as `major * 10000 + minor * 100 + patch`, stamped into loaded movies.
pub const APP_VERSION_NUMERIC: u32 = parse_u32(env!("CARGO_PKG_VERSION_MAJOR")) * 10_000
    + parse_u32(env!("CARGO_PKG_VERSION_MINOR")) * 100
    + parse_u32(env!("CARGO_PKG_VERSION_PATCH"));

const fn parse_u32(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value = 0;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    value
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::core::{Clock, ModuleCodec, MovieFormat, ProjectNotifier, SessionReset};
    pub use crate::module::{ModuleId, ModuleSelection, ModuleSet, OpaqueModule};
    pub use crate::movie::{Fm2Format, InputType, Movie, Record, Subtitle};
    pub use crate::container::{BlockOutcome, LoadReport};
    pub use crate::project::{
        AutosaveConfig, AutosaveOutcome, AutosavePrompt, CompactOptions, Project, ProjectBuilder,
    };
    pub use crate::settings::Settings;
}
