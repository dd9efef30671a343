//! Core abstractions for the project lifecycle.
//!
//! This module contains:
//! - Collaborator traits (module codecs, movie format, host hooks)
//! - Clock abstraction used by autosave

mod traits;
mod clock;

pub use traits::*;
pub use clock::*;
