//! Collaborator traits for the project lifecycle.
//!
//! These traits define the boundary between the persistence core and the
//! editor subsystems that own the actual data (modules, display, playback).

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use crate::movie::{Movie, Subtitle};
use crate::util::Result;

// ============================================================================
// Module Codec
// ============================================================================

/// Save/load contract for one auxiliary module.
///
/// The container frames every block, so a codec only ever sees its own bytes.
pub trait ModuleCodec {
    /// Write the module state.
    ///
    /// With `include == false` the codec writes a minimal placeholder (usually
    /// nothing) that its own `load` accepts as "reset state".
    fn save(&self, out: &mut dyn Write, include: bool) -> Result<()>;

    /// Restore state from a block produced by `save`.
    /// An empty block must leave the module in its reset state.
    fn load(&mut self, block: &[u8]) -> Result<()>;

    /// Return to the default state.
    fn reset(&mut self);
}

impl<T: ModuleCodec + ?Sized> ModuleCodec for Box<T> {
    fn save(&self, out: &mut dyn Write, include: bool) -> Result<()> {
        (**self).save(out, include)
    }

    fn load(&mut self, block: &[u8]) -> Result<()> {
        (**self).load(block)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Shared handle: the host keeps typed access while the project saves/loads.
impl<T: ModuleCodec + ?Sized> ModuleCodec for Rc<RefCell<T>> {
    fn save(&self, out: &mut dyn Write, include: bool) -> Result<()> {
        self.borrow().save(out, include)
    }

    fn load(&mut self, block: &[u8]) -> Result<()> {
        self.borrow_mut().load(block)
    }

    fn reset(&mut self) {
        self.borrow_mut().reset()
    }
}

// ============================================================================
// Movie Format
// ============================================================================

/// Reader/writer for the primary movie block.
pub trait MovieFormat {
    /// Parse one movie from the stream, consuming exactly its bytes.
    fn parse(&self, input: &mut dyn BufRead) -> Result<Movie>;

    /// Write the movie. `binary` selects raw records over text lines.
    fn serialize(&self, movie: &Movie, out: &mut dyn Write, binary: bool) -> Result<()>;
}

// ============================================================================
// Host Collaborators
// ============================================================================

/// Display hooks fired by the project.
pub trait ProjectNotifier {
    /// The unsaved-changes flag flipped.
    fn dirty_state_changed(&mut self, _changed: bool) {}

    /// A save finished writing.
    fn save_progress(&mut self) {}

    /// A freshly loaded movie brought its subtitles.
    fn subtitles_loaded(&mut self, _subtitles: &[Subtitle]) {}
}

/// Notifier that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl ProjectNotifier for NullNotifier {}

impl<T: ProjectNotifier + ?Sized> ProjectNotifier for Rc<RefCell<T>> {
    fn dirty_state_changed(&mut self, changed: bool) {
        self.borrow_mut().dirty_state_changed(changed)
    }

    fn save_progress(&mut self) {
        self.borrow_mut().save_progress()
    }

    fn subtitles_loaded(&mut self, subtitles: &[Subtitle]) {
        self.borrow_mut().subtitles_loaded(subtitles)
    }
}

/// Session-only component that returns to defaults after a project load
/// (playback cursor, recorder, splicer, popups).
pub trait SessionReset {
    fn reset(&mut self);
}

impl<T: SessionReset + ?Sized> SessionReset for Rc<RefCell<T>> {
    fn reset(&mut self) {
        self.borrow_mut().reset()
    }
}
