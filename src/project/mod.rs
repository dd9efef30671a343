//! Working project: identity, save/load orchestration and autosave.
//!
//! A [`Project`] owns the movie, the module codecs and the host collaborators
//! it was built with. All operations run synchronously on the caller's
//! thread; file handles never outlive the call that opened them.

mod autosave;
mod state;

pub use autosave::*;
pub use state::*;

use std::path::Path;

use crate::container::{read_modules, read_movie, write_container, IStream, LoadReport, OStream};
use crate::core::{Clock, ModuleCodec, MovieFormat, NullNotifier, ProjectNotifier, SessionReset, SystemClock};
use crate::module::{ModuleId, ModuleSelection, ModuleSet};
use crate::movie::{Fm2Format, Movie};
use crate::util::{Error, Result};
use crate::APP_VERSION_NUMERIC;

/// The working save always stores raw records.
const FULL_SAVE_BINARY: bool = true;

/// Options for a partial/export save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactOptions {
    /// Store records raw instead of as text lines.
    pub binary: bool,
    /// Modules whose content is written; the rest get placeholders.
    pub modules: ModuleSelection,
}

impl Default for CompactOptions {
    fn default() -> Self {
        Self { binary: true, modules: ModuleSelection::all() }
    }
}

/// An open project.
pub struct Project {
    state: ProjectState,
    movie: Movie,
    modules: ModuleSet,
    format: Box<dyn MovieFormat>,
    notifier: Box<dyn ProjectNotifier>,
    session: Vec<Box<dyn SessionReset>>,
    autosave: Autosave,
    use_mmap: bool,
}

impl Project {
    /// Project with default collaborators.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ProjectBuilder {
        ProjectBuilder::default()
    }

    // ------------------------------------------------------------------
    // Identity and changes
    // ------------------------------------------------------------------

    /// Start a new, never saved project.
    pub fn initialize(&mut self) {
        let was_changed = self.state.is_changed();
        self.state.initialize();
        if was_changed {
            self.notifier.dirty_state_changed(false);
        }
    }

    /// Give the project a new file identity without saving.
    pub fn rename(&mut self, path: impl AsRef<Path>) {
        self.state.rename(path);
    }

    /// Record that the project has unsaved edits.
    ///
    /// Only the first call after a save/load notifies the host and restarts
    /// the autosave countdown.
    pub fn mark_changed(&mut self) {
        if self.state.mark_changed() {
            self.notifier.dirty_state_changed(true);
            self.autosave.reschedule();
        }
    }

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.state.is_changed()
    }

    #[inline]
    pub fn project_file(&self) -> Option<&Path> {
        self.state.project_file()
    }

    #[inline]
    pub fn project_name(&self) -> &str {
        self.state.project_name()
    }

    #[inline]
    pub fn companion_file_name(&self) -> &str {
        self.state.companion_file_name()
    }

    #[inline]
    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    // ------------------------------------------------------------------
    // Data access
    // ------------------------------------------------------------------

    #[inline]
    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    /// Mutable movie access. Callers report edits with [`mark_changed`](Self::mark_changed).
    #[inline]
    pub fn movie_mut(&mut self) -> &mut Movie {
        &mut self.movie
    }

    #[inline]
    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    #[inline]
    pub fn modules_mut(&mut self) -> &mut ModuleSet {
        &mut self.modules
    }

    #[inline]
    pub fn autosave(&self) -> &Autosave {
        &self.autosave
    }

    pub fn set_autosave_config(&mut self, config: AutosaveConfig) {
        self.autosave.set_config(config);
    }

    // ------------------------------------------------------------------
    // Save / load
    // ------------------------------------------------------------------

    /// Save everything to the current project file.
    ///
    /// Fails with [`Error::NoProjectPath`] before touching any file if the
    /// project was never named.
    pub fn save(&mut self) -> Result<u64> {
        let path = self.state.project_file().ok_or(Error::NoProjectPath)?.to_path_buf();
        let written = self.write_to(&path, FULL_SAVE_BINARY, ModuleSelection::all())?;
        self.notifier.save_progress();
        self.clear_changed();
        Ok(written)
    }

    /// Save everything to `path` and adopt it as the project file.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let written = self.write_to(path, FULL_SAVE_BINARY, ModuleSelection::all())?;
        self.state.rename(path);
        self.notifier.save_progress();
        self.clear_changed();
        Ok(written)
    }

    /// Write a partial snapshot to `path`.
    ///
    /// Identity and the changed flag are left alone.
    pub fn save_compact(&mut self, path: impl AsRef<Path>, options: &CompactOptions) -> Result<u64> {
        let written = self.write_to(path.as_ref(), options.binary, options.modules)?;
        self.notifier.save_progress();
        Ok(written)
    }

    fn write_to(&mut self, path: &Path, binary: bool, selection: ModuleSelection) -> Result<u64> {
        tracing::info!(path = %path.display(), binary, modules = %selection, "saving project");
        let mut out = OStream::create(path).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "cannot open project file for writing");
        })?;
        let written = write_container(&mut out, &mut self.movie, self.format.as_ref(), binary, &self.modules, selection)
            .inspect_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "save aborted, previous file kept");
            })?;
        out.commit()?;
        tracing::info!(bytes = written, frames = self.movie.len(), "project saved");
        Ok(written)
    }

    /// Replace the working project with the one stored at `path`.
    ///
    /// Nothing changes unless the file opens and its movie block parses.
    /// Module failures after that point are isolated and listed in the
    /// returned report.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading project");

        let stream = IStream::open_opts(path, self.use_mmap).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "error opening project");
        })?;
        let mut input = stream.bytes();

        let mut movie = read_movie(&mut input, self.format.as_ref()).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "error loading movie data");
        })?;
        movie.emu_version = APP_VERSION_NUMERIC;
        self.notifier.subtitles_loaded(&movie.subtitles);
        movie.normalize_input_type();
        self.movie = movie;

        let report = read_modules(&mut input, &mut self.modules);
        drop(stream);

        for component in &mut self.session {
            component.reset();
        }
        self.clear_changed();
        self.state.rename(path);

        tracing::info!(
            frames = self.movie.len(),
            modules = %report.selection,
            failed = report.failures().count(),
            "project loaded"
        );
        Ok(report)
    }

    fn clear_changed(&mut self) {
        if self.state.clear() {
            self.notifier.dirty_state_changed(false);
        }
    }

    // ------------------------------------------------------------------
    // Autosave
    // ------------------------------------------------------------------

    /// Poll the autosave deadline. Call once per host loop iteration.
    ///
    /// When a save is due it runs (or the prompt is shown) and the deadline
    /// is pushed one full period ahead, whatever the result.
    pub fn tick_autosave(&mut self, prompt: &mut dyn AutosavePrompt) -> AutosaveOutcome {
        let Some(action) = self.autosave.due(self.state.is_changed()) else {
            return AutosaveOutcome::Idle;
        };

        let outcome = match action {
            AutosaveAction::Silent if self.state.project_file().is_some() => match self.save() {
                Ok(_) => AutosaveOutcome::Saved,
                Err(e) => {
                    tracing::warn!(error = %e, "autosave failed");
                    AutosaveOutcome::Failed(e)
                }
            },
            _ => {
                tracing::debug!("autosave asking host for a file name");
                AutosaveOutcome::Prompted { saved: prompt.save_as(self) }
            }
        };

        self.autosave.reschedule();
        outcome
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles a [`Project`] from its collaborators.
pub struct ProjectBuilder {
    format: Box<dyn MovieFormat>,
    modules: ModuleSet,
    notifier: Box<dyn ProjectNotifier>,
    session: Vec<Box<dyn SessionReset>>,
    clock: Box<dyn Clock>,
    autosave: AutosaveConfig,
    use_mmap: bool,
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self {
            format: Box::new(Fm2Format),
            modules: ModuleSet::new(),
            notifier: Box::new(NullNotifier),
            session: Vec::new(),
            clock: Box::new(SystemClock::new()),
            autosave: AutosaveConfig::default(),
            use_mmap: cfg!(feature = "mmap"),
        }
    }
}

impl ProjectBuilder {
    pub fn format(mut self, format: impl MovieFormat + 'static) -> Self {
        self.format = Box::new(format);
        self
    }

    pub fn modules(mut self, modules: ModuleSet) -> Self {
        self.modules = modules;
        self
    }

    /// Register a codec for one canonical slot.
    pub fn module(mut self, id: ModuleId, codec: impl ModuleCodec + 'static) -> Self {
        self.modules.register(id, Box::new(codec));
        self
    }

    pub fn notifier(mut self, notifier: impl ProjectNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Add a component reset after every successful load.
    pub fn session_component(mut self, component: impl SessionReset + 'static) -> Self {
        self.session.push(Box::new(component));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn autosave(mut self, config: AutosaveConfig) -> Self {
        self.autosave = config;
        self
    }

    /// Memory-map project files on load.
    pub fn mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn build(self) -> Project {
        Project {
            state: ProjectState::new(),
            movie: Movie::default(),
            modules: self.modules,
            format: self.format,
            notifier: self.notifier,
            session: self.session,
            autosave: Autosave::new(self.autosave, self.clock),
            use_mmap: self.use_mmap,
        }
    }
}
