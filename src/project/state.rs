//! Project identity and unsaved-changes flag.

use std::path::{Path, PathBuf};

/// Extension of the plain movie file that accompanies a project.
pub const COMPANION_EXTENSION: &str = "fm2";

/// File identity plus the "changed" flag of the open project.
///
/// `project_name` and `companion_file_name` are always derived together from
/// `project_file`; they are never set independently.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectState {
    project_file: PathBuf,
    project_name: String,
    companion_file_name: String,
    changed: bool,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the file identity and clear the flag (new, never saved project).
    pub fn initialize(&mut self) {
        self.project_file = PathBuf::new();
        self.project_name.clear();
        self.companion_file_name.clear();
        self.clear();
    }

    /// Take a new file identity. Name and companion file follow the base name.
    pub fn rename(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            self.project_file = PathBuf::new();
            self.project_name.clear();
            self.companion_file_name.clear();
            return;
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.project_file = path.to_path_buf();
        self.companion_file_name = format!("{name}.{COMPANION_EXTENSION}");
        self.project_name = name;
    }

    /// Set the flag. Returns true only on the clean to dirty edge.
    pub fn mark_changed(&mut self) -> bool {
        !std::mem::replace(&mut self.changed, true)
    }

    /// Clear the flag. Returns true if it was set.
    pub fn clear(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Project file, `None` if the project was never saved or loaded.
    pub fn project_file(&self) -> Option<&Path> {
        if self.project_file.as_os_str().is_empty() {
            None
        } else {
            Some(&self.project_file)
        }
    }

    /// Base name without directory or extension.
    #[inline]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Sibling movie file name (`<name>.fm2`).
    #[inline]
    pub fn companion_file_name(&self) -> &str {
        &self.companion_file_name
    }
}
