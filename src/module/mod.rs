//! Auxiliary modules stored after the movie block.
//!
//! Every project file carries one block per known module, always in the
//! canonical order of [`ModuleId::ALL`]. The presence mask written before the
//! blocks is derived from that order: bit `i` belongs to `ModuleId::ALL[i]`.

mod opaque;

pub use opaque::*;

use std::fmt;

use crate::core::ModuleCodec;

/// Identifier of an auxiliary module, in canonical file order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleId {
    Markers,
    Bookmarks,
    Greenzone,
    History,
    PianoRoll,
    Selection,
}

impl ModuleId {
    /// All modules in canonical order. New modules may only be appended.
    pub const ALL: [ModuleId; 6] = [
        ModuleId::Markers,
        ModuleId::Bookmarks,
        ModuleId::Greenzone,
        ModuleId::History,
        ModuleId::PianoRoll,
        ModuleId::Selection,
    ];

    /// Number of known modules.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in canonical order.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Presence bit for this module.
    #[inline]
    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    /// Lowercase name, as used on the command line and in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Markers => "markers",
            Self::Bookmarks => "bookmarks",
            Self::Greenzone => "greenzone",
            Self::History => "history",
            Self::PianoRoll => "piano_roll",
            Self::Selection => "selection",
        }
    }

    /// Look up a module by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

// `ALL` must list the variants in declaration order.
const _: () = {
    let mut i = 0;
    while i < ModuleId::COUNT {
        assert!(ModuleId::ALL[i] as usize == i);
        i += 1;
    }
};

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Presence mask over [`ModuleId::ALL`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModuleSelection(u32);

impl ModuleSelection {
    /// Every known module.
    pub fn all() -> Self {
        ModuleId::ALL.into_iter().fold(Self::none(), Self::with)
    }

    /// No modules.
    #[inline]
    pub const fn none() -> Self {
        Self(0)
    }

    /// Wrap raw bits read from a file. Unknown bits are kept.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw mask as stored on disk.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Add a module to the selection.
    #[inline]
    pub fn with(self, id: ModuleId) -> Self {
        Self(self.0 | id.bit())
    }

    /// Remove a module from the selection.
    #[inline]
    pub fn without(self, id: ModuleId) -> Self {
        Self(self.0 & !id.bit())
    }

    /// Check whether a module is selected.
    #[inline]
    pub fn contains(self, id: ModuleId) -> bool {
        self.0 & id.bit() != 0
    }

    /// Check whether no known module is selected.
    pub fn is_empty(self) -> bool {
        self.known().next().is_none()
    }

    /// Iterate selected known modules in canonical order.
    pub fn known(self) -> impl Iterator<Item = ModuleId> {
        ModuleId::ALL.into_iter().filter(move |id| self.contains(*id))
    }

    /// Build a selection from module names (comma separated list elements).
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        names
            .into_iter()
            .filter(|n| !n.trim().is_empty())
            .try_fold(Self::none(), |sel, name| ModuleId::from_name(name).map(|id| sel.with(id)))
    }
}

impl FromIterator<ModuleId> for ModuleSelection {
    fn from_iter<I: IntoIterator<Item = ModuleId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}

impl fmt::Display for ModuleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.known().map(ModuleId::name).collect();
        if names.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&names.join(","))
        }
    }
}

/// Ordered set of module codecs, one per canonical slot.
///
/// Slots the host does not register hold an [`OpaqueModule`], which keeps the
/// block bytes it was loaded with and writes them back unchanged.
pub struct ModuleSet {
    slots: Vec<(ModuleId, Box<dyn ModuleCodec>)>,
}

impl ModuleSet {
    /// Create a set where every slot is opaque.
    pub fn new() -> Self {
        let slots = ModuleId::ALL
            .into_iter()
            .map(|id| (id, Box::new(OpaqueModule::default()) as Box<dyn ModuleCodec>))
            .collect();
        Self { slots }
    }

    /// Replace the codec for one slot.
    pub fn with(mut self, id: ModuleId, codec: impl ModuleCodec + 'static) -> Self {
        self.register(id, Box::new(codec));
        self
    }

    /// Replace the codec for one slot in place.
    pub fn register(&mut self, id: ModuleId, codec: Box<dyn ModuleCodec>) {
        self.slots[id.index()].1 = codec;
    }

    /// Iterate slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &dyn ModuleCodec)> {
        self.slots.iter().map(|(id, codec)| (*id, codec.as_ref()))
    }

    /// Iterate slots mutably in canonical order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ModuleId, &mut (dyn ModuleCodec + 'static))> {
        self.slots.iter_mut().map(|(id, codec)| (*id, codec.as_mut()))
    }
}

impl Default for ModuleSet {
    fn default() -> Self {
        Self::new()
    }
}
