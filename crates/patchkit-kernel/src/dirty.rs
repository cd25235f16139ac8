//! Dirty flags and the per-entity update state machine.

use bitflags::bitflags;

bitflags! {
    /// What changed on an entity since its last successful update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        /// Control point positions (or the geometry itself) changed.
        const POSITION = 1 << 0;
        /// Only control point selection changed.
        const SELECTION = 1 << 1;
    }
}

/// Where an entity is in its update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    /// Buffers match the geometry.
    Clean,
    /// Waiting for an update pass.
    Dirty(DirtyFlags),
    /// An update pass is running with these flags.
    Updating(DirtyFlags),
}

impl UpdatePhase {
    /// Flags still to be processed.
    pub fn flags(self) -> DirtyFlags {
        match self {
            UpdatePhase::Clean => DirtyFlags::empty(),
            UpdatePhase::Dirty(f) | UpdatePhase::Updating(f) => f,
        }
    }

    /// Add `flags` to whatever is pending.
    pub fn mark(self, flags: DirtyFlags) -> Self {
        let pending = self.flags() | flags;
        if pending.is_empty() {
            UpdatePhase::Clean
        } else {
            UpdatePhase::Dirty(pending)
        }
    }
}
