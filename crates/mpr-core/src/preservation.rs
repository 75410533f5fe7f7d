use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{MprError, Result};
use crate::layout::LayoutKind;
use crate::registry::ViewportRegistry;
use crate::render::{RenderBackend, SurfaceId};
use crate::viewport::{ImageHandle, ViewportName, VisualState};

use ViewportName::*;

/// Names a captured viewport is additionally filed under, so a snapshot
/// taken in one topology can be replayed into another.
const SNAPSHOT_ALIASES: &[(ViewportName, &[ViewportName])] = &[
    (Original, &[Main, Left, Top]),
    (Axial, &[Right, Bottom]),
    (Main, &[Original]),
    (Left, &[Original]),
    (Top, &[Original]),
    (Right, &[Axial]),
    (Bottom, &[Axial]),
];

/// Per destination viewport, the snapshot names it accepts, best first.
const SINGLE_PRIORITY: &[(ViewportName, &[ViewportName])] =
    &[(Main, &[Original, Main, Axial, Sagittal, Coronal])];

const DUAL_PRIORITY: &[(ViewportName, &[ViewportName])] = &[
    (Left, &[Original, Main]),
    (Right, &[Axial, Sagittal, Coronal]),
];

const STACKED_PRIORITY: &[(ViewportName, &[ViewportName])] = &[
    (Top, &[Original, Main]),
    (Bottom, &[Axial, Sagittal, Coronal]),
];

const QUAD_PRIORITY: &[(ViewportName, &[ViewportName])] = &[
    (Original, &[Original, Main, Left, Top]),
    (Axial, &[Axial, Right, Bottom]),
    (Sagittal, &[Sagittal]),
    (Coronal, &[Coronal]),
];

/// Focus mapping: which names in a new topology best stand in for a
/// previously focused viewport.
const ACTIVE_ALIASES: &[(ViewportName, &[ViewportName])] = &[
    (Original, &[Original, Main, Left, Top]),
    (Axial, &[Axial, Right, Bottom]),
    (Sagittal, &[Sagittal, Right, Bottom]),
    (Coronal, &[Coronal, Right, Bottom]),
    (Main, &[Main, Original]),
    (Left, &[Left, Original, Main]),
    (Right, &[Right, Axial]),
    (Top, &[Top, Original, Main]),
    (Bottom, &[Bottom, Axial]),
];

fn lookup(table: &[(ViewportName, &'static [ViewportName])], name: ViewportName) -> &'static [ViewportName] {
    table
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

pub fn snapshot_aliases(name: ViewportName) -> &'static [ViewportName] {
    lookup(SNAPSHOT_ALIASES, name)
}

/// Restoration priority list of `layout`: `(destination, acceptable sources)`.
pub fn restoration_priority(layout: LayoutKind) -> &'static [(ViewportName, &'static [ViewportName])] {
    match layout {
        LayoutKind::Single => SINGLE_PRIORITY,
        LayoutKind::Dual => DUAL_PRIORITY,
        LayoutKind::Stacked => STACKED_PRIORITY,
        LayoutKind::Quad => QUAD_PRIORITY,
    }
}

/// Best viewport of `layout` to focus after `previous` was focused.
/// Falls back to the layout's first viewport.
pub fn resolve_active(previous: Option<ViewportName>, layout: LayoutKind) -> ViewportName {
    let Some(previous) = previous else {
        return layout.default_focus();
    };
    lookup(ACTIVE_ALIASES, previous)
        .iter()
        .copied()
        .find(|name| layout.contains(*name))
        .unwrap_or_else(|| layout.first_viewport())
}

/// Image and transform of one viewport, captured before a topology change.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotEntry {
    pub image: ImageHandle,
    pub visual: VisualState,
    /// Viewport the state was captured from.
    pub origin: ViewportName,
}

/// Preserved state of a whole topology, keyed by viewport name and alias.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<ViewportName, SnapshotEntry>,
    pinned: BTreeMap<ViewportName, SnapshotEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.pinned.is_empty()
    }

    /// File `entry` under its own name (replacing any alias there) and under
    /// its aliases where nothing is filed yet.
    pub fn insert(&mut self, entry: SnapshotEntry) {
        for &alias in snapshot_aliases(entry.origin) {
            self.entries.entry(alias).or_insert_with(|| entry.clone());
        }
        self.entries.insert(entry.origin, entry);
    }

    /// Force `destination` to receive `entry`, ahead of the priority list.
    pub fn pin(&mut self, destination: ViewportName, entry: SnapshotEntry) {
        self.pinned.insert(destination, entry);
    }

    /// Take over entries of an older snapshot that was never replayed,
    /// without overriding anything captured since. Pins are not carried.
    pub fn absorb(&mut self, older: Snapshot) {
        for (name, entry) in older.entries {
            self.entries.entry(name).or_insert(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: ViewportName) -> Option<&SnapshotEntry> {
        self.entries.get(&name)
    }

    /// Entry to replay into `destination`: a pinned entry, else the first
    /// source in `sources` that has one.
    pub fn select(&self, destination: ViewportName, sources: &[ViewportName]) -> Option<&SnapshotEntry> {
        self.pinned
            .get(&destination)
            .or_else(|| sources.iter().find_map(|name| self.entries.get(name)))
    }

    /// `(destination, entry)` pairs to replay into `layout`, in priority order.
    pub fn plan(&self, layout: LayoutKind) -> Vec<(ViewportName, SnapshotEntry)> {
        restoration_priority(layout)
            .iter()
            .filter_map(|(dest, sources)| self.select(*dest, sources).map(|e| (*dest, e.clone())))
            .collect()
    }
}

/// Capture one surface, if it is enabled and shows an image.
pub fn capture(
    backend: &dyn RenderBackend,
    name: ViewportName,
    surface: SurfaceId,
) -> Option<SnapshotEntry> {
    let image = backend.displayed_image(surface)?;
    let visual = backend.visual_state(surface).ok()?;
    Some(SnapshotEntry {
        image,
        visual,
        origin: name,
    })
}

/// Capture every enabled viewport that displays an image.
pub fn capture_all(registry: &ViewportRegistry, backend: &dyn RenderBackend) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for viewport in registry.viewports() {
        if let Some(entry) = capture(backend, viewport.name, viewport.surface) {
            debug!(viewport = %viewport.name, image = %entry.image.image_id, "captured viewport state");
            snapshot.insert(entry);
        }
    }
    snapshot
}

/// Replay `entry` onto `surface`: display the image first, then apply the
/// transform, since displaying resets it.
pub fn replay(
    backend: &mut dyn RenderBackend,
    surface: SurfaceId,
    entry: &SnapshotEntry,
) -> Result<()> {
    if !backend.is_enabled(surface) {
        return Err(MprError::ViewportNotEnabled(surface.to_string()));
    }
    backend.display_image(surface, &entry.image)?;
    backend.set_visual_state(surface, &entry.visual)?;
    Ok(())
}
