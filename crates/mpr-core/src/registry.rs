use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::layout::LayoutKind;
use crate::render::{RenderBackend, SurfaceId};
use crate::retry::RetryPolicy;
use crate::viewport::{Viewport, ViewportName};

/// Size-change watcher shared by every enabled surface of one topology.
///
/// A fresh watcher is created for each topology; the previous one is
/// disconnected so it never observes destroyed surfaces.
#[derive(Debug, Default)]
pub struct ResizeWatcher {
    generation: u64,
    observed: BTreeSet<SurfaceId>,
    connected: bool,
}

impl ResizeWatcher {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            observed: BTreeSet::new(),
            connected: true,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn observe(&mut self, surface: SurfaceId) {
        if self.connected {
            self.observed.insert(surface);
        }
    }

    pub fn unobserve(&mut self, surface: SurfaceId) {
        self.observed.remove(&surface);
    }

    pub fn disconnect(&mut self) {
        self.observed.clear();
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_observing(&self, surface: SurfaceId) -> bool {
        self.observed.contains(&surface)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }
}

/// Result of one enable attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnableOutcome {
    Enabled(SurfaceId),
    /// Try again after the given delay.
    Retry(Duration),
    /// Out of attempts; the viewport stays inert for this topology.
    Inert,
    /// The viewport no longer awaits enabling (torn down or already enabled).
    Stale,
}

/// Snapshot of registry health, for status displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewportStats {
    pub layout: Option<LayoutKind>,
    pub total: usize,
    pub enabled: usize,
    pub with_images: usize,
    pub pending: usize,
    pub inert: usize,
    pub active: Option<ViewportName>,
}

/// Owns the mapping from viewport name to render surface for the current topology.
///
/// Surfaces move through `pending` (created, awaiting a render context) to
/// `viewports` (enabled) or `inert` (gave up). Only enabled viewports are
/// visible through [`get`](Self::get) and [`all`](Self::all).
pub struct ViewportRegistry {
    layout: Option<LayoutKind>,
    generation: u64,
    viewports: BTreeMap<ViewportName, Viewport>,
    pending: BTreeMap<ViewportName, (SurfaceId, usize)>,
    inert: BTreeMap<ViewportName, SurfaceId>,
    watcher: ResizeWatcher,
    enable_retry: RetryPolicy,
    attach_retry: RetryPolicy,
}

impl ViewportRegistry {
    pub fn new(enable_retry: RetryPolicy, attach_retry: RetryPolicy) -> Self {
        Self {
            layout: None,
            generation: 0,
            viewports: BTreeMap::new(),
            pending: BTreeMap::new(),
            inert: BTreeMap::new(),
            watcher: ResizeWatcher::default(),
            enable_retry,
            attach_retry,
        }
    }

    pub fn layout(&self) -> Option<LayoutKind> {
        self.layout
    }

    /// Incremented on every topology change; deferred work compares against it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn watcher(&self) -> &ResizeWatcher {
        &self.watcher
    }

    /// Release every render context, detach the resize watcher, destroy all
    /// surfaces and clear the map.
    pub fn teardown(&mut self, backend: &mut dyn RenderBackend) {
        let released = self.viewports.len();
        for (name, viewport) in std::mem::take(&mut self.viewports) {
            self.watcher.unobserve(viewport.surface);
            if backend.is_enabled(viewport.surface) {
                backend.disable(viewport.surface);
            }
            backend.destroy_surface(viewport.surface);
            debug!(viewport = %name, surface = %viewport.surface, "viewport released");
        }
        for (_, (surface, _)) in std::mem::take(&mut self.pending) {
            backend.destroy_surface(surface);
        }
        for (_, surface) in std::mem::take(&mut self.inert) {
            backend.destroy_surface(surface);
        }
        self.watcher.disconnect();
        if released > 0 {
            debug!(released, "viewport registry cleared");
        }
    }

    /// Tear down the current topology and create one surface container per
    /// viewport of `layout`. Returns the containers that were created; none
    /// of them is enabled yet.
    pub fn begin_layout(
        &mut self,
        layout: LayoutKind,
        backend: &mut dyn RenderBackend,
    ) -> Vec<(ViewportName, SurfaceId)> {
        self.teardown(backend);
        self.generation += 1;
        self.layout = Some(layout);
        self.watcher = ResizeWatcher::new(self.generation);

        let mut created = Vec::new();
        for (index, &name) in layout.viewports().iter().enumerate() {
            match backend.create_surface(name.as_str(), index) {
                Ok(surface) => {
                    self.pending.insert(name, (surface, index));
                    created.push((name, surface));
                }
                Err(e) => {
                    error!(viewport = %name, error = %e, "Failed to create viewport surface");
                }
            }
        }
        info!(
            layout = %layout,
            created = created.len(),
            generation = self.generation,
            "Created viewport surfaces"
        );
        created
    }

    /// One enable attempt for a pending viewport.
    ///
    /// A detached surface is retried on the attach policy; a thrown context
    /// acquisition on the enable policy. When either runs out the viewport
    /// is marked inert and the rest of the layout is unaffected.
    pub fn try_enable(
        &mut self,
        backend: &mut dyn RenderBackend,
        name: ViewportName,
        attempt: u32,
    ) -> EnableOutcome {
        let Some(&(surface, index)) = self.pending.get(&name) else {
            return EnableOutcome::Stale;
        };

        if !backend.is_attached(surface) {
            return match self.attach_retry.next_delay(attempt) {
                Some(delay) => {
                    debug!(viewport = %name, attempt, "surface not attached yet, deferring");
                    EnableOutcome::Retry(delay)
                }
                None => {
                    error!(viewport = %name, attempts = attempt + 1, "Surface never attached");
                    self.mark_inert(name, surface);
                    EnableOutcome::Inert
                }
            };
        }

        if !backend.is_enabled(surface) {
            if let Err(e) = backend.enable(surface) {
                warn!(
                    viewport = %name,
                    attempt = attempt + 1,
                    max_attempts = self.enable_retry.max_attempts,
                    error = %e,
                    "Failed to enable viewport"
                );
                return match self.enable_retry.next_delay(attempt) {
                    Some(delay) => EnableOutcome::Retry(delay),
                    None => {
                        error!(
                            viewport = %name,
                            attempts = self.enable_retry.max_attempts,
                            "Giving up on viewport, leaving it inert"
                        );
                        self.mark_inert(name, surface);
                        EnableOutcome::Inert
                    }
                };
            }
        }

        self.pending.remove(&name);
        self.viewports.insert(
            name,
            Viewport {
                name,
                surface,
                index,
                is_active: false,
            },
        );
        self.watcher.observe(surface);
        debug!(viewport = %name, %surface, position = index + 1, "viewport enabled");
        EnableOutcome::Enabled(surface)
    }

    fn mark_inert(&mut self, name: ViewportName, surface: SurfaceId) {
        self.pending.remove(&name);
        self.inert.insert(name, surface);
    }

    /// Surface of an enabled viewport.
    pub fn get(&self, name: ViewportName) -> Option<SurfaceId> {
        self.viewports.get(&name).map(|v| v.surface)
    }

    pub fn viewport(&self, name: ViewportName) -> Option<&Viewport> {
        self.viewports.get(&name)
    }

    /// Enabled viewports in grid order.
    pub fn viewports(&self) -> impl Iterator<Item = &Viewport> {
        let order = self.layout.map(LayoutKind::viewports).unwrap_or(&[]);
        order.iter().filter_map(move |name| self.viewports.get(name))
    }

    /// Surfaces of all enabled viewports in grid order.
    pub fn all(&self) -> Vec<SurfaceId> {
        self.viewports().map(|v| v.surface).collect()
    }

    pub fn name_of(&self, surface: SurfaceId) -> Option<ViewportName> {
        self.viewports
            .values()
            .find(|v| v.surface == surface)
            .map(|v| v.name)
    }

    pub fn is_pending(&self, name: ViewportName) -> bool {
        self.pending.contains_key(&name)
    }

    pub fn is_inert(&self, name: ViewportName) -> bool {
        self.inert.contains_key(&name)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Flag exactly `name` (or nothing) as active.
    pub(crate) fn mark_active(&mut self, name: Option<ViewportName>) {
        for viewport in self.viewports.values_mut() {
            viewport.is_active = Some(viewport.name) == name;
        }
    }

    pub fn active(&self) -> Option<ViewportName> {
        self.viewports.values().find(|v| v.is_active).map(|v| v.name)
    }

    pub fn stats(&self, backend: &dyn RenderBackend) -> ViewportStats {
        let enabled: Vec<_> = self
            .viewports()
            .filter(|v| backend.is_enabled(v.surface))
            .collect();
        ViewportStats {
            layout: self.layout,
            total: self.layout.map_or(0, |l| l.viewports().len()),
            enabled: enabled.len(),
            with_images: enabled
                .iter()
                .filter(|v| backend.displayed_image(v.surface).is_some())
                .count(),
            pending: self.pending.len(),
            inert: self.inert.len(),
            active: self.active(),
        }
    }
}
