mod navigation;
mod switch;

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::active::{ActiveViewportTracker, FocusContext};
use crate::config::ViewerConfig;
use crate::consts::MAX_IDLE_ITERATIONS;
use crate::error::{MprError, Result};
use crate::events::ViewerEvent;
use crate::layout::LayoutKind;
use crate::mpr::{MprVolume, SlicePositions};
use crate::preservation::{Snapshot, SnapshotEntry};
use crate::reference_lines::ReferenceLineRenderer;
use crate::registry::{EnableOutcome, ViewportRegistry, ViewportStats};
use crate::render::{FrameStyle, RenderBackend, SurfaceEventKind, SurfaceId};
use crate::scheduler::Scheduler;
use crate::session::SessionProvider;
use crate::viewport::{ImageHandle, Viewport, ViewportName, VisualState};

/// Deferred work. Every task carries the layout generation it was
/// scheduled for and does nothing once that layout is gone.
#[derive(Debug)]
enum Task {
    EnableSurface {
        generation: u64,
        name: ViewportName,
        attempt: u32,
    },
    Restore {
        generation: u64,
    },
    RestoreViewport {
        generation: u64,
        name: ViewportName,
        entry: SnapshotEntry,
        attempt: u32,
    },
    RestoreMpr {
        generation: u64,
    },
    ResumeCine {
        generation: u64,
    },
}

impl Task {
    fn generation(&self) -> u64 {
        match self {
            Self::EnableSurface { generation, .. }
            | Self::Restore { generation }
            | Self::RestoreViewport { generation, .. }
            | Self::RestoreMpr { generation }
            | Self::ResumeCine { generation } => *generation,
        }
    }
}

/// Layout the double-click toggle expanded from.
struct ToggleState {
    return_to: LayoutKind,
    expanded: ViewportName,
    /// Panes of `return_to` as they were when the toggle expanded.
    stash: Snapshot,
}

/// Bookkeeping of the restoration pass of the current layout.
#[derive(Default)]
struct RestorePass {
    /// Captured before the switch, replayed by the `Restore` task.
    snapshot: Option<Snapshot>,
    outstanding: usize,
    primary_restored: bool,
    /// Entries for viewports still pending when their turn came; replayed
    /// as each one is enabled.
    deferred: BTreeMap<ViewportName, SnapshotEntry>,
    /// The session fallback is owed to a primary pane that is not enabled yet.
    fallback_pending: bool,
}

/// Multi-viewport orchestration over a rendering backend.
///
/// All asynchrony runs on an internal virtual-clock scheduler: nothing
/// deferred happens until [`advance`](Self::advance) or
/// [`run_until_idle`](Self::run_until_idle) is called.
pub struct Viewer<B: RenderBackend> {
    config: ViewerConfig,
    backend: B,
    session: Box<dyn SessionProvider>,
    volume: Option<Box<dyn MprVolume>>,
    registry: ViewportRegistry,
    tracker: ActiveViewportTracker,
    reference_lines: ReferenceLineRenderer,
    scheduler: Scheduler<Task>,
    restore: RestorePass,
    toggle: Option<ToggleState>,
    previous_active: Option<ViewportName>,
    slice_positions: SlicePositions,
    touch_travel: BTreeMap<ViewportName, f64>,
    resume_cine: bool,
    subscribers: Vec<mpsc::Sender<ViewerEvent>>,
}

impl<B: RenderBackend> Viewer<B> {
    pub fn new(backend: B, session: Box<dyn SessionProvider>, config: ViewerConfig) -> Self {
        let registry = ViewportRegistry::new(config.enable_retry, config.attach_retry);
        let reference_lines = ReferenceLineRenderer::new(config.reference_lines.clone());
        let slice_positions = SlicePositions::new(config.navigation.default_slice_position);
        Self {
            config,
            backend,
            session,
            volume: None,
            registry,
            tracker: ActiveViewportTracker::new(),
            reference_lines,
            scheduler: Scheduler::new(),
            restore: RestorePass::default(),
            toggle: None,
            previous_active: None,
            slice_positions,
            touch_travel: BTreeMap::new(),
            resume_cine: false,
            subscribers: Vec::new(),
        }
    }

    pub fn with_volume(mut self, volume: Box<dyn MprVolume>) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn set_volume(&mut self, volume: Option<Box<dyn MprVolume>>) {
        self.volume = volume;
    }

    /// Build the configured initial layout.
    pub fn start(&mut self) -> bool {
        self.switch_layout(self.config.initial_layout)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn session(&self) -> &dyn SessionProvider {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn SessionProvider {
        self.session.as_mut()
    }

    pub fn registry(&self) -> &ViewportRegistry {
        &self.registry
    }

    /// Receive viewer notifications. Dropped receivers are pruned on the next send.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ViewerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: ViewerEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Run every task due within `dt` of the current time.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let until = self.scheduler.now() + dt;
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(until) {
            self.run_task(task);
            ran += 1;
        }
        self.scheduler.advance_to(until);
        self.pump_events();
        ran
    }

    /// Run deferred work until the queue is empty.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while ran < MAX_IDLE_ITERATIONS {
            let Some(task) = self.scheduler.pop_next() else {
                break;
            };
            self.run_task(task);
            ran += 1;
        }
        if !self.scheduler.is_empty() {
            warn!(remaining = self.scheduler.len(), "Scheduler did not settle");
        }
        self.pump_events();
        ran
    }

    fn run_task(&mut self, task: Task) {
        if task.generation() != self.registry.generation() {
            debug!(?task, current = self.registry.generation(), "dropping stale task");
            return;
        }
        match task {
            Task::EnableSurface {
                generation,
                name,
                attempt,
            } => self.enable_surface(generation, name, attempt),
            Task::Restore { generation } => self.restore_all(generation),
            Task::RestoreViewport {
                generation,
                name,
                entry,
                attempt,
            } => self.restore_viewport(generation, name, entry, attempt),
            Task::RestoreMpr { .. } => self.restore_mpr(),
            Task::ResumeCine { .. } => self.resume_cine(),
        }
        self.pump_events();
    }

    /// Deliver backend notifications to the reference-line renderer until
    /// no more are produced.
    fn pump_events(&mut self) {
        for _ in 0..MAX_IDLE_ITERATIONS {
            let events = self.backend.poll_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                match event.kind {
                    SurfaceEventKind::ImageRendered => {
                        self.reference_lines.on_image_rendered(
                            &self.registry,
                            &mut self.backend,
                            event.surface,
                        );
                    }
                    SurfaceEventKind::NewImage => {
                        self.reference_lines.on_new_image(
                            &self.registry,
                            &mut self.backend,
                            event.surface,
                        );
                    }
                }
            }
        }
        warn!("Render notifications did not settle");
    }

    /// Tear down the current layout and create the surfaces of `kind`.
    /// Enabling is deferred; the result reflects teardown and creation only.
    pub fn create_viewports(&mut self, kind: LayoutKind) -> bool {
        let from = self.registry.layout();
        self.reference_lines.detach_all(&mut self.backend);
        self.tracker.clear(&mut self.registry);
        self.touch_travel.clear();

        let created = self.registry.begin_layout(kind, &mut self.backend);
        if created.is_empty() {
            error!(layout = %kind, "No viewport surface could be created");
            return false;
        }

        let generation = self.registry.generation();
        let delay = self.config.timing.enable_delay();
        for (name, _) in created {
            self.scheduler.schedule(
                delay,
                Task::EnableSurface {
                    generation,
                    name,
                    attempt: 0,
                },
            );
        }
        self.emit(ViewerEvent::LayoutChanged { from, to: kind });
        true
    }

    /// Parse a layout name, then [`create_viewports`](Self::create_viewports).
    pub fn create_viewports_named(&mut self, layout: &str) -> bool {
        match layout.parse::<LayoutKind>() {
            Ok(kind) => self.create_viewports(kind),
            Err(e) => {
                error!(error = %e, "Cannot create viewports");
                false
            }
        }
    }

    fn enable_surface(&mut self, generation: u64, name: ViewportName, attempt: u32) {
        match self.registry.try_enable(&mut self.backend, name, attempt) {
            EnableOutcome::Enabled(surface) => {
                self.backend.set_frame_style(surface, FrameStyle::Idle(name.role()));
                self.reference_lines.attach(&mut self.backend, surface);
                let Some(layout) = self.registry.layout() else {
                    return;
                };
                self.emit(ViewerEvent::ViewportCreated {
                    name,
                    surface,
                    layout,
                });
                if self.tracker.current().is_none() && name == layout.default_focus() {
                    self.activate(surface);
                }
                self.restore_late_viewport(name, surface);
            }
            EnableOutcome::Retry(delay) => {
                self.scheduler.schedule(
                    delay,
                    Task::EnableSurface {
                        generation,
                        name,
                        attempt: attempt + 1,
                    },
                );
            }
            EnableOutcome::Inert => {
                self.emit(ViewerEvent::ViewportInert { name });
                self.abandon_late_viewport(name);
            }
            EnableOutcome::Stale => {}
        }
    }

    pub fn layout(&self) -> Option<LayoutKind> {
        self.registry.layout()
    }

    /// Surface of an enabled viewport.
    pub fn get_viewport(&self, name: ViewportName) -> Option<SurfaceId> {
        self.registry.get(name)
    }

    /// Surfaces of every enabled viewport, in grid order.
    pub fn get_all_viewports(&self) -> Vec<SurfaceId> {
        self.registry.all()
    }

    pub fn viewports(&self) -> Vec<Viewport> {
        self.registry.viewports().cloned().collect()
    }

    pub fn stats(&self) -> ViewportStats {
        self.registry.stats(&self.backend)
    }

    pub fn focus(&self) -> Option<FocusContext> {
        self.tracker.current()
    }

    pub fn set_active_viewport(&mut self, surface: SurfaceId) -> Result<()> {
        let focus = self
            .tracker
            .set_active(&mut self.registry, &mut self.backend, surface)?;
        self.emit(ViewerEvent::ActiveViewportChanged {
            name: focus.name,
            surface: focus.surface,
        });
        Ok(())
    }

    /// Activate by name; convenience for pointer handlers.
    pub fn activate_viewport(&mut self, name: ViewportName) -> Result<()> {
        let surface = self
            .registry
            .get(name)
            .ok_or_else(|| MprError::ViewportNotEnabled(name.to_string()))?;
        self.set_active_viewport(surface)
    }

    fn activate(&mut self, surface: SurfaceId) {
        if let Err(e) = self.set_active_viewport(surface) {
            warn!(%surface, error = %e, "Could not activate viewport");
        }
    }

    pub fn reference_lines_enabled(&self) -> bool {
        self.reference_lines.is_enabled()
    }

    pub fn enable_reference_lines(&mut self) {
        self.reference_lines.enable(&self.registry, &mut self.backend);
        self.pump_events();
    }

    pub fn disable_reference_lines(&mut self) {
        self.reference_lines.disable(&self.registry, &mut self.backend);
        self.pump_events();
    }

    fn surface_of(&self, name: ViewportName) -> Result<SurfaceId> {
        if let Some(layout) = self.registry.layout() {
            if !layout.contains(name) {
                return Err(MprError::ViewportNotInLayout(name.to_string()));
            }
        }
        self.registry
            .get(name)
            .ok_or_else(|| MprError::ViewportNotEnabled(name.to_string()))
    }

    /// Display `image` in `name`, resetting its visual state.
    pub fn load_image(&mut self, name: ViewportName, image: &ImageHandle) -> Result<()> {
        let surface = self.surface_of(name)?;
        self.backend.display_image(surface, image)?;
        debug!(viewport = %name, image = %image.image_id, "image loaded");
        self.pump_events();
        Ok(())
    }

    /// Display `image` in `surface`, keeping the transform it had.
    fn show_preserving(&mut self, surface: SurfaceId, image: &ImageHandle) -> Result<()> {
        let previous = self.backend.visual_state(surface).ok();
        self.backend.display_image(surface, image)?;
        if let Some(visual) = previous {
            self.backend.set_visual_state(surface, &visual)?;
        }
        Ok(())
    }

    pub fn displayed_image(&self, name: ViewportName) -> Option<ImageHandle> {
        self.registry
            .get(name)
            .and_then(|surface| self.backend.displayed_image(surface))
    }

    pub fn visual_state(&self, name: ViewportName) -> Result<VisualState> {
        let surface = self.surface_of(name)?;
        Ok(self.backend.visual_state(surface)?)
    }

    pub fn apply_visual_state(&mut self, name: ViewportName, state: &VisualState) -> Result<()> {
        let surface = self.surface_of(name)?;
        self.backend.set_visual_state(surface, state)?;
        self.pump_events();
        Ok(())
    }

    /// The shared container changed size: resize every observed surface.
    pub fn notify_resized(&mut self) -> usize {
        let observed: Vec<_> = self
            .registry
            .all()
            .into_iter()
            .filter(|surface| self.registry.watcher().is_observing(*surface))
            .collect();
        let mut resized = 0;
        for surface in observed {
            match self.backend.resize(surface) {
                Ok(()) => resized += 1,
                Err(e) => debug!(%surface, error = %e, "resize skipped"),
            }
        }
        self.pump_events();
        info!(resized, "Viewports resized");
        resized
    }
}
