use tracing::{debug, error, info, warn};

use crate::error::MprError;
use crate::layout::LayoutKind;
use crate::preservation::{capture, capture_all, replay, resolve_active, Snapshot, SnapshotEntry};
use crate::render::{RenderBackend, SurfaceId};
use crate::viewport::ViewportName;

use super::{RestorePass, Task, ToggleState, Viewer};

impl<B: RenderBackend> Viewer<B> {
    /// Switch to `kind`, carrying images and transforms across.
    ///
    /// Returns whether the old layout was torn down and the new one
    /// created. Restoration runs later on the scheduler. Switching to the
    /// current layout does nothing.
    pub fn switch_layout(&mut self, kind: LayoutKind) -> bool {
        if self.registry.layout() == Some(kind) {
            debug!(layout = %kind, "already in requested layout");
            return true;
        }
        self.toggle = None;
        let snapshot = capture_all(&self.registry, &self.backend);
        self.transition(kind, snapshot, None)
    }

    pub fn switch_layout_named(&mut self, layout: &str) -> bool {
        match layout.parse::<LayoutKind>() {
            Ok(kind) => self.switch_layout(kind),
            Err(e) => {
                error!(error = %e, "Cannot switch layout");
                false
            }
        }
    }

    /// Toggle between the current multi-pane layout and a single pane
    /// showing `name`. Double-clicking the single pane goes back.
    pub fn double_click(&mut self, name: ViewportName) -> bool {
        let Some(layout) = self.registry.layout() else {
            warn!(viewport = %name, "Double-click before any layout exists");
            return false;
        };
        let Some(surface) = self.registry.get(name) else {
            warn!(viewport = %name, "Double-click on a viewport that is not enabled");
            return false;
        };
        let clicked = capture(&self.backend, name, surface);

        if layout.is_multi_pane() {
            let mut stash = capture_all(&self.registry, &self.backend);
            if let Some(unplayed) = &self.restore.snapshot {
                stash.absorb(unplayed.clone());
            }
            let mut snapshot = stash.clone();
            if let Some(entry) = clicked {
                snapshot.pin(ViewportName::Main, entry);
            }
            info!(viewport = %name, from = %layout, "Expanding viewport");
            self.toggle = Some(ToggleState {
                return_to: layout,
                expanded: name,
                stash,
            });
            self.transition(LayoutKind::Single, snapshot, Some(ViewportName::Main))
        } else {
            let (return_to, expanded, mut snapshot) = match self.toggle.take() {
                Some(toggle) => (toggle.return_to, toggle.expanded, toggle.stash),
                None => (LayoutKind::Quad, ViewportName::Original, capture_all(&self.registry, &self.backend)),
            };
            if let Some(mut entry) = clicked {
                entry.origin = expanded;
                snapshot.pin(expanded, entry);
            }
            info!(to = %return_to, viewport = %expanded, "Collapsing single viewport");
            self.transition(return_to, snapshot, Some(expanded))
        }
    }

    fn transition(&mut self, kind: LayoutKind, mut snapshot: Snapshot, focus: Option<ViewportName>) -> bool {
        let from = self.registry.layout();
        if let Some(unplayed) = self.restore.snapshot.take() {
            snapshot.absorb(unplayed);
        }
        self.previous_active = focus
            .or_else(|| self.tracker.current().map(|f| f.name))
            .or(self.previous_active);

        if self.session.is_playing() {
            self.session.stop_cine();
            self.resume_cine = true;
        }

        if !self.create_viewports(kind) {
            // Nothing was built to replay into; keep the state for the next switch.
            self.restore = RestorePass {
                snapshot: Some(snapshot),
                ..RestorePass::default()
            };
            if self.resume_cine {
                self.resume_cine = false;
                self.session.start_cine();
                warn!(layout = %kind, "Layout switch failed, cine resumed");
            }
            return false;
        }

        let preserved = snapshot.len();
        self.restore = RestorePass {
            snapshot: Some(snapshot),
            ..RestorePass::default()
        };
        self.scheduler.schedule(
            self.config.timing.restore_delay(),
            Task::Restore {
                generation: self.registry.generation(),
            },
        );
        info!(
            from = from.map(|l| l.as_str()).unwrap_or("none"),
            to = %kind,
            preserved,
            "Layout switched"
        );
        true
    }

    pub(super) fn restore_all(&mut self, generation: u64) {
        let Some(layout) = self.registry.layout() else {
            return;
        };
        let snapshot = self.restore.snapshot.take().unwrap_or_default();
        let plan = snapshot.plan(layout);
        if plan.is_empty() {
            debug!(layout = %layout, "nothing to restore");
            self.finish_restoration(generation);
            return;
        }
        self.restore.outstanding = plan.len();
        for (name, entry) in plan {
            self.restore_viewport(generation, name, entry, 0);
        }
    }

    /// Replay one snapshot entry. A viewport still waiting for its render
    /// context keeps the entry until it is enabled; any other failure is
    /// retried on the restore policy. A failure never affects the other panes.
    pub(super) fn restore_viewport(
        &mut self,
        generation: u64,
        name: ViewportName,
        entry: SnapshotEntry,
        attempt: u32,
    ) {
        let result = match self.registry.get(name) {
            Some(surface) => replay(&mut self.backend, surface, &entry),
            None => Err(MprError::ViewportNotEnabled(name.to_string())),
        };
        match result {
            Ok(()) => {
                debug!(viewport = %name, source = %entry.origin, image = %entry.image.image_id, "viewport restored");
                if name.role().is_primary() {
                    self.restore.primary_restored = true;
                }
            }
            Err(_) if self.registry.is_pending(name) => {
                debug!(viewport = %name, image = %entry.image.image_id, "viewport not enabled yet, holding its state");
                self.restore.deferred.insert(name, entry);
            }
            Err(e) => {
                let retry = if self.registry.is_inert(name) {
                    None
                } else {
                    self.config.restore_retry.next_delay(attempt)
                };
                if let Some(delay) = retry {
                    debug!(viewport = %name, attempt, error = %e, "restoration deferred");
                    self.scheduler.schedule(
                        delay,
                        Task::RestoreViewport {
                            generation,
                            name,
                            entry,
                            attempt: attempt + 1,
                        },
                    );
                    return;
                }
                error!(viewport = %name, error = %e, "Failed to restore viewport");
            }
        }
        self.restore.outstanding = self.restore.outstanding.saturating_sub(1);
        if self.restore.outstanding == 0 {
            self.finish_restoration(generation);
        }
    }

    /// Base images are in place: fill a blank primary pane from the
    /// session, re-establish focus, then queue the MPR rebuild and cine.
    fn finish_restoration(&mut self, generation: u64) {
        let Some(layout) = self.registry.layout() else {
            return;
        };
        if !self.restore.primary_restored {
            let primary_deferred = self.restore.deferred.keys().any(|name| name.role().is_primary());
            if primary_deferred {
                self.restore.fallback_pending = true;
            } else {
                self.load_session_fallback(layout);
            }
        }

        let target = resolve_active(self.previous_active, layout);
        let surface = self
            .registry
            .get(target)
            .or_else(|| self.registry.all().first().copied());
        match surface {
            Some(surface) => self.activate(surface),
            None => warn!(layout = %layout, "No enabled viewport to focus"),
        }

        let has_volume = self.volume.as_ref().is_some_and(|v| v.has_volume());
        if self.config.mpr_enabled && layout.has_mpr_panes() && has_volume {
            self.scheduler.schedule(
                self.config.timing.mpr_restore_delay(),
                Task::RestoreMpr { generation },
            );
        }
        if self.resume_cine {
            self.scheduler.schedule(
                self.config.timing.cine_resume_delay(),
                Task::ResumeCine { generation },
            );
        }
    }

    fn load_session_fallback(&mut self, layout: LayoutKind) {
        let Some(name) = layout.first_primary() else {
            return;
        };
        let Some(image) = self.session.current_image() else {
            debug!(layout = %layout, "session has no current image to fall back to");
            return;
        };
        if self.registry.is_pending(name) {
            debug!(viewport = %name, "primary pane not enabled yet, loading the session image once it is");
            self.restore.fallback_pending = true;
            return;
        }
        match self.load_image(name, &image) {
            Ok(()) => info!(viewport = %name, image = %image.image_id, "Loaded current session image"),
            Err(e) => warn!(viewport = %name, error = %e, "Failed to load current session image"),
        }
    }

    /// `name` was enabled after restoration reached it: replay the state it
    /// was owed, then fill it from the session if the layout still has no
    /// restored primary pane.
    pub(super) fn restore_late_viewport(&mut self, name: ViewportName, surface: SurfaceId) {
        if let Some(entry) = self.restore.deferred.remove(&name) {
            match replay(&mut self.backend, surface, &entry) {
                Ok(()) => {
                    info!(viewport = %name, source = %entry.origin, image = %entry.image.image_id, "Late viewport restored");
                    if name.role().is_primary() {
                        self.restore.primary_restored = true;
                    }
                }
                Err(e) => error!(viewport = %name, error = %e, "Failed to restore viewport"),
            }
        }
        if self.restore.fallback_pending && !self.restore.primary_restored && name.role().is_primary() {
            self.restore.fallback_pending = false;
            if let Some(layout) = self.registry.layout() {
                self.load_session_fallback(layout);
            }
        }
    }

    /// `name` went inert: whatever it was owed can no longer be shown.
    pub(super) fn abandon_late_viewport(&mut self, name: ViewportName) {
        if let Some(entry) = self.restore.deferred.remove(&name) {
            error!(viewport = %name, image = %entry.image.image_id, "Viewport went inert before it could be restored");
        }
        if self.restore.fallback_pending && name.role().is_primary() {
            self.restore.fallback_pending = false;
            warn!(viewport = %name, "Primary pane went inert, no session image shown");
        }
    }

    /// Regenerate every MPR pane at its remembered slice position.
    pub(super) fn restore_mpr(&mut self) {
        let rebuilt = self.rebuild_mpr();
        info!(rebuilt, "MPR panes rebuilt");
    }

    pub(super) fn resume_cine(&mut self) {
        if !self.resume_cine {
            return;
        }
        self.resume_cine = false;
        if self.session.total_images() > 1 {
            self.session.start_cine();
            info!("Cine playback resumed");
        }
    }
}
