use tracing::{debug, error, warn};

use crate::error::{MprError, Result};
use crate::registry::ViewportRegistry;
use crate::render::{FrameStyle, RenderBackend, SurfaceId};
use crate::viewport::ViewportName;

/// The viewport currently receiving keyboard, scroll and cine input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusContext {
    pub name: ViewportName,
    pub surface: SurfaceId,
}

/// Single writer of the focus context.
///
/// Input handling and cine playback read the focus through the viewer;
/// only this tracker changes it, so at most one viewport is ever active.
#[derive(Debug, Default)]
pub struct ActiveViewportTracker {
    focus: Option<FocusContext>,
}

impl ActiveViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<FocusContext> {
        self.focus
    }

    /// Focus `surface`, re-enabling it once if its context was lost.
    pub fn set_active(
        &mut self,
        registry: &mut ViewportRegistry,
        backend: &mut dyn RenderBackend,
        surface: SurfaceId,
    ) -> Result<FocusContext> {
        let name = registry
            .name_of(surface)
            .ok_or_else(|| MprError::UnknownViewport(surface.to_string()))?;

        if !backend.is_enabled(surface) {
            warn!(viewport = %name, "Activating a viewport without render context, re-enabling");
            if let Err(e) = backend.enable(surface) {
                error!(viewport = %name, error = %e, "Failed to enable viewport for activation");
                return Err(MprError::ViewportNotEnabled(name.to_string()));
            }
        }

        for viewport in registry.viewports() {
            if viewport.surface != surface {
                backend.set_frame_style(viewport.surface, FrameStyle::Idle(viewport.role()));
            }
        }
        backend.set_frame_style(surface, FrameStyle::Active);
        registry.mark_active(Some(name));

        let focus = FocusContext { name, surface };
        self.focus = Some(focus);
        debug!(viewport = %name, "Active viewport: {}", name.display_name());
        Ok(focus)
    }

    /// Drop the focus, e.g. while a topology is torn down.
    pub fn clear(&mut self, registry: &mut ViewportRegistry) {
        registry.mark_active(None);
        self.focus = None;
    }
}
