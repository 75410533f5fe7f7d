use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::trace;

use crate::geometry::{ImagePlane, Point2, Vec3};
use crate::viewport::{ImageHandle, VisualState};

use super::{
    FrameStyle, OverlayLine, RenderBackend, RenderError, SubscriptionId, SurfaceEvent,
    SurfaceEventKind, SurfaceId,
};

/// Failure behaviour injected into every surface created for a label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fault {
    /// Number of enable calls that fail before one succeeds. `u32::MAX` fails forever.
    pub enable_failures: u32,
    /// Number of attachment checks that report the surface as detached.
    pub detached_checks: u32,
    /// Every `display_image` call fails.
    pub fail_display: bool,
    /// The surface cannot be created at all.
    pub fail_create: bool,
}

impl Fault {
    pub fn enable_always_fails() -> Self {
        Self {
            enable_failures: u32::MAX,
            ..Default::default()
        }
    }
}

/// State of one in-memory surface, exposed for inspection.
#[derive(Clone, Debug)]
pub struct MemorySurface {
    pub label: String,
    pub index: usize,
    pub enabled: bool,
    pub image: Option<ImageHandle>,
    pub visual: VisualState,
    pub style: Option<FrameStyle>,
    /// Overlay lines drawn since the last repaint.
    pub lines: Vec<OverlayLine>,
    pub render_count: u32,
    pub resize_count: u32,
    pub enable_calls: u32,
    detached_checks_left: u32,
    enable_failures_left: u32,
    fail_display: bool,
}

impl MemorySurface {
    fn new(label: &str, index: usize, fault: Option<&Fault>) -> Self {
        let fault = fault.cloned().unwrap_or_default();
        Self {
            label: label.to_string(),
            index,
            enabled: false,
            image: None,
            visual: VisualState::default(),
            style: None,
            lines: Vec::new(),
            render_count: 0,
            resize_count: 0,
            enable_calls: 0,
            detached_checks_left: fault.detached_checks,
            enable_failures_left: fault.enable_failures,
            fail_display: fault.fail_display,
        }
    }
}

/// Rendering backend that keeps every surface in memory.
///
/// Painting is synchronous: displaying an image, changing its visual state
/// or requesting a redraw clears the overlay and emits `ImageRendered` to
/// subscribers, so overlay drawing can be observed through [`surface`](Self::surface).
#[derive(Default)]
pub struct MemoryBackend {
    surfaces: BTreeMap<SurfaceId, MemorySurface>,
    metadata: HashMap<String, ImagePlane>,
    subscriptions: BTreeMap<SubscriptionId, (SurfaceId, SurfaceEventKind)>,
    faults: HashMap<String, Fault>,
    outbox: VecDeque<SurfaceEvent>,
    next_surface: u64,
    next_subscription: u64,
    created: usize,
    destroyed: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `fault` to every surface created for `label` from now on.
    pub fn inject_fault(&mut self, label: &str, fault: Fault) {
        self.faults.insert(label.to_string(), fault);
    }

    pub fn clear_fault(&mut self, label: &str) {
        self.faults.remove(label);
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&MemorySurface> {
        self.surfaces.get(&id)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &MemorySurface)> {
        self.surfaces.iter().map(|(id, s)| (*id, s))
    }

    pub fn live_surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn enabled_surface_count(&self) -> usize {
        self.surfaces.values().filter(|s| s.enabled).count()
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Register an image's plane metadata, as an image loader would.
    pub fn register_image(&mut self, image: &ImageHandle, plane: ImagePlane) {
        self.metadata.insert(image.image_id.clone(), plane);
    }

    fn get(&self, id: SurfaceId) -> Result<&MemorySurface, RenderError> {
        self.surfaces.get(&id).ok_or(RenderError::UnknownSurface(id))
    }

    fn get_enabled_mut(&mut self, id: SurfaceId) -> Result<&mut MemorySurface, RenderError> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(RenderError::UnknownSurface(id))?;
        if !surface.enabled {
            return Err(RenderError::NotEnabled(id));
        }
        Ok(surface)
    }

    fn emit(&mut self, surface: SurfaceId, kind: SurfaceEventKind) {
        let subscribed = self
            .subscriptions
            .values()
            .any(|(s, k)| *s == surface && *k == kind);
        if subscribed {
            self.outbox.push_back(SurfaceEvent { surface, kind });
        }
    }

    fn paint(&mut self, id: SurfaceId) {
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.lines.clear();
            surface.render_count += 1;
        }
        self.emit(id, SurfaceEventKind::ImageRendered);
    }
}

impl RenderBackend for MemoryBackend {
    fn create_surface(&mut self, label: &str, index: usize) -> Result<SurfaceId, RenderError> {
        if self.faults.get(label).is_some_and(|f| f.fail_create) {
            return Err(RenderError::Creation {
                label: label.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        self.next_surface += 1;
        let id = SurfaceId(self.next_surface);
        let surface = MemorySurface::new(label, index, self.faults.get(label));
        self.surfaces.insert(id, surface);
        self.created += 1;
        trace!(%id, label, "surface created");
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        if self.surfaces.remove(&surface).is_some() {
            self.destroyed += 1;
        }
        self.subscriptions.retain(|_, (s, _)| *s != surface);
        self.outbox.retain(|event| event.surface != surface);
    }

    fn is_attached(&mut self, surface: SurfaceId) -> bool {
        match self.surfaces.get_mut(&surface) {
            Some(s) if s.detached_checks_left > 0 => {
                s.detached_checks_left -= 1;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    fn is_enabled(&self, surface: SurfaceId) -> bool {
        self.surfaces.get(&surface).is_some_and(|s| s.enabled)
    }

    fn enable(&mut self, surface: SurfaceId) -> Result<(), RenderError> {
        let s = self
            .surfaces
            .get_mut(&surface)
            .ok_or(RenderError::UnknownSurface(surface))?;
        s.enable_calls += 1;
        if s.enable_failures_left > 0 {
            if s.enable_failures_left != u32::MAX {
                s.enable_failures_left -= 1;
            }
            return Err(RenderError::ContextAcquisition {
                surface,
                reason: "context unavailable".to_string(),
            });
        }
        s.enabled = true;
        Ok(())
    }

    fn disable(&mut self, surface: SurfaceId) {
        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.enabled = false;
            s.image = None;
            s.lines.clear();
        }
    }

    fn display_image(&mut self, surface: SurfaceId, image: &ImageHandle) -> Result<(), RenderError> {
        let s = self.get_enabled_mut(surface)?;
        if s.fail_display {
            return Err(RenderError::Display {
                image_id: image.image_id.clone(),
                reason: "decoder unavailable".to_string(),
            });
        }
        let changed = s.image.as_ref() != Some(image);
        s.image = Some(image.clone());
        s.visual = VisualState::default();
        if changed {
            self.emit(surface, SurfaceEventKind::NewImage);
        }
        self.paint(surface);
        Ok(())
    }

    fn displayed_image(&self, surface: SurfaceId) -> Option<ImageHandle> {
        self.surfaces
            .get(&surface)
            .filter(|s| s.enabled)
            .and_then(|s| s.image.clone())
    }

    fn visual_state(&self, surface: SurfaceId) -> Result<VisualState, RenderError> {
        let s = self.get(surface)?;
        if !s.enabled {
            return Err(RenderError::NotEnabled(surface));
        }
        if s.image.is_none() {
            return Err(RenderError::NoImage(surface));
        }
        Ok(s.visual)
    }

    fn set_visual_state(&mut self, surface: SurfaceId, state: &VisualState) -> Result<(), RenderError> {
        let s = self.get_enabled_mut(surface)?;
        if s.image.is_none() {
            return Err(RenderError::NoImage(surface));
        }
        s.visual = *state;
        self.paint(surface);
        Ok(())
    }

    fn image_plane(&self, image_id: &str) -> Option<ImagePlane> {
        self.metadata.get(image_id).copied()
    }

    fn add_plane_metadata(&mut self, image_id: &str, plane: ImagePlane) {
        self.metadata.insert(image_id.to_string(), plane);
    }

    fn world_to_pixel(&self, surface: SurfaceId, point: Vec3) -> Result<Point2, RenderError> {
        let s = self.get(surface)?;
        let image = s.image.as_ref().ok_or(RenderError::NoImage(surface))?;
        let plane = self
            .metadata
            .get(&image.image_id)
            .ok_or_else(|| RenderError::MissingMetadata(image.image_id.clone()))?;
        Ok(plane.pixel_point(point))
    }

    fn request_redraw(&mut self, surface: SurfaceId) -> Result<(), RenderError> {
        let s = self.get_enabled_mut(surface)?;
        if s.image.is_none() {
            return Err(RenderError::NoImage(surface));
        }
        self.paint(surface);
        Ok(())
    }

    fn draw_line(&mut self, surface: SurfaceId, line: OverlayLine) -> Result<(), RenderError> {
        let s = self.get_enabled_mut(surface)?;
        s.lines.push(line);
        Ok(())
    }

    fn set_frame_style(&mut self, surface: SurfaceId, style: FrameStyle) {
        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.style = Some(style);
        }
    }

    fn resize(&mut self, surface: SurfaceId) -> Result<(), RenderError> {
        let s = self.get_enabled_mut(surface)?;
        s.resize_count += 1;
        if s.image.is_some() {
            self.paint(surface);
        }
        Ok(())
    }

    fn subscribe(
        &mut self,
        surface: SurfaceId,
        kind: SurfaceEventKind,
    ) -> Result<SubscriptionId, RenderError> {
        self.get(surface)?;
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.insert(id, (surface, kind));
        Ok(id)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription);
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.outbox.drain(..).collect()
    }
}
