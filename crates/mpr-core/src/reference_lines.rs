use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::{DEFAULT_REFERENCE_LINE_WIDTH, PARALLEL_EPSILON};
use crate::geometry::reference_line_endpoints;
use crate::registry::ViewportRegistry;
use crate::render::{
    OverlayLine, RenderBackend, Rgba, SubscriptionId, SurfaceEventKind, SurfaceId,
};
use crate::viewport::{Orientation, ViewportName, ViewportRole};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceLineConfig {
    pub line_width: f32,
    pub epsilon: f64,
    pub axial: Rgba,
    pub sagittal: Rgba,
    pub coronal: Rgba,
    /// Colour for lines of primary viewports.
    pub default: Rgba,
}

impl Default for ReferenceLineConfig {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_REFERENCE_LINE_WIDTH,
            epsilon: PARALLEL_EPSILON,
            axial: Rgba::new(40, 167, 69, 0.9),
            sagittal: Rgba::new(255, 193, 7, 0.9),
            coronal: Rgba::new(220, 53, 69, 0.9),
            default: Rgba::new(0, 123, 255, 0.9),
        }
    }
}

impl ReferenceLineConfig {
    pub fn color_for(&self, role: ViewportRole) -> Rgba {
        match role.orientation() {
            Some(Orientation::Axial) => self.axial,
            Some(Orientation::Sagittal) => self.sagittal,
            Some(Orientation::Coronal) => self.coronal,
            None => self.default,
        }
    }
}

/// Draws, on every repaint of a surface, where each other viewport's image
/// plane crosses it.
///
/// Disabled by default. While enabled it holds an `ImageRendered` and a
/// `NewImage` subscription on every enabled surface.
pub struct ReferenceLineRenderer {
    config: ReferenceLineConfig,
    enabled: bool,
    subscriptions: BTreeMap<SurfaceId, Vec<SubscriptionId>>,
}

impl ReferenceLineRenderer {
    pub fn new(config: ReferenceLineConfig) -> Self {
        Self {
            config,
            enabled: false,
            subscriptions: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &ReferenceLineConfig {
        &self.config
    }

    pub fn enable(&mut self, registry: &ViewportRegistry, backend: &mut dyn RenderBackend) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        for surface in registry.all() {
            self.attach(backend, surface);
        }
        info!("Reference lines enabled");
        redraw_all(registry, backend, None);
    }

    pub fn disable(&mut self, registry: &ViewportRegistry, backend: &mut dyn RenderBackend) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.detach_all(backend);
        info!("Reference lines disabled");
        redraw_all(registry, backend, None);
    }

    /// Subscribe to a newly enabled surface. No-op while disabled.
    pub fn attach(&mut self, backend: &mut dyn RenderBackend, surface: SurfaceId) {
        if !self.enabled || self.subscriptions.contains_key(&surface) {
            return;
        }
        let ids: Vec<_> = [SurfaceEventKind::ImageRendered, SurfaceEventKind::NewImage]
            .into_iter()
            .filter_map(|kind| backend.subscribe(surface, kind).ok())
            .collect();
        self.subscriptions.insert(surface, ids);
    }

    /// Drop every subscription; called before surfaces are torn down.
    pub fn detach_all(&mut self, backend: &mut dyn RenderBackend) {
        for (_, ids) in std::mem::take(&mut self.subscriptions) {
            for id in ids {
                backend.unsubscribe(id);
            }
        }
    }

    /// `target` finished painting: draw the guide line of every other
    /// eligible viewport on it. Pairs lacking metadata, readiness or two
    /// edge intersections are skipped silently.
    pub fn on_image_rendered(
        &self,
        registry: &ViewportRegistry,
        backend: &mut dyn RenderBackend,
        target: SurfaceId,
    ) -> usize {
        if !self.enabled {
            return 0;
        }
        let Some(target_image) = backend.displayed_image(target) else {
            return 0;
        };
        let Some(target_plane) = backend.image_plane(&target_image.image_id) else {
            debug!(%target, "target has no plane metadata, skipping reference lines");
            return 0;
        };

        let sources: Vec<(ViewportName, SurfaceId)> = registry
            .viewports()
            .filter(|v| v.surface != target)
            .map(|v| (v.name, v.surface))
            .collect();

        let mut drawn = 0;
        for (name, source) in sources {
            let Some(source_plane) = backend
                .displayed_image(source)
                .and_then(|image| backend.image_plane(&image.image_id))
            else {
                continue;
            };
            let Some((p1, p2)) = reference_line_endpoints(
                &source_plane,
                &target_plane,
                target_image.columns,
                target_image.rows,
                self.config.epsilon,
            ) else {
                debug!(source = %name, %target, "planes do not produce a reference line");
                continue;
            };
            let (Ok(start), Ok(end)) = (backend.world_to_pixel(target, p1), backend.world_to_pixel(target, p2)) else {
                continue;
            };
            let line = OverlayLine {
                start,
                end,
                color: self.config.color_for(name.role()),
                width: self.config.line_width,
            };
            if backend.draw_line(target, line).is_ok() {
                drawn += 1;
            }
        }
        drawn
    }

    /// `source` switched images: repaint every other surface so its guide
    /// lines follow.
    pub fn on_new_image(
        &self,
        registry: &ViewportRegistry,
        backend: &mut dyn RenderBackend,
        source: SurfaceId,
    ) {
        if self.enabled {
            redraw_all(registry, backend, Some(source));
        }
    }
}

/// Force a repaint of every enabled surface except `skip`. Surfaces without
/// an image are ignored.
fn redraw_all(registry: &ViewportRegistry, backend: &mut dyn RenderBackend, skip: Option<SurfaceId>) {
    for surface in registry.all() {
        if Some(surface) != skip {
            let _ = backend.request_redraw(surface);
        }
    }
}
