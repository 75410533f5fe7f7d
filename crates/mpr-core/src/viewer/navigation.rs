use tracing::{debug, warn};

use crate::error::{MprError, Result};
use crate::render::RenderBackend;
use crate::viewport::{Orientation, ViewportName};

use super::Viewer;

impl<B: RenderBackend> Viewer<B> {
    /// Mouse wheel over `name`. MPR panes scroll through the volume,
    /// other panes step through the session's images.
    pub fn on_wheel(&mut self, name: ViewportName, delta_y: f64) -> Result<()> {
        if delta_y == 0.0 {
            return Ok(());
        }
        let step = self.config.navigation.wheel_step;
        self.step_viewport(name, delta_y.signum(), step)
    }

    /// Vertical touch drag over `name`. Every `touch_threshold_px` of travel
    /// counts as one step. Returns the number of steps taken.
    pub fn on_touch_drag(&mut self, name: ViewportName, delta_y: f64) -> Result<usize> {
        let threshold = self.config.navigation.touch_threshold_px;
        let step = self.config.navigation.touch_step;
        let travel = self.touch_travel.entry(name).or_insert(0.0);
        *travel += delta_y;
        if threshold <= 0.0 {
            return Ok(0);
        }

        let direction = travel.signum();
        let steps = (travel.abs() / threshold).floor() as usize;
        *travel -= direction * threshold * steps as f64;
        for _ in 0..steps {
            self.step_viewport(name, direction, step)?;
        }
        Ok(steps)
    }

    /// Drag finished: forget partial travel.
    pub fn end_touch(&mut self, name: ViewportName) {
        self.touch_travel.remove(&name);
    }

    fn step_viewport(&mut self, name: ViewportName, direction: f64, step: f64) -> Result<()> {
        let surface = self.surface_of(name)?;
        let has_volume = self.volume.as_ref().is_some_and(|v| v.has_volume());

        if let (Some(orientation), true) = (name.role().orientation(), has_volume) {
            let position = self.slice_positions.step(orientation, direction * step);
            debug!(%orientation, position, "slice position changed");
            self.rebuild_pane(orientation)?;
        } else if self.session.total_images() > 1 {
            let Some(image) = self.session.navigate(direction as i64) else {
                return Ok(());
            };
            self.show_preserving(surface, &image)?;
        }
        self.pump_events();
        Ok(())
    }

    pub fn slice_position(&self, orientation: Orientation) -> f64 {
        self.slice_positions.get(orientation)
    }

    /// Move `orientation` to normalized `position` and regenerate its pane
    /// when the current layout shows it.
    pub fn set_slice_position(&mut self, orientation: Orientation, position: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&position) {
            return Err(MprError::InvalidSlicePosition(position));
        }
        self.slice_positions.set(orientation, position);
        let shown = self
            .registry
            .layout()
            .is_some_and(|layout| layout.contains(orientation.viewport()));
        if shown {
            self.rebuild_pane(orientation)?;
            self.pump_events();
        }
        Ok(())
    }

    /// Regenerate every MPR pane of the current layout. Returns how many
    /// panes now show their slice; failures are logged per pane.
    pub fn rebuild_mpr(&mut self) -> usize {
        let Some(layout) = self.registry.layout() else {
            return 0;
        };
        let mut rebuilt = 0;
        for orientation in layout.orientations() {
            match self.rebuild_pane(orientation) {
                Ok(()) => rebuilt += 1,
                Err(e) => warn!(%orientation, error = %e, "Failed to rebuild MPR pane"),
            }
        }
        self.pump_events();
        rebuilt
    }

    /// Generate the slice of `orientation` at its stored position, register
    /// its plane metadata and show it in the matching pane. A pane already
    /// showing that slice is left untouched.
    fn rebuild_pane(&mut self, orientation: Orientation) -> Result<()> {
        let surface = self.surface_of(orientation.viewport())?;
        let position = self.slice_positions.get(orientation);
        let volume = self.volume.as_mut().ok_or(MprError::NoVolume)?;
        if !volume.has_volume() {
            return Err(MprError::NoVolume);
        }
        let slice = volume.generate_slice(orientation, position)?;
        self.backend
            .add_plane_metadata(&slice.image.image_id, slice.plane);

        if self.backend.displayed_image(surface).as_ref() == Some(&slice.image) {
            return Ok(());
        }
        self.show_preserving(surface, &slice.image)
    }
}
