use std::time::Duration;

/// Default number of render-context enable attempts before a viewport is left inert.
pub const DEFAULT_ENABLE_ATTEMPTS: u32 = 5;

/// Base delay for retrying a thrown render-context enable. Attempt `n` waits `(n + 1) * base`.
pub const DEFAULT_ENABLE_RETRY_BASE: Duration = Duration::from_millis(200);

/// Base delay for retrying a surface that is not yet attached to the visible tree.
pub const DEFAULT_ATTACH_RETRY_BASE: Duration = Duration::from_millis(100);

/// Default number of attempts for replaying a snapshot onto a surface that is not ready.
pub const DEFAULT_RESTORE_ATTEMPTS: u32 = 3;

/// Base delay between restoration attempts on a single viewport.
pub const DEFAULT_RESTORE_RETRY_BASE: Duration = Duration::from_millis(100);

/// Delay before the first enable attempt of a freshly created surface.
pub const DEFAULT_ENABLE_DELAY: Duration = Duration::from_millis(50);

/// Delay between creating a new layout and replaying preserved state into it.
pub const DEFAULT_RESTORE_DELAY: Duration = Duration::from_millis(200);

/// Delay between base-image restoration and the MPR rebuild.
pub const DEFAULT_MPR_RESTORE_DELAY: Duration = Duration::from_millis(500);

/// Delay before cine playback resumes after a layout switch.
pub const DEFAULT_CINE_RESUME_DELAY: Duration = Duration::from_millis(800);

/// Below this magnitude a line direction is treated as parallel to a plane.
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Stroke width of reference lines in canvas pixels.
pub const DEFAULT_REFERENCE_LINE_WIDTH: f32 = 1.5;

/// Slice position change per wheel notch on an MPR pane.
pub const DEFAULT_WHEEL_STEP: f64 = 0.02;

/// Slice position change per touch drag step on an MPR pane.
pub const DEFAULT_TOUCH_STEP: f64 = 0.05;

/// Vertical drag distance (in pixels) that counts as one touch step.
pub const DEFAULT_TOUCH_THRESHOLD_PX: f64 = 15.0;

/// Slice position used for an orientation that has never been scrolled.
pub const DEFAULT_SLICE_POSITION: f64 = 0.5;

/// Upper bound on scheduler iterations in `run_until_idle`, guards against
/// tasks that keep rescheduling themselves.
pub const MAX_IDLE_ITERATIONS: usize = 10_000;
