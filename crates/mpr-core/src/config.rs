use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ATTACH_RETRY_BASE, DEFAULT_CINE_RESUME_DELAY, DEFAULT_ENABLE_ATTEMPTS,
    DEFAULT_ENABLE_DELAY, DEFAULT_ENABLE_RETRY_BASE, DEFAULT_MPR_RESTORE_DELAY,
    DEFAULT_RESTORE_ATTEMPTS, DEFAULT_RESTORE_DELAY, DEFAULT_RESTORE_RETRY_BASE,
    DEFAULT_SLICE_POSITION, DEFAULT_TOUCH_STEP, DEFAULT_TOUCH_THRESHOLD_PX, DEFAULT_WHEEL_STEP,
};
use crate::layout::LayoutKind;
use crate::reference_lines::ReferenceLineConfig;
use crate::retry::RetryPolicy;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub initial_layout: LayoutKind,
    /// Rebuild MPR panes from the volume provider after each switch.
    #[serde(default = "default_true")]
    pub mpr_enabled: bool,
    #[serde(default = "default_enable_retry")]
    pub enable_retry: RetryPolicy,
    #[serde(default = "default_attach_retry")]
    pub attach_retry: RetryPolicy,
    #[serde(default = "default_restore_retry")]
    pub restore_retry: RetryPolicy,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub reference_lines: ReferenceLineConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_layout: LayoutKind::default(),
            mpr_enabled: true,
            enable_retry: default_enable_retry(),
            attach_retry: default_attach_retry(),
            restore_retry: default_restore_retry(),
            timing: TimingConfig::default(),
            reference_lines: ReferenceLineConfig::default(),
            navigation: NavigationConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_enable_retry() -> RetryPolicy {
    RetryPolicy::new(DEFAULT_ENABLE_ATTEMPTS, DEFAULT_ENABLE_RETRY_BASE)
}

fn default_attach_retry() -> RetryPolicy {
    RetryPolicy::new(DEFAULT_ENABLE_ATTEMPTS, DEFAULT_ATTACH_RETRY_BASE)
}

fn default_restore_retry() -> RetryPolicy {
    RetryPolicy::new(DEFAULT_RESTORE_ATTEMPTS, DEFAULT_RESTORE_RETRY_BASE)
}

/// Deferral delays, in milliseconds of scheduler time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub enable_delay_ms: u64,
    pub restore_delay_ms: u64,
    pub mpr_restore_delay_ms: u64,
    pub cine_resume_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enable_delay_ms: DEFAULT_ENABLE_DELAY.as_millis() as u64,
            restore_delay_ms: DEFAULT_RESTORE_DELAY.as_millis() as u64,
            mpr_restore_delay_ms: DEFAULT_MPR_RESTORE_DELAY.as_millis() as u64,
            cine_resume_delay_ms: DEFAULT_CINE_RESUME_DELAY.as_millis() as u64,
        }
    }
}

impl TimingConfig {
    pub fn enable_delay(&self) -> Duration {
        Duration::from_millis(self.enable_delay_ms)
    }

    pub fn restore_delay(&self) -> Duration {
        Duration::from_millis(self.restore_delay_ms)
    }

    pub fn mpr_restore_delay(&self) -> Duration {
        Duration::from_millis(self.mpr_restore_delay_ms)
    }

    pub fn cine_resume_delay(&self) -> Duration {
        Duration::from_millis(self.cine_resume_delay_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Slice position change per wheel notch on an MPR pane.
    pub wheel_step: f64,
    pub touch_step: f64,
    /// Vertical drag distance, in pixels, per touch step.
    pub touch_threshold_px: f64,
    pub default_slice_position: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            wheel_step: DEFAULT_WHEEL_STEP,
            touch_step: DEFAULT_TOUCH_STEP,
            touch_threshold_px: DEFAULT_TOUCH_THRESHOLD_PX,
            default_slice_position: DEFAULT_SLICE_POSITION,
        }
    }
}
