use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use mpr_core::geometry::{ImagePlane, Vec3};
use mpr_core::mpr::SyntheticVolume;
use mpr_core::render::{Fault, MemoryBackend};
use mpr_core::session::SeriesSession;
use mpr_core::{
    ImageHandle, LayoutKind, Orientation, Viewer, ViewerConfig, ViewportName, VisualState,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::summary;

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file (TOML)
    pub scenario: PathBuf,

    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// A scripted viewer session: the series to load, injected backend faults,
/// and the interactions to replay in order.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Overrides the config's initial layout.
    #[serde(default)]
    pub layout: Option<LayoutKind>,
    /// Number of axial images in the session series.
    #[serde(default = "default_images")]
    pub images: usize,
    #[serde(default)]
    pub volume: Option<VolumeSettings>,
    /// Whether cine playback is running when the scenario starts.
    #[serde(default)]
    pub playing: bool,
    #[serde(default, rename = "fault")]
    pub faults: Vec<FaultSettings>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

fn default_images() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VolumeSettings {
    pub dimensions: [u32; 3],
    pub spacing: [f64; 3],
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            dimensions: [256, 256, 256],
            spacing: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FaultSettings {
    pub viewport: ViewportName,
    #[serde(default)]
    pub enable_failures: u32,
    /// Enabling never succeeds.
    #[serde(default)]
    pub always: bool,
    #[serde(default)]
    pub detached_checks: u32,
    #[serde(default)]
    pub fail_display: bool,
    #[serde(default)]
    pub fail_create: bool,
}

impl FaultSettings {
    fn to_fault(&self) -> Fault {
        Fault {
            enable_failures: if self.always {
                u32::MAX
            } else {
                self.enable_failures
            },
            detached_checks: self.detached_checks,
            fail_display: self.fail_display,
            fail_create: self.fail_create,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Switch {
        layout: LayoutKind,
    },
    DoubleClick {
        viewport: ViewportName,
    },
    Activate {
        viewport: ViewportName,
    },
    /// Display image `image` of the session series.
    Load {
        viewport: ViewportName,
        image: usize,
    },
    SetVisual {
        viewport: ViewportName,
        #[serde(default)]
        state: VisualState,
    },
    ReferenceLines {
        enabled: bool,
    },
    Wheel {
        viewport: ViewportName,
        delta: f64,
    },
    Touch {
        viewport: ViewportName,
        delta: f64,
    },
    Slice {
        orientation: Orientation,
        position: f64,
    },
    Resize,
    /// Advance the virtual clock without draining the queue.
    Advance {
        ms: u64,
    },
    Idle,
}

impl Step {
    fn label(&self) -> String {
        match self {
            Self::Switch { layout } => format!("switch {layout}"),
            Self::DoubleClick { viewport } => format!("double-click {viewport}"),
            Self::Activate { viewport } => format!("activate {viewport}"),
            Self::Load { viewport, image } => format!("load {image} -> {viewport}"),
            Self::SetVisual { viewport, .. } => format!("visual {viewport}"),
            Self::ReferenceLines { enabled } => {
                format!("lines {}", if *enabled { "on" } else { "off" })
            }
            Self::Wheel { viewport, .. } => format!("wheel {viewport}"),
            Self::Touch { viewport, .. } => format!("touch {viewport}"),
            Self::Slice { orientation, .. } => format!("slice {orientation}"),
            Self::Resize => "resize".to_string(),
            Self::Advance { ms } => format!("advance {ms}ms"),
            Self::Idle => "idle".to_string(),
        }
    }
}

fn series_image(index: usize) -> ImageHandle {
    ImageHandle::new(format!("series:{index}"), 256, 256)
}

fn series_plane(index: usize) -> ImagePlane {
    ImagePlane {
        row_cosines: Vec3::new(1.0, 0.0, 0.0),
        column_cosines: Vec3::new(0.0, 1.0, 0.0),
        image_position: Vec3::new(0.0, 0.0, index as f64),
        row_spacing: 1.0,
        column_spacing: 1.0,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ViewerConfig> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid viewer config")
}

fn build_viewer(scenario: &Scenario, mut config: ViewerConfig) -> Viewer<MemoryBackend> {
    if let Some(layout) = scenario.layout {
        config.initial_layout = layout;
    }

    let images: Vec<ImageHandle> = (0..scenario.images).map(series_image).collect();
    let mut backend = MemoryBackend::new();
    for (index, image) in images.iter().enumerate() {
        backend.register_image(image, series_plane(index));
    }
    for fault in &scenario.faults {
        backend.inject_fault(fault.viewport.as_str(), fault.to_fault());
    }

    let mut session = SeriesSession::new(images);
    session.set_playing(scenario.playing);

    let mut viewer = Viewer::new(backend, Box::new(session), config);
    if let Some(ref volume) = scenario.volume {
        viewer.set_volume(Some(Box::new(SyntheticVolume::new(
            "volume",
            volume.dimensions,
            volume.spacing,
        ))));
    }
    viewer
}

fn apply_step(viewer: &mut Viewer<MemoryBackend>, step: &Step, series: usize) -> Result<()> {
    match step {
        Step::Switch { layout } => {
            if !viewer.switch_layout(*layout) {
                bail!("no viewports created for {layout}");
            }
        }
        Step::DoubleClick { viewport } => {
            if !viewer.double_click(*viewport) {
                bail!("double-click on {viewport} was ignored");
            }
        }
        Step::Activate { viewport } => viewer.activate_viewport(*viewport)?,
        Step::Load { viewport, image } => {
            if *image >= series {
                bail!("series has no image {image}");
            }
            viewer.load_image(*viewport, &series_image(*image))?;
        }
        Step::SetVisual { viewport, state } => viewer.apply_visual_state(*viewport, state)?,
        Step::ReferenceLines { enabled: true } => viewer.enable_reference_lines(),
        Step::ReferenceLines { enabled: false } => viewer.disable_reference_lines(),
        Step::Wheel { viewport, delta } => viewer.on_wheel(*viewport, *delta)?,
        Step::Touch { viewport, delta } => {
            viewer.on_touch_drag(*viewport, *delta)?;
        }
        Step::Slice {
            orientation,
            position,
        } => viewer.set_slice_position(*orientation, *position)?,
        Step::Resize => {
            viewer.notify_resized();
        }
        Step::Advance { ms } => {
            viewer.advance(Duration::from_millis(*ms));
        }
        Step::Idle => {
            viewer.run_until_idle();
        }
    }
    Ok(())
}

pub fn run(args: &SimulateArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read scenario {}", args.scenario.display()))?;
    let scenario: Scenario = toml::from_str(&contents).context("Invalid scenario")?;
    let config = load_config(args.config.as_ref())?;

    let mut viewer = build_viewer(&scenario, config);
    let events = viewer.subscribe();
    if !viewer.start() {
        bail!("initial layout produced no viewports");
    }
    viewer.run_until_idle();

    let pb = ProgressBar::new(scenario.steps.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let mut failures = Vec::new();
    for (index, step) in scenario.steps.iter().enumerate() {
        pb.set_message(step.label());
        info!(step = index + 1, action = %step.label(), "Applying step");
        if let Err(err) = apply_step(&mut viewer, step, scenario.images) {
            warn!(step = index + 1, "Step failed: {err:#}");
            failures.push(format!("step {} ({}): {err:#}", index + 1, step.label()));
        }
        pb.inc(1);
    }
    viewer.run_until_idle();
    pb.finish_with_message("Done");

    let received: Vec<_> = events.try_iter().collect();
    summary::print_viewer_summary(&viewer, &received, &failures);
    Ok(())
}
