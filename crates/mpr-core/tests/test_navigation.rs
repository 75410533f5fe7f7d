mod common;

use approx::assert_relative_eq;

use mpr_core::{LayoutKind, MprError, Orientation, ViewportName, VisualState};

// ---------------------------------------------------------------------------
// MPR panes
// ---------------------------------------------------------------------------

#[test]
fn test_mpr_panes_are_built_after_restoration() {
    let viewer = common::started_with_volume(LayoutKind::Quad, 1);
    assert_eq!(
        viewer.displayed_image(ViewportName::Axial).unwrap().image_id,
        "vol:axial:128"
    );
    assert_eq!(
        viewer.displayed_image(ViewportName::Sagittal).unwrap().image_id,
        "vol:sagittal:128"
    );
    assert_eq!(
        viewer.displayed_image(ViewportName::Coronal).unwrap().image_id,
        "vol:coronal:128"
    );
}

#[test]
fn test_wheel_moves_slice_position() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    viewer.on_wheel(ViewportName::Axial, 120.0).unwrap();

    assert_relative_eq!(viewer.slice_position(Orientation::Axial), 0.52, epsilon = 1e-12);
    assert_eq!(
        viewer.displayed_image(ViewportName::Axial).unwrap().image_id,
        "vol:axial:133"
    );
    // Other orientations are independent.
    assert_relative_eq!(viewer.slice_position(Orientation::Sagittal), 0.5);
}

#[test]
fn test_wheel_clamps_at_volume_edge() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    viewer.set_slice_position(Orientation::Coronal, 0.01).unwrap();
    viewer.on_wheel(ViewportName::Coronal, -1.0).unwrap();
    viewer.on_wheel(ViewportName::Coronal, -1.0).unwrap();
    assert_relative_eq!(viewer.slice_position(Orientation::Coronal), 0.0);
    assert_eq!(
        viewer.displayed_image(ViewportName::Coronal).unwrap().image_id,
        "vol:coronal:0"
    );
}

#[test]
fn test_zero_wheel_delta_does_nothing() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    viewer.on_wheel(ViewportName::Axial, 0.0).unwrap();
    assert_relative_eq!(viewer.slice_position(Orientation::Axial), 0.5);
}

#[test]
fn test_scrolling_keeps_the_pane_transform() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    let state = VisualState {
        scale: 3.0,
        ..VisualState::default()
    };
    viewer.apply_visual_state(ViewportName::Sagittal, &state).unwrap();
    viewer.on_wheel(ViewportName::Sagittal, 1.0).unwrap();
    assert_relative_eq!(viewer.visual_state(ViewportName::Sagittal).unwrap().scale, 3.0);
}

#[test]
fn test_touch_drag_steps_per_threshold() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    assert_eq!(viewer.on_touch_drag(ViewportName::Axial, 10.0).unwrap(), 0);
    assert_eq!(viewer.on_touch_drag(ViewportName::Axial, 10.0).unwrap(), 1);
    assert_relative_eq!(viewer.slice_position(Orientation::Axial), 0.55, epsilon = 1e-12);

    assert_eq!(viewer.on_touch_drag(ViewportName::Axial, -40.0).unwrap(), 2);
    assert_relative_eq!(viewer.slice_position(Orientation::Axial), 0.45, epsilon = 1e-12);

    viewer.end_touch(ViewportName::Axial);
    assert_eq!(viewer.on_touch_drag(ViewportName::Axial, -10.0).unwrap(), 0);
}

#[test]
fn test_invalid_slice_position_is_rejected() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    let result = viewer.set_slice_position(Orientation::Axial, 1.5);
    assert!(matches!(result, Err(MprError::InvalidSlicePosition(_))));
    assert_relative_eq!(viewer.slice_position(Orientation::Axial), 0.5);
}

#[test]
fn test_slice_positions_survive_layout_switches() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    viewer.set_slice_position(Orientation::Sagittal, 0.25).unwrap();

    viewer.switch_layout(LayoutKind::Single);
    viewer.run_until_idle();
    viewer.switch_layout(LayoutKind::Quad);
    viewer.run_until_idle();

    assert_relative_eq!(viewer.slice_position(Orientation::Sagittal), 0.25);
    assert_eq!(
        viewer.displayed_image(ViewportName::Sagittal).unwrap().image_id,
        "vol:sagittal:64"
    );
}

#[test]
fn test_rebuild_leaves_current_slices_untouched() {
    let mut viewer = common::started_with_volume(LayoutKind::Quad, 1);
    let axial = viewer.get_viewport(ViewportName::Axial).unwrap();
    let renders = viewer.backend().surface(axial).unwrap().render_count;

    assert_eq!(viewer.rebuild_mpr(), 3);
    assert_eq!(viewer.backend().surface(axial).unwrap().render_count, renders);
}

#[test]
fn test_positioning_without_volume_fails() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    let result = viewer.set_slice_position(Orientation::Axial, 0.3);
    assert!(matches!(result, Err(MprError::NoVolume)));
    assert_eq!(viewer.rebuild_mpr(), 0);
}

#[test]
fn test_mpr_rebuild_can_be_disabled() {
    let mut config = common::config(LayoutKind::Quad);
    config.mpr_enabled = false;
    let images = common::series(1);
    let backend = common::backend(&images);
    let session = mpr_core::session::SeriesSession::new(vec![images[0].0.clone()]);
    let mut viewer = mpr_core::Viewer::new(backend, Box::new(session), config)
        .with_volume(common::volume());
    viewer.start();
    viewer.run_until_idle();
    assert!(viewer.displayed_image(ViewportName::Axial).is_none());
}

// ---------------------------------------------------------------------------
// Stack panes
// ---------------------------------------------------------------------------

#[test]
fn test_wheel_on_primary_pane_steps_session() {
    let mut viewer = common::started(LayoutKind::Quad, 3);
    let state = VisualState {
        scale: 2.0,
        ..VisualState::default()
    };
    viewer.apply_visual_state(ViewportName::Original, &state).unwrap();

    viewer.on_wheel(ViewportName::Original, 1.0).unwrap();
    assert_eq!(
        viewer.displayed_image(ViewportName::Original).unwrap().image_id,
        "series:1"
    );
    assert_relative_eq!(viewer.visual_state(ViewportName::Original).unwrap().scale, 2.0);

    viewer.on_wheel(ViewportName::Original, 1.0).unwrap();
    viewer.on_wheel(ViewportName::Original, 1.0).unwrap();
    assert_eq!(
        viewer.displayed_image(ViewportName::Original).unwrap().image_id,
        "series:2"
    );
}

#[test]
fn test_wheel_on_single_image_series_is_a_no_op() {
    let mut viewer = common::started(LayoutKind::Single, 1);
    viewer.on_wheel(ViewportName::Main, 1.0).unwrap();
    assert_eq!(
        viewer.displayed_image(ViewportName::Main).unwrap().image_id,
        "series:0"
    );
}

#[test]
fn test_wheel_outside_layout_is_an_error() {
    let mut viewer = common::started(LayoutKind::Dual, 1);
    let result = viewer.on_wheel(ViewportName::Axial, 1.0);
    assert!(matches!(result, Err(MprError::ViewportNotInLayout(_))));
}
