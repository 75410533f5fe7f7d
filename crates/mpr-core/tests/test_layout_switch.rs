mod common;

use std::time::Duration;

use approx::assert_relative_eq;

use mpr_core::render::{Fault, MemoryBackend};
use mpr_core::session::{SeriesSession, SessionProvider};
use mpr_core::{LayoutKind, Viewer, ViewportName, VisualState};

use common::image;

fn zoomed() -> VisualState {
    VisualState {
        scale: 2.0,
        rotation: 90.0,
        invert: true,
        ..VisualState::default()
    }
}

fn assert_visual_eq(actual: &VisualState, expected: &VisualState) {
    assert_relative_eq!(actual.scale, expected.scale);
    assert_relative_eq!(actual.rotation, expected.rotation);
    assert_relative_eq!(actual.translation_x, expected.translation_x);
    assert_relative_eq!(actual.translation_y, expected.translation_y);
    assert_relative_eq!(actual.window_width, expected.window_width);
    assert_relative_eq!(actual.window_center, expected.window_center);
    assert_eq!(actual.invert, expected.invert);
    assert_eq!(actual.hflip, expected.hflip);
    assert_eq!(actual.vflip, expected.vflip);
}

/// Quad viewer with a distinct image in every pane.
fn populated_quad() -> Viewer<MemoryBackend> {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    for name in ["axial", "sagittal", "coronal"] {
        let pane: ViewportName = name.parse().unwrap();
        viewer.load_image(pane, &image(name)).unwrap();
    }
    viewer
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn test_switch_to_current_layout_is_a_no_op() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    let created = viewer.backend().created_count();
    let destroyed = viewer.backend().destroyed_count();
    let focus = viewer.focus();
    let surfaces = viewer.get_all_viewports();

    assert!(viewer.switch_layout(LayoutKind::Quad));
    assert_eq!(viewer.pending_tasks(), 0);
    viewer.run_until_idle();

    assert_eq!(viewer.backend().created_count(), created);
    assert_eq!(viewer.backend().destroyed_count(), destroyed);
    assert_eq!(viewer.focus(), focus);
    assert_eq!(viewer.get_all_viewports(), surfaces);
}

#[test]
fn test_unknown_layout_name_is_rejected() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    assert!(!viewer.switch_layout_named("4x4"));
    assert_eq!(viewer.layout(), Some(LayoutKind::Quad));
}

// ---------------------------------------------------------------------------
// State preservation
// ---------------------------------------------------------------------------

#[test]
fn test_visual_state_round_trips_through_single_pane() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    let original = viewer.displayed_image(ViewportName::Original).unwrap();
    viewer
        .apply_visual_state(ViewportName::Original, &zoomed())
        .unwrap();

    assert!(viewer.switch_layout(LayoutKind::Single));
    viewer.run_until_idle();
    assert_eq!(viewer.displayed_image(ViewportName::Main), Some(original.clone()));
    assert_visual_eq(&viewer.visual_state(ViewportName::Main).unwrap(), &zoomed());

    assert!(viewer.switch_layout(LayoutKind::Quad));
    viewer.run_until_idle();
    assert_eq!(viewer.displayed_image(ViewportName::Original), Some(original));
    assert_visual_eq(
        &viewer.visual_state(ViewportName::Original).unwrap(),
        &zoomed(),
    );
}

#[test]
fn test_quad_to_dual_maps_original_and_axial() {
    let mut viewer = populated_quad();
    viewer.switch_layout(LayoutKind::Dual);
    viewer.run_until_idle();

    assert_eq!(
        viewer.displayed_image(ViewportName::Left).unwrap().image_id,
        "series:0"
    );
    assert_eq!(
        viewer.displayed_image(ViewportName::Right).unwrap().image_id,
        "axial"
    );
}

#[test]
fn test_quad_to_stacked_maps_original_and_axial() {
    let mut viewer = populated_quad();
    viewer.switch_layout(LayoutKind::Stacked);
    viewer.run_until_idle();

    assert_eq!(
        viewer.displayed_image(ViewportName::Top).unwrap().image_id,
        "series:0"
    );
    assert_eq!(
        viewer.displayed_image(ViewportName::Bottom).unwrap().image_id,
        "axial"
    );
}

#[test]
fn test_dual_right_falls_back_to_sagittal() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    viewer
        .load_image(ViewportName::Sagittal, &image("sagittal"))
        .unwrap();
    viewer.switch_layout(LayoutKind::Dual);
    viewer.run_until_idle();
    assert_eq!(
        viewer.displayed_image(ViewportName::Right).unwrap().image_id,
        "sagittal"
    );
}

#[test]
fn test_restoration_waits_for_restore_delay() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    viewer.switch_layout(LayoutKind::Single);

    viewer.advance(Duration::from_millis(100));
    assert!(viewer.get_viewport(ViewportName::Main).is_some());
    assert!(viewer.displayed_image(ViewportName::Main).is_none());

    viewer.advance(Duration::from_millis(100));
    assert!(viewer.displayed_image(ViewportName::Main).is_some());
}

#[test]
fn test_restoration_retries_a_late_viewport() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    // Enable succeeds on the second try (50 + 200 ms), after the restore pass.
    viewer.backend_mut().inject_fault(
        "main",
        Fault {
            enable_failures: 1,
            ..Fault::default()
        },
    );
    viewer.switch_layout(LayoutKind::Single);
    viewer.advance(Duration::from_millis(200));
    assert!(viewer.displayed_image(ViewportName::Main).is_none());

    viewer.run_until_idle();
    assert_eq!(
        viewer.displayed_image(ViewportName::Main).unwrap().image_id,
        "series:0"
    );
}

#[test]
fn test_slowly_enabled_viewport_receives_image_and_transform() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    viewer
        .apply_visual_state(ViewportName::Original, &zoomed())
        .unwrap();
    // Enabled on the fourth try (50 + 200 + 400 + 600 ms), long after the
    // restore pass ran out of its own retries.
    viewer.backend_mut().inject_fault(
        "main",
        Fault {
            enable_failures: 3,
            ..Fault::default()
        },
    );
    viewer.switch_layout(LayoutKind::Single);
    viewer.advance(Duration::from_millis(1000));
    assert!(viewer.get_viewport(ViewportName::Main).is_none());

    viewer.run_until_idle();
    assert_eq!(
        viewer.displayed_image(ViewportName::Main).unwrap().image_id,
        "series:0"
    );
    assert_visual_eq(&viewer.visual_state(ViewportName::Main).unwrap(), &zoomed());
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Main);
    assert_eq!(viewer.stats().inert, 0);
}

#[test]
fn test_failed_restoration_does_not_block_siblings() {
    let mut viewer = populated_quad();
    viewer.backend_mut().inject_fault(
        "right",
        Fault {
            fail_display: true,
            ..Fault::default()
        },
    );
    viewer.switch_layout(LayoutKind::Dual);
    viewer.run_until_idle();

    assert!(viewer.displayed_image(ViewportName::Right).is_none());
    assert_eq!(
        viewer.displayed_image(ViewportName::Left).unwrap().image_id,
        "series:0"
    );
    assert!(viewer.focus().is_some());
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn test_second_switch_cancels_pending_restoration() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    viewer
        .apply_visual_state(ViewportName::Original, &zoomed())
        .unwrap();

    viewer.switch_layout(LayoutKind::Single);
    viewer.advance(Duration::from_millis(60));
    let main = viewer.get_viewport(ViewportName::Main).unwrap();

    viewer.switch_layout(LayoutKind::Dual);
    viewer.run_until_idle();

    // The single-pane surface is gone and was never restored into.
    assert!(viewer.backend().surface(main).is_none());
    assert_eq!(viewer.layout(), Some(LayoutKind::Dual));
    assert_eq!(
        viewer.displayed_image(ViewportName::Left).unwrap().image_id,
        "series:0"
    );
    assert_visual_eq(&viewer.visual_state(ViewportName::Left).unwrap(), &zoomed());
    assert_eq!(viewer.pending_tasks(), 0);
}

// ---------------------------------------------------------------------------
// Double-click toggle
// ---------------------------------------------------------------------------

#[test]
fn test_double_click_expands_and_collapses() {
    let mut viewer = populated_quad();
    let axial_state = VisualState {
        scale: 1.5,
        rotation: 180.0,
        ..VisualState::default()
    };
    viewer
        .apply_visual_state(ViewportName::Axial, &axial_state)
        .unwrap();
    let before: Vec<_> = LayoutKind::Quad
        .viewports()
        .iter()
        .map(|name| viewer.displayed_image(*name))
        .collect();

    assert!(viewer.double_click(ViewportName::Axial));
    viewer.run_until_idle();
    assert_eq!(viewer.layout(), Some(LayoutKind::Single));
    assert_eq!(
        viewer.displayed_image(ViewportName::Main).unwrap().image_id,
        "axial"
    );
    assert_visual_eq(&viewer.visual_state(ViewportName::Main).unwrap(), &axial_state);
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Main);

    assert!(viewer.double_click(ViewportName::Main));
    viewer.run_until_idle();
    assert_eq!(viewer.layout(), Some(LayoutKind::Quad));
    let after: Vec<_> = LayoutKind::Quad
        .viewports()
        .iter()
        .map(|name| viewer.displayed_image(*name))
        .collect();
    assert_eq!(after, before);
    assert_visual_eq(&viewer.visual_state(ViewportName::Axial).unwrap(), &axial_state);
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Axial);
}

#[test]
fn test_changes_in_single_pane_carry_back_to_expanded_viewport() {
    let mut viewer = populated_quad();
    viewer.double_click(ViewportName::Coronal);
    viewer.run_until_idle();
    viewer
        .apply_visual_state(ViewportName::Main, &zoomed())
        .unwrap();

    viewer.double_click(ViewportName::Main);
    viewer.run_until_idle();
    assert_visual_eq(&viewer.visual_state(ViewportName::Coronal).unwrap(), &zoomed());
    assert_visual_eq(
        &viewer.visual_state(ViewportName::Original).unwrap(),
        &VisualState::default(),
    );
}

#[test]
fn test_double_click_returns_to_dual() {
    let mut viewer = common::started(LayoutKind::Dual, 1);
    viewer.double_click(ViewportName::Left);
    viewer.run_until_idle();
    viewer.double_click(ViewportName::Main);
    viewer.run_until_idle();
    assert_eq!(viewer.layout(), Some(LayoutKind::Dual));
}

#[test]
fn test_double_click_during_restoration_keeps_unrestored_panes() {
    let mut viewer = populated_quad();
    viewer.switch_layout(LayoutKind::Dual);
    // Panes are enabled but the restore pass has not run yet.
    viewer.advance(Duration::from_millis(60));
    assert!(viewer.displayed_image(ViewportName::Right).is_none());

    assert!(viewer.double_click(ViewportName::Left));
    viewer.run_until_idle();
    assert!(viewer.double_click(ViewportName::Main));
    viewer.run_until_idle();

    assert_eq!(viewer.layout(), Some(LayoutKind::Dual));
    assert_eq!(
        viewer.displayed_image(ViewportName::Left).unwrap().image_id,
        "series:0"
    );
    assert_eq!(
        viewer.displayed_image(ViewportName::Right).unwrap().image_id,
        "axial"
    );
}

#[test]
fn test_double_click_on_missing_viewport_is_ignored() {
    let mut viewer = common::started(LayoutKind::Dual, 1);
    assert!(!viewer.double_click(ViewportName::Axial));
    assert_eq!(viewer.layout(), Some(LayoutKind::Dual));
}

// ---------------------------------------------------------------------------
// Session fallback and cine
// ---------------------------------------------------------------------------

#[test]
fn test_blank_layout_loads_current_session_image() {
    let viewer = common::started(LayoutKind::Quad, 3);
    assert_eq!(
        viewer.displayed_image(ViewportName::Original).unwrap().image_id,
        "series:0"
    );
    assert!(viewer.displayed_image(ViewportName::Axial).is_none());
}

#[test]
fn test_session_image_waits_for_slowly_enabled_primary_pane() {
    let mut viewer = common::viewer(LayoutKind::Single, 3);
    viewer.backend_mut().inject_fault(
        "main",
        Fault {
            enable_failures: 3,
            ..Fault::default()
        },
    );
    assert!(viewer.start());
    viewer.run_until_idle();

    assert_eq!(
        viewer.displayed_image(ViewportName::Main).unwrap().image_id,
        "series:0"
    );
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Main);
}

#[test]
fn test_inert_primary_pane_settles_without_image() {
    let mut viewer = common::viewer(LayoutKind::Single, 3);
    viewer
        .backend_mut()
        .inject_fault("main", Fault::enable_always_fails());
    assert!(viewer.start());
    viewer.run_until_idle();

    let stats = viewer.stats();
    assert_eq!(stats.inert, 1);
    assert_eq!(stats.with_images, 0);
    assert_eq!(viewer.pending_tasks(), 0);
}

#[test]
fn test_empty_session_leaves_panes_blank() {
    let backend = common::backend(&[]);
    let mut viewer = Viewer::new(
        backend,
        Box::new(SeriesSession::empty()),
        common::config(LayoutKind::Quad),
    );
    assert!(viewer.start());
    viewer.run_until_idle();
    assert_eq!(viewer.stats().with_images, 0);
    assert!(viewer.focus().is_some());
}

#[test]
fn test_cine_pauses_during_switch_and_resumes() {
    let images = common::series(3);
    let backend = common::backend(&images);
    let mut session = SeriesSession::new(images.into_iter().map(|(h, _)| h).collect());
    session.set_playing(true);
    let mut viewer = Viewer::new(backend, Box::new(session), common::config(LayoutKind::Quad));
    viewer.start();
    viewer.run_until_idle();
    assert!(viewer.session().is_playing());

    viewer.switch_layout(LayoutKind::Single);
    assert!(!viewer.session().is_playing());
    viewer.advance(Duration::from_millis(500));
    assert!(!viewer.session().is_playing());
    viewer.run_until_idle();
    assert!(viewer.session().is_playing());
}

#[test]
fn test_failed_switch_resumes_cine_and_keeps_state() {
    let images = common::series(3);
    let backend = common::backend(&images);
    let mut session = SeriesSession::new(images.into_iter().map(|(h, _)| h).collect());
    session.set_playing(true);
    let mut viewer = Viewer::new(backend, Box::new(session), common::config(LayoutKind::Quad));
    viewer.start();
    viewer.run_until_idle();
    viewer
        .apply_visual_state(ViewportName::Original, &zoomed())
        .unwrap();

    viewer.backend_mut().inject_fault(
        "main",
        Fault {
            fail_create: true,
            ..Fault::default()
        },
    );
    assert!(!viewer.switch_layout(LayoutKind::Single));
    assert!(viewer.session().is_playing());
    viewer.run_until_idle();
    assert!(viewer.session().is_playing());

    // The state captured before the failed switch is replayed by the next one.
    viewer.backend_mut().clear_fault("main");
    assert!(viewer.switch_layout(LayoutKind::Dual));
    viewer.run_until_idle();
    assert_eq!(
        viewer.displayed_image(ViewportName::Left).unwrap().image_id,
        "series:0"
    );
    assert_visual_eq(&viewer.visual_state(ViewportName::Left).unwrap(), &zoomed());
    assert!(viewer.session().is_playing());
}

#[test]
fn test_cine_stays_stopped_for_single_image() {
    let images = common::series(1);
    let backend = common::backend(&images);
    let mut session = SeriesSession::new(images.into_iter().map(|(h, _)| h).collect());
    session.set_playing(true);
    let mut viewer = Viewer::new(backend, Box::new(session), common::config(LayoutKind::Quad));
    viewer.start();
    viewer.run_until_idle();
    assert!(!viewer.session().is_playing());
}
