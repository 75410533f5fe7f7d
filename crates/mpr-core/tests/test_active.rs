mod common;

use mpr_core::render::{FrameStyle, MemoryBackend, RenderBackend, SurfaceId};
use mpr_core::{LayoutKind, MprError, Viewer, ViewerEvent, ViewportName};

fn active_count(viewer: &Viewer<MemoryBackend>) -> usize {
    viewer.viewports().iter().filter(|v| v.is_active).count()
}

#[test]
fn test_default_focus_after_start() {
    let viewer = common::started(LayoutKind::Quad, 1);
    let focus = viewer.focus().unwrap();
    assert_eq!(focus.name, ViewportName::Original);
    assert_eq!(viewer.stats().active, Some(ViewportName::Original));
    assert_eq!(active_count(&viewer), 1);
}

#[test]
fn test_at_most_one_active_viewport() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    for surface in viewer.get_all_viewports() {
        viewer.set_active_viewport(surface).unwrap();
        assert_eq!(active_count(&viewer), 1);
        assert_eq!(viewer.focus().unwrap().surface, surface);
    }
    for surface in viewer.get_all_viewports().into_iter().rev() {
        viewer.set_active_viewport(surface).unwrap();
        assert_eq!(active_count(&viewer), 1);
    }
}

#[test]
fn test_frame_styles_follow_focus() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    let sagittal = viewer.get_viewport(ViewportName::Sagittal).unwrap();
    viewer.set_active_viewport(sagittal).unwrap();

    for viewport in viewer.viewports() {
        let style = viewer.backend().surface(viewport.surface).unwrap().style;
        if viewport.surface == sagittal {
            assert_eq!(style, Some(FrameStyle::Active));
        } else {
            assert_eq!(style, Some(FrameStyle::Idle(viewport.role())));
        }
    }
}

#[test]
fn test_unknown_surface_is_rejected() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    let before = viewer.focus();
    let result = viewer.set_active_viewport(SurfaceId(9_999));
    assert!(matches!(result, Err(MprError::UnknownViewport(_))));
    assert_eq!(viewer.focus(), before);
}

#[test]
fn test_lost_context_is_re_enabled_once() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    let coronal = viewer.get_viewport(ViewportName::Coronal).unwrap();
    viewer.backend_mut().disable(coronal);
    assert!(!viewer.backend().is_enabled(coronal));

    viewer.set_active_viewport(coronal).unwrap();
    assert!(viewer.backend().is_enabled(coronal));
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Coronal);
}

#[test]
fn test_activation_is_announced() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    let events = viewer.subscribe();
    viewer.activate_viewport(ViewportName::Axial).unwrap();

    let axial = viewer.get_viewport(ViewportName::Axial).unwrap();
    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![ViewerEvent::ActiveViewportChanged {
            name: ViewportName::Axial,
            surface: axial
        }]
    );
}

// ---------------------------------------------------------------------------
// Focus across layout switches
// ---------------------------------------------------------------------------

#[test]
fn test_focus_maps_through_aliases() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    viewer.activate_viewport(ViewportName::Axial).unwrap();

    viewer.switch_layout(LayoutKind::Dual);
    viewer.run_until_idle();
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Right);
    assert_eq!(active_count(&viewer), 1);

    viewer.switch_layout(LayoutKind::Single);
    viewer.run_until_idle();
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Main);

    viewer.switch_layout(LayoutKind::Quad);
    viewer.run_until_idle();
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Original);
    assert_eq!(active_count(&viewer), 1);
}

#[test]
fn test_focus_is_cleared_during_teardown() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    viewer.switch_layout(LayoutKind::Single);
    assert!(viewer.focus().is_none());
    viewer.run_until_idle();
    assert!(viewer.focus().is_some());
}

#[test]
fn test_focus_falls_back_when_match_is_inert() {
    let mut viewer = common::started(LayoutKind::Quad, 1);
    viewer.activate_viewport(ViewportName::Axial).unwrap();
    viewer
        .backend_mut()
        .inject_fault("right", mpr_core::render::Fault::enable_always_fails());

    viewer.switch_layout(LayoutKind::Dual);
    viewer.run_until_idle();
    assert_eq!(viewer.focus().unwrap().name, ViewportName::Left);
}
