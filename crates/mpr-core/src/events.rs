use crate::layout::LayoutKind;
use crate::render::SurfaceId;
use crate::viewport::ViewportName;

/// Notifications emitted by the viewer to its subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    /// A surface was enabled and can receive pointer-control listeners.
    ViewportCreated {
        name: ViewportName,
        surface: SurfaceId,
        layout: LayoutKind,
    },
    LayoutChanged {
        from: Option<LayoutKind>,
        to: LayoutKind,
    },
    ActiveViewportChanged {
        name: ViewportName,
        surface: SurfaceId,
    },
    /// Enabling gave up; the pane stays blank for this layout.
    ViewportInert { name: ViewportName },
}
