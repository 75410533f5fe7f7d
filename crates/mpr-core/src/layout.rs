use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MprError;
use crate::viewport::{Orientation, ViewportName};

/// Named grid topology. Text form is `cols x rows`, matching the layout buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutKind {
    #[serde(rename = "1x1")]
    Single,
    #[serde(rename = "2x1")]
    Dual,
    #[serde(rename = "1x2")]
    Stacked,
    #[default]
    #[serde(rename = "2x2")]
    Quad,
}

/// Immutable description of one layout in the catalog.
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    pub kind: LayoutKind,
    pub rows: usize,
    pub cols: usize,
    /// Viewports in grid order (row-major).
    pub viewports: &'static [ViewportName],
}

const SINGLE: Layout = Layout {
    kind: LayoutKind::Single,
    rows: 1,
    cols: 1,
    viewports: &[ViewportName::Main],
};

const DUAL: Layout = Layout {
    kind: LayoutKind::Dual,
    rows: 1,
    cols: 2,
    viewports: &[ViewportName::Left, ViewportName::Right],
};

const STACKED: Layout = Layout {
    kind: LayoutKind::Stacked,
    rows: 2,
    cols: 1,
    viewports: &[ViewportName::Top, ViewportName::Bottom],
};

const QUAD: Layout = Layout {
    kind: LayoutKind::Quad,
    rows: 2,
    cols: 2,
    viewports: &[
        ViewportName::Original,
        ViewportName::Sagittal,
        ViewportName::Coronal,
        ViewportName::Axial,
    ],
};

impl LayoutKind {
    pub const ALL: [LayoutKind; 4] = [Self::Single, Self::Dual, Self::Stacked, Self::Quad];

    pub fn layout(self) -> &'static Layout {
        match self {
            Self::Single => &SINGLE,
            Self::Dual => &DUAL,
            Self::Stacked => &STACKED,
            Self::Quad => &QUAD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "1x1",
            Self::Dual => "2x1",
            Self::Stacked => "1x2",
            Self::Quad => "2x2",
        }
    }

    pub fn viewports(self) -> &'static [ViewportName] {
        self.layout().viewports
    }

    pub fn contains(self, name: ViewportName) -> bool {
        self.viewports().contains(&name)
    }

    pub fn is_multi_pane(self) -> bool {
        self.viewports().len() > 1
    }

    /// First viewport of the layout; the fallback focus target.
    pub fn first_viewport(self) -> ViewportName {
        self.viewports()[0]
    }

    /// First viewport with the primary role, used for the fallback image load.
    pub fn first_primary(self) -> Option<ViewportName> {
        self.viewports()
            .iter()
            .copied()
            .find(|name| name.role().is_primary())
    }

    /// Viewport focused automatically once enabled, when nothing else is.
    pub fn default_focus(self) -> ViewportName {
        if self.contains(ViewportName::Original) {
            ViewportName::Original
        } else {
            self.first_viewport()
        }
    }

    pub fn orientations(self) -> impl Iterator<Item = Orientation> {
        self.viewports()
            .iter()
            .filter_map(|name| name.role().orientation())
    }

    pub fn has_mpr_panes(self) -> bool {
        self.orientations().next().is_some()
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = MprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MprError::UnknownLayout(s.to_string()))
    }
}
