//! Grid configuration value objects.
//!
//! A [`GridConfig`] replaces the track and item arrays of a grid wholesale.
//! It deserializes from the JSON shape used by embedding systems:
//!
//! ```json
//! {
//!   "cols": [{ "stretch": 1, "resizable": "none", "minSize": 20 }],
//!   "rows": [{ "stretch": 0, "resizable": { "initial": 40, "isPercent": true } }],
//!   "items": [{ "occupant": { "element": "chart" }, "rowSpan": 1, "colSpan": 1 }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, AxisPair};
use crate::error::ConfigError;
use crate::item::OccupantId;

/// How a track reacts to the resize handles next to it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ResizableRepr", into = "ResizableRepr")]
pub enum Resizable {
    /// No handle is drawn next to this track.
    #[default]
    None,
    /// Handles are drawn; the track starts at its content size.
    Auto,
    /// Handles are drawn; the track starts at a declared size.
    Initial {
        /// Pixels, or percent of the distributable size
        size: f32,
        /// Whether `size` is a percentage
        is_percent: bool,
    },
}

impl Resizable {
    /// Whether handles may be drawn next to this track.
    pub const fn is_resizable(self) -> bool {
        !matches!(self, Self::None)
    }

    /// The declared initial size resolved against `content_size`, if any.
    pub fn initial_size(self, content_size: f32) -> Option<f32> {
        match self {
            Self::Initial { size, is_percent } if is_percent => Some(content_size * size / 100.0),
            Self::Initial { size, .. } => Some(size),
            Self::None | Self::Auto => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ResizableRepr {
    Keyword(ResizableKeyword),
    Initial {
        initial: f32,
        #[serde(default, rename = "isPercent")]
        is_percent: bool,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResizableKeyword {
    None,
    Auto,
}

impl From<ResizableRepr> for Resizable {
    fn from(repr: ResizableRepr) -> Self {
        match repr {
            ResizableRepr::Keyword(ResizableKeyword::None) => Self::None,
            ResizableRepr::Keyword(ResizableKeyword::Auto) => Self::Auto,
            ResizableRepr::Initial {
                initial,
                is_percent,
            } => Self::Initial {
                size: initial,
                is_percent,
            },
        }
    }
}

impl From<Resizable> for ResizableRepr {
    fn from(resizable: Resizable) -> Self {
        match resizable {
            Resizable::None => Self::Keyword(ResizableKeyword::None),
            Resizable::Auto => Self::Keyword(ResizableKeyword::Auto),
            Resizable::Initial { size, is_percent } => Self::Initial {
                initial: size,
                is_percent,
            },
        }
    }
}

/// One row or column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackConfig {
    /// Weight for surplus/deficit distribution; 0 is not stretchable
    #[serde(default)]
    pub stretch: f32,
    /// Resize handle behavior
    #[serde(default)]
    pub resizable: Resizable,
    /// Floor for the track size regardless of content
    #[serde(default)]
    pub min_size: f32,
}

impl TrackConfig {
    /// A track with the given stretch factor.
    pub const fn new(stretch: f32) -> Self {
        Self {
            stretch,
            resizable: Resizable::None,
            min_size: 0.0,
        }
    }

    /// Set the declared minimum size.
    #[must_use]
    pub const fn with_min_size(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the resize behavior.
    #[must_use]
    pub const fn with_resizable(mut self, resizable: Resizable) -> Self {
        self.resizable = resizable;
        self
    }

    /// Whether surplus space flows into this track.
    pub fn is_stretchable(&self) -> bool {
        self.stretch > 0.0
    }
}

/// Spacing and sizing settings shared by all tracks of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisConfig {
    /// Gap between consecutive visible tracks
    pub spacing: f32,
    /// Space before the first visible track
    pub margin_start: f32,
    /// Space after the last visible track
    pub margin_end: f32,
    /// Upper bound for the total size; 0 is unconstrained
    pub max_total_size: f32,
    /// Grow the container to its content when no size is imposed
    pub fit_content: bool,
}

impl AxisConfig {
    /// Settings with the given spacing and margins.
    pub const fn new(spacing: f32, margin_start: f32, margin_end: f32) -> Self {
        Self {
            spacing,
            margin_start,
            margin_end,
            max_total_size: 0.0,
            fit_content: false,
        }
    }

    /// Size the container from its content.
    #[must_use]
    pub const fn fit_to_content(mut self, max_total_size: f32) -> Self {
        self.fit_content = true;
        self.max_total_size = max_total_size;
        self
    }
}

/// Alignment of an occupant inside its cell area along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Keep natural size, flush with the start edge
    Start,
    /// Keep natural size, centered
    Center,
    /// Keep natural size, flush with the end edge
    End,
    /// Fill the whole cell area
    #[default]
    Stretch,
}

/// Per-axis alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemAlign {
    /// Horizontal alignment
    #[serde(default, rename = "h")]
    pub horizontal: Alignment,
    /// Vertical alignment
    #[serde(default, rename = "v")]
    pub vertical: Alignment,
}

impl ItemAlign {
    /// Alignment along `axis`.
    pub const fn get(self, axis: Axis) -> Alignment {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }
}

/// What sits in a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OccupantRef {
    /// A leaf visual element
    Element(OccupantId),
    /// A nested grid, named by the container element backing it
    Grid(OccupantId),
}

impl OccupantRef {
    /// Identity of the occupant (element id or nested container id).
    pub const fn id(&self) -> &OccupantId {
        match self {
            Self::Element(id) | Self::Grid(id) => id,
        }
    }
}

const fn one() -> usize {
    1
}

const fn yes() -> bool {
    true
}

/// One cell occupant and the cells it spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConfig {
    /// Element or nested grid
    pub occupant: OccupantRef,
    /// Number of rows covered
    #[serde(default = "one")]
    pub row_span: usize,
    /// Number of columns covered
    #[serde(default = "one")]
    pub col_span: usize,
    /// Alignment inside the covered area
    #[serde(default)]
    pub align: ItemAlign,
    /// Total margin along each axis, split evenly between both edges
    #[serde(default)]
    pub margin: AxisPair<f32>,
    /// User-set preferred sizes that override smaller natural sizes
    #[serde(default)]
    pub size_hint: AxisPair<Option<f32>>,
    /// Whether a nested grid reports its preferred size to this grid
    #[serde(default = "yes")]
    pub propagate: bool,
}

impl ItemConfig {
    fn with_occupant(occupant: OccupantRef) -> Self {
        Self {
            occupant,
            row_span: 1,
            col_span: 1,
            align: ItemAlign::default(),
            margin: AxisPair::default(),
            size_hint: AxisPair::default(),
            propagate: true,
        }
    }

    /// A leaf element occupying a single cell.
    pub fn element(id: impl Into<OccupantId>) -> Self {
        Self::with_occupant(OccupantRef::Element(id.into()))
    }

    /// A nested grid occupying a single cell.
    pub fn grid(container: impl Into<OccupantId>) -> Self {
        Self::with_occupant(OccupantRef::Grid(container.into()))
    }

    /// Cover `row_span` rows and `col_span` columns.
    #[must_use]
    pub const fn span(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = row_span;
        self.col_span = col_span;
        self
    }

    /// Set the per-axis alignment.
    #[must_use]
    pub const fn aligned(mut self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.align = ItemAlign { horizontal, vertical };
        self
    }

    /// Set the per-axis margins.
    #[must_use]
    pub const fn with_margin(mut self, horizontal: f32, vertical: f32) -> Self {
        self.margin = AxisPair::new(horizontal, vertical);
        self
    }

    /// Set a user preferred size along `axis`.
    #[must_use]
    pub fn with_size_hint(mut self, axis: Axis, size: f32) -> Self {
        self.size_hint.set(axis, Some(size));
        self
    }

    /// Stop a nested grid from reporting its size upward.
    #[must_use]
    pub const fn without_propagation(mut self) -> Self {
        self.propagate = false;
        self
    }

    /// Span along `axis` (columns for horizontal, rows for vertical).
    pub const fn span_along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.col_span,
            Axis::Vertical => self.row_span,
        }
    }
}

/// Full configuration of one grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    /// Column tracks
    pub cols: Vec<TrackConfig>,
    /// Row tracks
    pub rows: Vec<TrackConfig>,
    /// Row-major slots, one per cell; `None` for empty or spanned-over cells
    #[serde(default)]
    pub items: Vec<Option<ItemConfig>>,
    /// Column spacing and margins
    #[serde(default)]
    pub horizontal: AxisConfig,
    /// Row spacing and margins
    #[serde(default)]
    pub vertical: AxisConfig,
    /// Extent of a drawn resize handle, added to the spacing where one sits
    #[serde(default)]
    pub handle_size: f32,
    /// Place columns right to left
    #[serde(default)]
    pub mirrored: bool,
}

impl GridConfig {
    /// A configuration with the given tracks and row-major items.
    pub const fn new(cols: Vec<TrackConfig>, rows: Vec<TrackConfig>, items: Vec<Option<ItemConfig>>) -> Self {
        Self {
            cols,
            rows,
            items,
            horizontal: AxisConfig::new(0.0, 0.0, 0.0),
            vertical: AxisConfig::new(0.0, 0.0, 0.0),
            handle_size: 0.0,
            mirrored: false,
        }
    }

    /// Replace the settings for `axis`.
    #[must_use]
    pub const fn with_axis(mut self, axis: Axis, settings: AxisConfig) -> Self {
        match axis {
            Axis::Horizontal => self.horizontal = settings,
            Axis::Vertical => self.vertical = settings,
        }
        self
    }

    /// Set the resize handle extent.
    #[must_use]
    pub const fn with_handle_size(mut self, handle_size: f32) -> Self {
        self.handle_size = handle_size;
        self
    }

    /// Place columns right to left.
    #[must_use]
    pub const fn mirrored(mut self) -> Self {
        self.mirrored = true;
        self
    }

    /// Tracks along `axis`.
    pub fn tracks(&self, axis: Axis) -> &[TrackConfig] {
        match axis {
            Axis::Horizontal => &self.cols,
            Axis::Vertical => &self.rows,
        }
    }

    /// Settings for `axis`.
    pub const fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }

    /// Containers of the nested grids this configuration references.
    pub fn nested_containers(&self) -> impl Iterator<Item = &OccupantId> {
        self.items.iter().flatten().filter_map(|item| match &item.occupant {
            OccupantRef::Grid(container) => Some(container),
            OccupantRef::Element(_) => None,
        })
    }

    /// Check every condition that cannot be resolved heuristically.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found: wrong slot count, bad spans,
    /// overlapping items, or negative/non-finite sizes and stretch factors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for axis in Axis::BOTH {
            validate_axis(axis, self.tracks(axis), self.axis(axis))?;
        }
        check_size("handle size", self.handle_size)?;

        let row_count = self.rows.len();
        let col_count = self.cols.len();
        let expected = row_count * col_count;
        if self.items.len() != expected {
            return Err(ConfigError::ItemCount {
                expected,
                found: self.items.len(),
            });
        }

        let mut claimed = vec![false; expected];
        for (slot, item) in self.items.iter().enumerate() {
            let Some(item) = item else { continue };
            let row = slot / col_count;
            let col = slot % col_count;
            if item.row_span == 0 || item.col_span == 0 {
                return Err(ConfigError::ZeroSpan { row, col });
            }
            let row_overflow = row.checked_add(item.row_span).is_none_or(|end| end > row_count);
            let col_overflow = col.checked_add(item.col_span).is_none_or(|end| end > col_count);
            if row_overflow || col_overflow {
                return Err(ConfigError::SpanOutOfBounds {
                    row,
                    col,
                    row_span: item.row_span,
                    col_span: item.col_span,
                });
            }
            for cell_row in row..row + item.row_span {
                for cell_col in col..col + item.col_span {
                    let cell = cell_row * col_count + cell_col;
                    let spanned_over_occupied = cell != slot && self.items.get(cell).is_some_and(Option::is_some);
                    let Some(flag) = claimed.get_mut(cell) else { continue };
                    if *flag || spanned_over_occupied {
                        return Err(ConfigError::OverlappingItems {
                            row: cell_row,
                            col: cell_col,
                        });
                    }
                    *flag = true;
                }
            }
            for axis in Axis::BOTH {
                check_size("item margin", item.margin.value(axis))?;
                if let Some(hint) = item.size_hint.value(axis) {
                    check_size("size hint", hint)?;
                }
            }
        }
        Ok(())
    }
}

fn validate_axis(axis: Axis, tracks: &[TrackConfig], settings: &AxisConfig) -> Result<(), ConfigError> {
    check_size("spacing", settings.spacing)?;
    check_size("start margin", settings.margin_start)?;
    check_size("end margin", settings.margin_end)?;
    check_size("maximum total size", settings.max_total_size)?;
    for (track, config) in tracks.iter().enumerate() {
        if !config.stretch.is_finite() || config.stretch < 0.0 {
            return Err(ConfigError::InvalidStretch {
                axis,
                track,
                value: config.stretch,
            });
        }
        check_size("track minimum size", config.min_size)?;
        if let Resizable::Initial { size, is_percent } = config.resizable {
            if is_percent && !(0.0..=100.0).contains(&size) {
                return Err(ConfigError::InvalidPercent {
                    axis,
                    track,
                    value: size,
                });
            }
            check_size("initial track size", size)?;
        }
    }
    Ok(())
}

fn check_size(what: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSize { what, value })
    }
}
