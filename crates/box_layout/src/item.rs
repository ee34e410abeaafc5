//! Item model: one grid cell's occupant and its cached measurements.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, AxisPair};
use crate::config::{ItemAlign, ItemConfig, OccupantRef};
use crate::scheduler::GridId;

/// Opaque identity of a visual element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccupantId(String);

impl OccupantId {
    /// Wrap an element id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OccupantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for OccupantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OccupantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        formatter.write_str(&self.0)
    }
}

/// How much of an item must be re-measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DirtyLevel {
    /// Cached sizes are current.
    #[default]
    Clean = 0,
    /// Preferred size must be re-read; the cached minimum stays.
    SizeOnly = 1,
    /// Everything must be re-read.
    Full = 2,
}

/// The thing placed in a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupant {
    /// A leaf element sized through the measurement provider.
    Leaf(OccupantId),
    /// A nested grid backed by `container`.
    Nested {
        /// Container element of the nested grid
        container: OccupantId,
        /// The registered instance, once linked by the scheduler
        grid: Option<GridId>,
        /// Whether the nested grid reports its size upward
        propagate: bool,
    },
}

impl Occupant {
    /// Element id of the occupant (the container for nested grids).
    pub const fn id(&self) -> &OccupantId {
        match self {
            Self::Leaf(id) | Self::Nested { container: id, .. } => id,
        }
    }

    /// The linked nested instance, if any.
    pub const fn nested_grid(&self) -> Option<GridId> {
        match self {
            Self::Nested { grid, .. } => *grid,
            Self::Leaf(_) => None,
        }
    }

    fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Leaf(left), Self::Leaf(right)) => left == right,
            (Self::Nested { container: left, .. }, Self::Nested { container: right, .. }) => left == right,
            _ => false,
        }
    }
}

/// Resolved box of an item inside its grid's container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemBox {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset
    pub y: f32,
    /// Resolved width
    pub width: f32,
    /// Resolved height
    pub height: f32,
}

/// One grid cell's occupant.
#[derive(Debug, Clone)]
pub struct ItemModel {
    pub(crate) occupant: Occupant,
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) span: AxisPair<usize>,
    pub(crate) align: ItemAlign,
    pub(crate) margin: AxisPair<f32>,
    pub(crate) size_hint: AxisPair<Option<f32>>,
    pub(crate) dirty: AxisPair<DirtyLevel>,
    pub(crate) preferred: AxisPair<f32>,
    pub(crate) minimum: AxisPair<f32>,
    pub(crate) minimum_known: AxisPair<bool>,
    /// Natural content size without margin.
    pub(crate) natural: AxisPair<f32>,
    pub(crate) has_override_set: AxisPair<bool>,
    /// Totals last reported by a nested grid: (preferred, minimum).
    pub(crate) nested_totals: AxisPair<Option<(f32, f32)>>,
    /// Size last pushed down to a nested grid.
    pub(crate) imposed: AxisPair<Option<f32>>,
    pub(crate) stretched: AxisPair<bool>,
    pub(crate) hidden: bool,
    /// Offset and size from the last apply.
    pub(crate) placed: AxisPair<Option<(f32, f32)>>,
}

impl ItemModel {
    /// Build an item at (`row`, `col`) from its configuration; it starts fully dirty.
    pub fn from_config(config: &ItemConfig, row: usize, col: usize) -> Self {
        let occupant = match &config.occupant {
            OccupantRef::Element(id) => Occupant::Leaf(id.clone()),
            OccupantRef::Grid(container) => Occupant::Nested {
                container: container.clone(),
                grid: None,
                propagate: config.propagate,
            },
        };
        Self {
            occupant,
            row,
            col,
            span: AxisPair::new(config.col_span, config.row_span),
            align: config.align,
            margin: config.margin,
            size_hint: config.size_hint,
            dirty: AxisPair::splat(DirtyLevel::Full),
            preferred: AxisPair::splat(0.0),
            minimum: AxisPair::splat(0.0),
            minimum_known: AxisPair::splat(false),
            natural: AxisPair::splat(0.0),
            has_override_set: AxisPair::splat(false),
            nested_totals: AxisPair::splat(None),
            imposed: AxisPair::splat(None),
            stretched: AxisPair::splat(false),
            hidden: false,
            placed: AxisPair::splat(None),
        }
    }

    /// The occupant.
    pub const fn occupant(&self) -> &Occupant {
        &self.occupant
    }

    /// Element id of the occupant.
    pub const fn id(&self) -> &OccupantId {
        self.occupant.id()
    }

    /// First track covered along `axis`.
    pub const fn start(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.col,
            Axis::Vertical => self.row,
        }
    }

    /// Number of tracks covered along `axis`.
    pub const fn span(&self, axis: Axis) -> usize {
        self.span.value(axis)
    }

    /// Whether track `track` along `axis` is covered by this item.
    pub const fn covers(&self, axis: Axis, track: usize) -> bool {
        let start = self.start(axis);
        track >= start && track < start + self.span(axis)
    }

    /// Cached preferred size along `axis`, margin included.
    pub const fn preferred(&self, axis: Axis) -> f32 {
        self.preferred.value(axis)
    }

    /// Cached minimum size along `axis`, margin included.
    pub const fn minimum(&self, axis: Axis) -> f32 {
        self.minimum.value(axis)
    }

    /// Pending dirty level along `axis`.
    pub const fn dirty_level(&self, axis: Axis) -> DirtyLevel {
        self.dirty.value(axis)
    }

    /// Whether the solver currently overrides the occupant's size along `axis`.
    pub const fn has_override_set(&self, axis: Axis) -> bool {
        self.has_override_set.value(axis)
    }

    /// Whether the occupant was hidden at the last measure.
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether this item is measured from a linked nested grid's reports.
    pub const fn is_laid_out_as_nested_grid(&self) -> bool {
        matches!(
            self.occupant,
            Occupant::Nested {
                grid: Some(_),
                propagate: true,
                ..
            }
        )
    }

    /// Raise the dirty level on both axes. Never lowers it.
    pub fn mark_dirty(&mut self, level: DirtyLevel) {
        for axis in Axis::BOTH {
            self.mark_dirty_along(axis, level);
        }
    }

    /// Raise the dirty level along `axis`. Never lowers it.
    pub fn mark_dirty_along(&mut self, axis: Axis, level: DirtyLevel) {
        let current = self.dirty.get_mut(axis);
        *current = (*current).max(level);
    }

    /// Consume the dirty level along `axis`.
    pub(crate) fn take_dirty(&mut self, axis: Axis) -> DirtyLevel {
        let level = self.dirty.value(axis);
        self.dirty.set(axis, DirtyLevel::Clean);
        level
    }

    /// Carry cached measurements over from the previous item with the same occupant.
    pub(crate) fn inherit(&mut self, previous: Self) {
        self.preferred = previous.preferred;
        self.minimum = previous.minimum;
        self.minimum_known = previous.minimum_known;
        self.natural = previous.natural;
        self.has_override_set = previous.has_override_set;
        self.nested_totals = previous.nested_totals;
        self.imposed = previous.imposed;
        if let (
            Occupant::Nested { grid, .. },
            Occupant::Nested {
                grid: previous_grid, ..
            },
        ) = (&mut self.occupant, previous.occupant)
        {
            *grid = previous_grid;
        }
        self.dirty = previous.dirty;
        self.mark_dirty(DirtyLevel::SizeOnly);
    }

    pub(crate) fn same_identity(&self, other: &Self) -> bool {
        self.occupant.same_identity(&other.occupant)
    }

    pub(crate) fn link_grid(&mut self, linked: Option<GridId>) {
        if let Occupant::Nested { grid, .. } = &mut self.occupant {
            *grid = linked;
            self.nested_totals = AxisPair::splat(None);
            self.mark_dirty(DirtyLevel::SizeOnly);
        }
    }

    /// Resolved box from the last apply on both axes.
    pub fn resolved_box(&self) -> Option<ItemBox> {
        let (x, width) = self.placed.horizontal?;
        let (y, height) = self.placed.vertical?;
        Some(ItemBox { x, y, width, height })
    }
}
