//! Grid layout instance: two track models, the item slots, and the passes.

mod apply;
mod measure;
mod span;

use serde::Serialize;

use crate::axis::{Axis, AxisPair};
use crate::config::{GridConfig, OccupantRef};
use crate::error::ConfigError;
use crate::item::{DirtyLevel, ItemBox, ItemModel, OccupantId};
use crate::linkage::ParentLink;
use crate::provider::MeasurementProvider;
use crate::resize::ResizePreview;
use crate::scheduler::GridId;
use crate::track::TrackModel;

/// Parameters of one measure pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasurePass {
    /// Treat every item as fully dirty and report totals unconditionally.
    pub full: bool,
    /// Sequence number of the adjustment run.
    pub run: u64,
}

/// One grid placed on a container element.
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub(crate) container: OccupantId,
    pub(crate) config: GridConfig,
    pub(crate) tracks: AxisPair<TrackModel>,
    /// Row-major, one slot per cell.
    pub(crate) items: Vec<Option<ItemModel>>,
    pub(crate) parent: Option<ParentLink>,
    pub(crate) imposed: AxisPair<Option<f32>>,
    pub(crate) preview: Option<ResizePreview>,
    /// Run in which each axis was last measured.
    pub(crate) measured_in_run: AxisPair<u64>,
}

fn tracks_for(config: &GridConfig) -> AxisPair<TrackModel> {
    let build = |axis| TrackModel::new(config.tracks(axis).to_vec(), *config.axis(axis), config.handle_size);
    AxisPair::new(build(Axis::Horizontal), build(Axis::Vertical))
}

impl GridLayout {
    /// An empty grid on `container`.
    pub fn new(container: impl Into<OccupantId>) -> Self {
        let config = GridConfig::default();
        Self {
            container: container.into(),
            tracks: tracks_for(&config),
            config,
            items: Vec::new(),
            parent: None,
            imposed: AxisPair::splat(None),
            preview: None,
            measured_in_run: AxisPair::splat(0),
        }
    }

    /// A grid on `container` with `config` already applied.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] found by [`GridConfig::validate`].
    pub fn configured<P: MeasurementProvider>(
        container: impl Into<OccupantId>,
        config: GridConfig,
        provider: &mut P,
    ) -> Result<Self, ConfigError> {
        let mut layout = Self::new(container);
        layout.set_config(config, provider)?;
        Ok(layout)
    }

    /// Replace tracks and items wholesale.
    ///
    /// Items whose occupant is unchanged keep their cached measurements;
    /// occupants that disappeared get their size override cleared. Committed
    /// handle drags are discarded with the old track list.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] found by [`GridConfig::validate`]; the grid
    /// is left untouched in that case.
    pub fn set_config<P: MeasurementProvider>(&mut self, config: GridConfig, provider: &mut P) -> Result<(), ConfigError> {
        config.validate()?;

        let col_count = config.cols.len();
        let mut previous: Vec<ItemModel> = self.items.drain(..).flatten().collect();
        let items: Vec<Option<ItemModel>> = config
            .items
            .iter()
            .enumerate()
            .map(|(slot, item)| {
                let item = item.as_ref()?;
                let mut model = ItemModel::from_config(item, slot / col_count, slot % col_count);
                if let Some(position) = previous.iter().position(|old| old.same_identity(&model)) {
                    model.inherit(previous.swap_remove(position));
                }
                Some(model)
            })
            .collect();

        for vanished in previous {
            for axis in Axis::BOTH {
                if vanished.has_override_set(axis) {
                    provider.clear_resolved_size(vanished.id(), axis);
                }
            }
            tracing::debug!("Occupant {} left grid {}", vanished.id(), self.container);
        }

        self.tracks = tracks_for(&config);
        self.items = items;
        self.config = config;
        self.preview = None;
        Ok(())
    }

    /// Container element backing this grid.
    pub const fn container(&self) -> &OccupantId {
        &self.container
    }

    /// Current configuration.
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Track model along `axis`.
    pub const fn tracks(&self, axis: Axis) -> &TrackModel {
        self.tracks.get(axis)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.config.rows.len()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.config.cols.len()
    }

    /// The item whose origin is at (`row`, `col`).
    pub fn item(&self, row: usize, col: usize) -> Option<&ItemModel> {
        if col >= self.cols() {
            return None;
        }
        let slot = row.checked_mul(self.cols())?.checked_add(col)?;
        self.items.get(slot)?.as_ref()
    }

    /// Every item in row-major order.
    pub fn items(&self) -> impl Iterator<Item = &ItemModel> {
        self.items.iter().flatten()
    }

    /// The item occupied by `occupant`.
    pub fn item_for(&self, occupant: &OccupantId) -> Option<&ItemModel> {
        self.items().find(|item| item.id() == occupant)
    }

    /// Mark the items covering the given (row, col) cells fully dirty.
    pub fn mark_items_dirty(&mut self, cells: &[(usize, usize)]) {
        for item in self.items.iter_mut().flatten() {
            if cells
                .iter()
                .any(|(row, col)| item.covers(Axis::Vertical, *row) && item.covers(Axis::Horizontal, *col))
            {
                item.mark_dirty(DirtyLevel::Full);
            }
        }
    }

    /// Mark every item dirty at `level`.
    pub fn mark_all_dirty(&mut self, level: DirtyLevel) {
        for item in self.items.iter_mut().flatten() {
            item.mark_dirty(level);
        }
    }

    /// Mark the item occupied by `occupant` dirty at `level`; `false` if absent.
    pub fn mark_occupant_dirty(&mut self, occupant: &OccupantId, level: DirtyLevel) -> bool {
        let mut found = false;
        for item in self.items.iter_mut().flatten().filter(|item| item.id() == occupant) {
            item.mark_dirty(level);
            found = true;
        }
        found
    }

    /// Nested grid references of the current items: (slot, container, propagate).
    pub(crate) fn nested_refs(&self) -> Vec<(usize, OccupantId, bool)> {
        self.config
            .items
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| {
                let item = item.as_ref()?;
                match &item.occupant {
                    OccupantRef::Grid(container) => Some((slot, container.clone(), item.propagate)),
                    OccupantRef::Element(_) => None,
                }
            })
            .filter(|(slot, ..)| self.items.get(*slot).is_some_and(Option::is_some))
            .collect()
    }

    /// Link the nested grid at `slot` to its registered instance.
    pub(crate) fn link_nested(&mut self, slot: usize, grid: Option<GridId>) {
        if let Some(item) = self
            .items
            .get_mut(slot)
            .and_then(Option::as_mut)
            .filter(|item| item.occupant.nested_grid() != grid)
        {
            item.link_grid(grid);
        }
    }

    /// Forget the nested instance at `slot` after it was dropped.
    pub(crate) fn detach_nested(&mut self, slot: usize) {
        self.link_nested(slot, None);
    }

    /// Serializable view of the last measure and apply.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            container: self.container.clone(),
            horizontal: AxisSnapshot::of(self.tracks.get(Axis::Horizontal)),
            vertical: AxisSnapshot::of(self.tracks.get(Axis::Vertical)),
            items: self
                .items()
                .map(|item| ItemSnapshot {
                    occupant: item.id().clone(),
                    row: item.start(Axis::Vertical),
                    col: item.start(Axis::Horizontal),
                    hidden: item.is_hidden(),
                    bounds: item.resolved_box(),
                })
                .collect(),
        }
    }
}

/// Resolved state of one grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    /// Container element
    pub container: OccupantId,
    /// Columns
    pub horizontal: AxisSnapshot,
    /// Rows
    pub vertical: AxisSnapshot,
    /// Items in row-major order
    pub items: Vec<ItemSnapshot>,
}

/// Resolved state of the tracks along one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSnapshot {
    /// Measured preferred sizes, -1 for hidden tracks
    pub preferred: Vec<f32>,
    /// Measured minimum sizes, -1 for hidden tracks
    pub minimum: Vec<f32>,
    /// Assigned sizes, `None` for hidden tracks
    pub target: Vec<Option<f32>>,
    /// Track offsets, `None` for hidden tracks
    pub offset: Vec<Option<f32>>,
    /// Tracks followed by a resize handle
    pub handles: Vec<usize>,
    /// Committed handle drags
    pub fixed_overrides: Vec<Option<f32>>,
    /// Total preferred size with margins and gaps
    pub total_preferred: f32,
    /// Total minimum size with margins and gaps
    pub total_minimum: f32,
}

impl AxisSnapshot {
    fn of(tracks: &TrackModel) -> Self {
        let indices = 0..tracks.len();
        Self {
            preferred: indices.clone().map(|index| tracks.preferred_size(index)).collect(),
            minimum: indices.clone().map(|index| tracks.minimum_size(index)).collect(),
            target: indices.clone().map(|index| tracks.target_size(index)).collect(),
            offset: indices.clone().map(|index| tracks.offset(index)).collect(),
            handles: tracks.handles(),
            fixed_overrides: indices.map(|index| tracks.fixed_override(index)).collect(),
            total_preferred: tracks.total_preferred_size(),
            total_minimum: tracks.total_minimum_size(),
        }
    }
}

/// Resolved state of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    /// Element or nested container
    pub occupant: OccupantId,
    /// Origin row
    pub row: usize,
    /// Origin column
    pub col: usize,
    /// Hidden at the last measure
    pub hidden: bool,
    /// Box from the last apply
    #[serde(rename = "box")]
    pub bounds: Option<ItemBox>,
}
