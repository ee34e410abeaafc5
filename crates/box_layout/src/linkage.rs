//! Size propagation between a nested grid and the grid hosting it.
//!
//! Nesting is expressed through [`GridId`]s, never references: a nested grid
//! knows the slot it occupies in its host through a [`ParentLink`], and the
//! host knows the nested instance through the item's [`Occupant::Nested`]
//! variant. The scheduler moves [`SizeReport`]s up and [`SizePush`]es down.
//!
//! [`Occupant::Nested`]: crate::Occupant::Nested

use crate::axis::{Axis, AxisPair};
use crate::item::DirtyLevel;
use crate::layout::GridLayout;
use crate::scheduler::GridId;

/// Where a nested grid sits inside its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    /// The hosting grid
    pub host: GridId,
    /// Row-major slot of the hosting item
    pub slot: usize,
    /// Whether totals are reported to the host
    pub propagate: bool,
}

/// Totals a nested grid reports to the item hosting it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeReport {
    /// The hosting grid
    pub host: GridId,
    /// Row-major slot of the hosting item
    pub slot: usize,
    /// Axis the totals were measured on
    pub axis: Axis,
    /// Total preferred size, margins and gaps included
    pub preferred: f32,
    /// Total minimum size, margins and gaps included
    pub minimum: f32,
}

/// A size resolved by a host for one of its nested grids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePush {
    /// The nested grid
    pub grid: GridId,
    /// Axis the size applies to
    pub axis: Axis,
    /// Size of the nested grid's container
    pub size: f32,
}

impl GridLayout {
    /// Where this grid sits inside its host, if nested.
    pub const fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    /// Size imposed by the host along `axis`, if any.
    pub const fn imposed_size(&self, axis: Axis) -> Option<f32> {
        self.imposed.value(axis)
    }

    pub(crate) fn set_parent(&mut self, link: Option<ParentLink>) {
        if self.parent == link {
            return;
        }
        self.parent = link;
        for axis in Axis::BOTH {
            self.tracks.get_mut(axis).last_reported = None;
        }
        if link.is_none() {
            self.imposed = AxisPair::splat(None);
        }
    }

    /// The report owed to the host after measuring `axis`, if any.
    pub(crate) fn pending_report(&mut self, axis: Axis, full: bool) -> Option<SizeReport> {
        let link = self.parent.filter(|link| link.propagate)?;
        let tracks = self.tracks.get_mut(axis);
        let totals = (tracks.total_preferred, tracks.total_minimum);
        let changed = tracks.last_reported.is_none_or(|(preferred, minimum)| {
            (preferred - totals.0).abs() > f32::EPSILON || (minimum - totals.1).abs() > f32::EPSILON
        });
        if !changed && !full {
            return None;
        }
        tracks.last_reported = Some(totals);
        Some(SizeReport {
            host: link.host,
            slot: link.slot,
            axis,
            preferred: totals.0,
            minimum: totals.1,
        })
    }

    /// Receive a nested grid's totals for the item at `slot`.
    ///
    /// Returns `true` when this grid already measured `axis` during `run`,
    /// meaning the report can only be honoured by another run.
    pub(crate) fn report_preferred_size(
        &mut self,
        slot: usize,
        axis: Axis,
        preferred: f32,
        minimum: f32,
        run: u64,
    ) -> bool {
        let Some(Some(item)) = self.items.get_mut(slot) else {
            return false;
        };
        item.nested_totals.set(axis, Some((preferred, minimum)));
        item.mark_dirty_along(axis, DirtyLevel::SizeOnly);
        self.measured_in_run.value(axis) == run
    }

    /// Take the size resolved by the host for this grid's container.
    pub(crate) fn impose_size(&mut self, axis: Axis, size: f32) {
        let previous = self.imposed.value(axis);
        if previous.is_none_or(|current| (current - size).abs() > f32::EPSILON) {
            tracing::debug!("Imposed {axis:?} size on {}: {previous:?} -> {size}", self.container);
            self.imposed.set(axis, Some(size));
        }
    }
}
