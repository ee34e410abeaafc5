//! Measurement collaborator interface and an in-memory implementation.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::mem;

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, AxisPair};
use crate::item::OccupantId;

/// Source of content sizes and sink for resolved sizes.
///
/// The solver never inspects occupants directly; everything it knows about
/// an element comes through this trait.
pub trait MeasurementProvider {
    /// Size the occupant would like along `axis` when unconstrained.
    fn natural_preferred_size(&self, occupant: &OccupantId, axis: Axis) -> f32;

    /// Smallest size the occupant accepts along `axis`.
    fn declared_minimum_size(&self, occupant: &OccupantId, axis: Axis) -> f32;

    /// Whether the occupant is currently hidden.
    fn is_hidden(&self, occupant: &OccupantId) -> bool;

    /// Whether the occupant is still part of the visual tree.
    fn is_attached(&self, occupant: &OccupantId) -> bool;

    /// Content box of a container that has no size imposed by an outer grid.
    fn available_size(&self, container: &OccupantId, axis: Axis) -> f32;

    /// Override the occupant's size along `axis`.
    fn set_resolved_size(&mut self, occupant: &OccupantId, axis: Axis, size: f32);

    /// Drop an override and restore the occupant's natural size along `axis`.
    fn clear_resolved_size(&mut self, occupant: &OccupantId, axis: Axis);

    /// Position the occupant along `axis`, relative to its grid's container.
    fn set_resolved_offset(&mut self, _occupant: &OccupantId, _axis: Axis, _offset: f32) {}

    /// Occupants whose natural size changed after being resized since the last call.
    fn take_reflowed(&mut self) -> Vec<OccupantId> {
        Vec::new()
    }
}

/// Content sizes of one occupant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantMetrics {
    /// Natural preferred size per axis
    pub preferred: AxisPair<f32>,
    /// Declared minimum size per axis
    #[serde(default)]
    pub minimum: AxisPair<f32>,
    /// Hidden occupants take no space
    #[serde(default)]
    pub hidden: bool,
}

impl OccupantMetrics {
    /// Metrics from preferred (width, height) and minimum (width, height).
    pub const fn new(preferred: (f32, f32), minimum: (f32, f32)) -> Self {
        Self {
            preferred: AxisPair::new(preferred.0, preferred.1),
            minimum: AxisPair::new(minimum.0, minimum.1),
            hidden: false,
        }
    }
}

/// Deterministic provider backed by hash maps.
///
/// Unknown occupants measure zero and count as attached until detached.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    metrics: HashMap<OccupantId, OccupantMetrics>,
    available: HashMap<OccupantId, AxisPair<f32>>,
    detached: HashSet<OccupantId>,
    resolved: HashMap<(OccupantId, Axis), f32>,
    offsets: HashMap<(OccupantId, Axis), f32>,
    /// Per-resize growth of the natural size, for content that reflows.
    reflow_growth: HashMap<OccupantId, f32>,
    reflowed: Vec<OccupantId>,
    minimum_queries: Cell<usize>,
}

impl MemoryProvider {
    /// An empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an occupant with preferred and minimum (width, height).
    #[must_use]
    pub fn with_occupant(mut self, id: impl Into<OccupantId>, preferred: (f32, f32), minimum: (f32, f32)) -> Self {
        self.set_metrics(id, OccupantMetrics::new(preferred, minimum));
        self
    }

    /// Register a container with an available (width, height).
    #[must_use]
    pub fn with_container(mut self, id: impl Into<OccupantId>, width: f32, height: f32) -> Self {
        self.set_available(id, width, height);
        self
    }

    /// Replace an occupant's metrics.
    pub fn set_metrics(&mut self, id: impl Into<OccupantId>, metrics: OccupantMetrics) {
        self.metrics.insert(id.into(), metrics);
    }

    /// Mutable access to an occupant's metrics, inserting zeroed metrics if unknown.
    pub fn metrics_mut(&mut self, id: impl Into<OccupantId>) -> &mut OccupantMetrics {
        self.metrics.entry(id.into()).or_default()
    }

    /// Set the available size of a container.
    pub fn set_available(&mut self, id: impl Into<OccupantId>, width: f32, height: f32) {
        self.available.insert(id.into(), AxisPair::new(width, height));
    }

    /// Hide or show an occupant.
    pub fn set_hidden(&mut self, id: impl Into<OccupantId>, hidden: bool) {
        self.metrics_mut(id).hidden = hidden;
    }

    /// Remove an occupant from the visual tree.
    pub fn detach(&mut self, id: impl Into<OccupantId>) {
        self.detached.insert(id.into());
    }

    /// Make the occupant grow by `growth` along the resized axis every time it is resized.
    pub fn set_reflow_growth(&mut self, id: impl Into<OccupantId>, growth: f32) {
        self.reflow_growth.insert(id.into(), growth);
    }

    /// Last size set on the occupant along `axis`, if an override is active.
    pub fn resolved_size(&self, id: &OccupantId, axis: Axis) -> Option<f32> {
        self.resolved.get(&(id.clone(), axis)).copied()
    }

    /// Last offset set on the occupant along `axis`.
    pub fn resolved_offset(&self, id: &OccupantId, axis: Axis) -> Option<f32> {
        self.offsets.get(&(id.clone(), axis)).copied()
    }

    /// Number of minimum size queries answered so far.
    pub fn minimum_queries(&self) -> usize {
        self.minimum_queries.get()
    }

    fn metrics(&self, id: &OccupantId) -> OccupantMetrics {
        self.metrics.get(id).copied().unwrap_or_default()
    }
}

impl MeasurementProvider for MemoryProvider {
    fn natural_preferred_size(&self, occupant: &OccupantId, axis: Axis) -> f32 {
        self.metrics(occupant).preferred.value(axis)
    }

    fn declared_minimum_size(&self, occupant: &OccupantId, axis: Axis) -> f32 {
        self.minimum_queries.set(self.minimum_queries.get() + 1);
        self.metrics(occupant).minimum.value(axis)
    }

    fn is_hidden(&self, occupant: &OccupantId) -> bool {
        self.metrics(occupant).hidden
    }

    fn is_attached(&self, occupant: &OccupantId) -> bool {
        !self.detached.contains(occupant)
    }

    fn available_size(&self, container: &OccupantId, axis: Axis) -> f32 {
        self.available
            .get(container)
            .map_or(0.0, |available| available.value(axis))
    }

    fn set_resolved_size(&mut self, occupant: &OccupantId, axis: Axis, size: f32) {
        self.resolved.insert((occupant.clone(), axis), size);
        if let Some(growth) = self.reflow_growth.get(occupant).copied().filter(|growth| growth.abs() > f32::EPSILON) {
            let metrics = self.metrics.entry(occupant.clone()).or_default();
            *metrics.preferred.get_mut(axis) += growth;
            self.reflowed.push(occupant.clone());
        }
    }

    fn clear_resolved_size(&mut self, occupant: &OccupantId, axis: Axis) {
        self.resolved.remove(&(occupant.clone(), axis));
    }

    fn set_resolved_offset(&mut self, occupant: &OccupantId, axis: Axis, offset: f32) {
        self.offsets.insert((occupant.clone(), axis), offset);
    }

    fn take_reflowed(&mut self) -> Vec<OccupantId> {
        let mut reflowed = mem::take(&mut self.reflowed);
        reflowed.dedup();
        reflowed
    }
}
