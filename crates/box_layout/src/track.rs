//! Track model: one axis (rows or columns) of one grid.

use crate::config::{AxisConfig, Resizable, TrackConfig};

/// Preferred/minimum size of a track whose occupants are all hidden.
pub const HIDDEN_TRACK: f32 = -1.0;

/// Declared configuration and live sizes of the tracks along one axis.
#[derive(Debug, Clone)]
pub struct TrackModel {
    pub(crate) tracks: Vec<TrackConfig>,
    pub(crate) settings: AxisConfig,
    pub(crate) handle_size: f32,
    pub(crate) preferred: Vec<f32>,
    pub(crate) minimum: Vec<f32>,
    pub(crate) target: Vec<f32>,
    pub(crate) offset: Vec<f32>,
    pub(crate) stretched: Vec<bool>,
    pub(crate) fixed_override: Vec<Option<f32>>,
    /// `handle_after[i]` is set when a resize handle sits between `i` and `i + 1`.
    pub(crate) handle_after: Vec<bool>,
    pub(crate) total_preferred: f32,
    pub(crate) total_minimum: f32,
    /// Totals last reported to the host grid: (preferred, minimum).
    pub(crate) last_reported: Option<(f32, f32)>,
    /// Size distributed by the last apply.
    pub(crate) available: f32,
}

impl TrackModel {
    /// Tracks from their configuration. Every track starts visible at its declared minimum.
    pub fn new(tracks: Vec<TrackConfig>, settings: AxisConfig, handle_size: f32) -> Self {
        let count = tracks.len();
        let declared: Vec<f32> = tracks.iter().map(|track| track.min_size).collect();
        Self {
            tracks,
            settings,
            handle_size,
            preferred: declared.clone(),
            target: declared.clone(),
            minimum: declared,
            offset: vec![0.0; count],
            stretched: vec![false; count],
            fixed_override: vec![None; count],
            handle_after: vec![false; count],
            total_preferred: 0.0,
            total_minimum: 0.0,
            last_reported: None,
            available: 0.0,
        }
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the axis has no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Declared configuration of track `index`.
    pub fn config(&self, index: usize) -> Option<&TrackConfig> {
        self.tracks.get(index)
    }

    /// Shared spacing and margin settings.
    pub const fn settings(&self) -> &AxisConfig {
        &self.settings
    }

    /// Whether track `index` has at least one visible occupant (or none at all).
    pub fn is_visible(&self, index: usize) -> bool {
        self.minimum.get(index).is_some_and(|minimum| *minimum >= 0.0)
    }

    /// Indices of visible tracks in order.
    pub fn visible(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|index| self.is_visible(*index))
    }

    /// Measured preferred size; [`HIDDEN_TRACK`] for hidden tracks.
    pub fn preferred_size(&self, index: usize) -> f32 {
        self.preferred.get(index).copied().unwrap_or(HIDDEN_TRACK)
    }

    /// Measured minimum size; [`HIDDEN_TRACK`] for hidden tracks.
    pub fn minimum_size(&self, index: usize) -> f32 {
        self.minimum.get(index).copied().unwrap_or(HIDDEN_TRACK)
    }

    /// Size assigned by the last apply; `None` for hidden tracks.
    pub fn target_size(&self, index: usize) -> Option<f32> {
        if self.is_visible(index) {
            self.target.get(index).copied()
        } else {
            None
        }
    }

    /// Offset of track `index` from the start of the container.
    pub fn offset(&self, index: usize) -> Option<f32> {
        self.target_size(index).and(self.offset.get(index).copied())
    }

    /// Whether the last apply grew track `index` past its preferred size.
    pub fn is_stretched(&self, index: usize) -> bool {
        self.stretched.get(index).copied().unwrap_or(false)
    }

    /// Size committed by a handle drag, if any.
    pub fn fixed_override(&self, index: usize) -> Option<f32> {
        self.fixed_override.get(index).copied().flatten()
    }

    /// Sum of visible preferred sizes plus margins and gaps.
    pub const fn total_preferred_size(&self) -> f32 {
        self.total_preferred
    }

    /// Sum of visible minimum sizes plus margins and gaps.
    pub const fn total_minimum_size(&self) -> f32 {
        self.total_minimum
    }

    /// Tracks followed by a resize handle.
    pub fn handles(&self) -> Vec<usize> {
        self.handle_after
            .iter()
            .enumerate()
            .filter_map(|(index, present)| present.then_some(index))
            .collect()
    }

    /// Whether a handle sits directly after track `index`.
    pub fn has_handle_after(&self, index: usize) -> bool {
        self.handle_after.get(index).copied().unwrap_or(false)
    }

    /// Whether a handle sits on either side of track `index`.
    pub fn has_adjacent_handle(&self, index: usize) -> bool {
        self.has_handle_after(index) || index.checked_sub(1).is_some_and(|before| self.has_handle_after(before))
    }

    fn resizable(&self, index: usize) -> Resizable {
        self.tracks.get(index).map_or(Resizable::None, |track| track.resizable)
    }

    fn stretch(&self, index: usize) -> f32 {
        self.tracks.get(index).map_or(0.0, |track| track.stretch)
    }

    pub(crate) fn stretch_factors(&self, indices: &[usize]) -> Vec<f32> {
        indices.iter().map(|index| self.stretch(*index)).collect()
    }

    /// Whether track `index` keeps a fixed size during distribution.
    pub fn is_fixed(&self, index: usize) -> bool {
        self.has_adjacent_handle(index)
            && (self.fixed_override(index).is_some() || matches!(self.resizable(index), Resizable::Initial { .. }))
    }

    /// The fixed size of track `index` against `content_size`, floored at its minimum.
    pub(crate) fn fixed_size(&self, index: usize, content_size: f32) -> Option<f32> {
        if !self.has_adjacent_handle(index) {
            return None;
        }
        let size = self
            .fixed_override(index)
            .or_else(|| self.resizable(index).initial_size(content_size))?;
        Some(size.max(self.minimum_size(index)))
    }

    /// Gap after visible track `index` when another visible track follows.
    pub fn gap_after(&self, index: usize) -> f32 {
        if self.has_handle_after(index) {
            self.settings.spacing + self.handle_size
        } else {
            self.settings.spacing
        }
    }

    /// Gaps between the visible tracks in `indices` (sorted, visible only).
    pub(crate) fn gaps_between(&self, indices: &[usize]) -> f32 {
        indices
            .split_last()
            .map_or(0.0, |(_, leading)| leading.iter().map(|index| self.gap_after(*index)).sum())
    }

    /// Margins plus every gap between visible tracks.
    pub fn margins_total(&self) -> f32 {
        let visible: Vec<usize> = self.visible().collect();
        self.settings.margin_start + self.settings.margin_end + self.gaps_between(&visible)
    }

    pub(crate) fn begin_measure(&mut self) {
        for (index, track) in self.tracks.iter().enumerate() {
            if let Some(preferred) = self.preferred.get_mut(index) {
                *preferred = track.min_size;
            }
            if let Some(minimum) = self.minimum.get_mut(index) {
                *minimum = track.min_size;
            }
        }
    }

    pub(crate) fn mark_hidden(&mut self, index: usize) {
        if let Some(preferred) = self.preferred.get_mut(index) {
            *preferred = HIDDEN_TRACK;
        }
        if let Some(minimum) = self.minimum.get_mut(index) {
            *minimum = HIDDEN_TRACK;
        }
    }

    /// Raise track `index` to cover an item's preferred and minimum size.
    pub(crate) fn include(&mut self, index: usize, preferred: f32, minimum: f32) {
        if let Some(current) = self.minimum.get_mut(index) {
            *current = current.max(minimum.max(0.0));
        }
        if let Some(current) = self.preferred.get_mut(index) {
            *current = current.max(preferred.max(0.0));
        }
    }

    /// Minimum always wins over preferred.
    pub(crate) fn settle_minimums(&mut self) {
        for (preferred, minimum) in self.preferred.iter_mut().zip(&self.minimum) {
            if *minimum >= 0.0 && *minimum > *preferred {
                *preferred = *minimum;
            }
        }
    }

    /// Recompute the handle set from visibility and drop overrides that lost their handle.
    pub(crate) fn compute_handles(&mut self) {
        let count = self.len();
        let handles: Vec<bool> = (0..count)
            .map(|index| {
                index + 1 < count
                    && self.is_visible(index)
                    && self.is_visible(index + 1)
                    && self.resizable(index).is_resizable()
                    && self.resizable(index + 1).is_resizable()
            })
            .collect();
        self.handle_after = handles;
        for index in 0..count {
            if self.fixed_override(index).is_some() && !self.has_adjacent_handle(index) {
                tracing::debug!("Dropping fixed override on track {index}: no adjacent handle");
                if let Some(slot) = self.fixed_override.get_mut(index) {
                    *slot = None;
                }
            }
        }
    }

    pub(crate) fn compute_totals(&mut self) {
        let margins = self.margins_total();
        let (preferred, minimum) = self.visible().fold((0.0, 0.0), |(preferred_sum, minimum_sum), index| {
            (
                preferred_sum + self.preferred_size(index),
                minimum_sum + self.minimum_size(index),
            )
        });
        self.total_preferred = preferred + margins;
        self.total_minimum = minimum + margins;
    }

    pub(crate) fn set_fixed_override(&mut self, index: usize, size: f32) {
        if let Some(slot) = self.fixed_override.get_mut(index) {
            *slot = Some(size.max(0.0));
        }
    }
}
