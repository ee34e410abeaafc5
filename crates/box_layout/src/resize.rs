//! Resize handle drag protocol.
//!
//! A drag moves the boundary between tracks `i` and `i + 1`. While dragging,
//! both tracks are pinned to a preview of their new sizes; a commit turns the
//! drag into a fixed override on track `i` that survives later adjustments.

use std::time::Instant;

use crate::axis::Axis;
use crate::layout::GridLayout;
use crate::scheduler::GridId;

/// Allowed range of a drag delta, in screen direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBounds {
    /// Most negative delta
    pub min_delta: f32,
    /// Most positive delta
    pub max_delta: f32,
}

impl DragBounds {
    /// Clamp `delta` into the bounds.
    pub fn clamp(self, delta: f32) -> f32 {
        delta.max(self.min_delta).min(self.max_delta)
    }

    const fn reversed(self) -> Self {
        Self {
            min_delta: -self.max_delta,
            max_delta: -self.min_delta,
        }
    }
}

/// State of the process-wide drag capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    /// No handle is captured.
    #[default]
    Idle,
    /// A handle holds the capture.
    Dragging,
    /// The last drag was committed.
    Released,
}

/// Sizes pinned on the two tracks around a handle during a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResizePreview {
    pub(crate) axis: Axis,
    pub(crate) handle: usize,
    pub(crate) sizes: (f32, f32),
}

impl ResizePreview {
    /// Pinned size of track `index`, if it borders the handle.
    pub(crate) fn size_of(&self, index: usize) -> Option<f32> {
        match index.checked_sub(self.handle)? {
            0 => Some(self.sizes.0),
            1 => Some(self.sizes.1),
            _ => None,
        }
    }
}

/// One active drag.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CaptureSession {
    pub(crate) grid: GridId,
    pub(crate) axis: Axis,
    pub(crate) handle: usize,
    pub(crate) bounds: DragBounds,
    /// Sizes of tracks `handle` and `handle + 1` when the drag began.
    pub(crate) prior: (f32, f32),
    /// Screen deltas grow track `handle + 1` instead of `handle`.
    pub(crate) reversed: bool,
    pub(crate) last_activity: Instant,
}

impl CaptureSession {
    /// Growth of track `handle` for a screen `delta`, clamped.
    pub(crate) fn logical_delta(&self, delta: f32) -> f32 {
        let clamped = self.bounds.clamp(delta);
        if self.reversed { -clamped } else { clamped }
    }
}

impl GridLayout {
    fn is_reversed(&self, axis: Axis) -> bool {
        self.config.mirrored && axis == Axis::Horizontal
    }

    /// Drag range of the handle after track `handle`, in screen direction.
    ///
    /// `None` when no visible handle sits there.
    pub fn drag_bounds(&self, axis: Axis, handle: usize) -> Option<DragBounds> {
        let tracks = self.tracks(axis);
        if !tracks.has_handle_after(handle) {
            return None;
        }
        let before = tracks.target_size(handle)?;
        let after = tracks.target_size(handle + 1)?;
        let bounds = DragBounds {
            min_delta: -(before - tracks.minimum_size(handle)).max(0.0),
            max_delta: (after - tracks.minimum_size(handle + 1)).max(0.0),
        };
        Some(if self.is_reversed(axis) { bounds.reversed() } else { bounds })
    }

    /// The handle whose zone contains `position`, widened by `tolerance` on both sides.
    pub fn handle_at(&self, axis: Axis, position: f32, tolerance: f32) -> Option<usize> {
        let tracks = self.tracks(axis);
        tracks.handles().into_iter().find(|handle| {
            let (Some(offset), Some(size)) = (tracks.offset(*handle), tracks.target_size(*handle)) else {
                return false;
            };
            let gap = tracks.gap_after(*handle);
            let logical_center = offset + size + gap / 2.0;
            let center = if self.is_reversed(axis) {
                tracks.available - logical_center
            } else {
                logical_center
            };
            (position - center).abs() <= gap / 2.0 + tolerance
        })
    }

    pub(crate) fn start_capture(&self, grid: GridId, axis: Axis, handle: usize, now: Instant) -> Option<CaptureSession> {
        let bounds = self.drag_bounds(axis, handle)?;
        let tracks = self.tracks(axis);
        Some(CaptureSession {
            grid,
            axis,
            handle,
            bounds,
            prior: (tracks.target_size(handle)?, tracks.target_size(handle + 1)?),
            reversed: self.is_reversed(axis),
            last_activity: now,
        })
    }

    /// Pin the two tracks around the handle for a speculative apply.
    pub(crate) fn preview_resize(&mut self, session: &CaptureSession, delta: f32) {
        self.preview = Some(ResizePreview {
            axis: session.axis,
            handle: session.handle,
            sizes: (session.prior.0 + delta, session.prior.1 - delta),
        });
    }

    pub(crate) fn clear_preview(&mut self) {
        self.preview = None;
    }

    /// Commit a drag as a fixed override on the track before the handle.
    ///
    /// The track after the handle absorbs the change through distribution,
    /// unless it is fixed itself, in which case its override moves too.
    pub(crate) fn commit_resize(&mut self, session: &CaptureSession, delta: f32) {
        self.preview = None;
        let tracks = self.tracks.get_mut(session.axis);
        tracks.set_fixed_override(session.handle, session.prior.0 + delta);
        if tracks.is_fixed(session.handle + 1) {
            tracks.set_fixed_override(session.handle + 1, session.prior.1 - delta);
        }
        tracing::debug!(
            "Committed {:?} resize of track {} on {}: {} -> {}",
            session.axis,
            session.handle,
            self.container,
            session.prior.0,
            session.prior.0 + delta
        );
    }
}
