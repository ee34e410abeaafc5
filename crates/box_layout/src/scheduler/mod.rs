//! Adjustment scheduler.
//!
//! Owns every [`GridLayout`] in an arena whose tree structure is the nesting
//! of grids. Requests are coalesced into one pending run; a run measures every
//! grid children-first and applies them parents-first, horizontal axis before
//! vertical.

mod forest;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use indextree::{Arena, Node, NodeId};
use log::{debug, trace, warn};

use crate::axis::Axis;
use crate::config::GridConfig;
use crate::error::{ConfigError, DragError};
use crate::item::{DirtyLevel, OccupantId};
use crate::layout::{GridLayout, MeasurePass};
use crate::linkage::SizeReport;
use crate::provider::MeasurementProvider;
use crate::resize::{CaptureSession, DragBounds, DragPhase};

/// Consecutive self-requested runs allowed before re-scheduling is suppressed.
pub const MAX_SELF_REQUESTED_RUNS: usize = 6;

/// Idle time after which a drag capture is considered lost.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle of a grid owned by a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(NodeId);

fn grid_ref(arena: &Arena<GridLayout>, node: NodeId) -> Option<&GridLayout> {
    if node.is_removed(arena) {
        return None;
    }
    arena.get(node).map(Node::get)
}

fn grid_mut(arena: &mut Arena<GridLayout>, node: NodeId) -> Option<&mut GridLayout> {
    if node.is_removed(arena) {
        return None;
    }
    arena.get_mut(node).map(Node::get_mut)
}

/// Registry of grids and the single place adjustment runs happen.
#[derive(Debug)]
pub struct Scheduler<P> {
    provider: P,
    /// Every grid; a node's parent is the grid hosting it.
    arena: Arena<GridLayout>,
    /// Top-level grids in registration order.
    roots: Vec<NodeId>,
    /// Every registered grid by container element.
    containers: HashMap<OccupantId, NodeId>,
    /// Pending run, `Some(true)` when it must remeasure everything.
    pending: Option<bool>,
    /// Sequence number of the last run.
    run: u64,
    /// Consecutive self-requested runs in the current burst.
    self_requested_runs: usize,
    /// The drag session holding the pointer capture.
    capture: Option<CaptureSession>,
    phase: DragPhase,
    capture_timeout: Duration,
    /// Telemetry: runs executed since creation.
    perf_runs_total: u64,
    /// Telemetry: self-requested runs dropped by the oscillation breaker.
    perf_runs_suppressed: u64,
}

impl<P: MeasurementProvider> Scheduler<P> {
    /// An empty scheduler measuring through `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            arena: Arena::new(),
            roots: Vec::new(),
            containers: HashMap::new(),
            pending: None,
            run: 0,
            self_requested_runs: 0,
            capture: None,
            phase: DragPhase::Idle,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            perf_runs_total: 0,
            perf_runs_suppressed: 0,
        }
    }

    /// Tear down every grid and hand the provider back.
    pub fn dispose(self) -> P {
        if self.pending.is_some() {
            debug!("Disposing scheduler with a pending run");
        }
        self.provider
    }

    /// The measurement provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable access to the measurement provider.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Replace the drag capture timeout.
    pub fn set_capture_timeout(&mut self, timeout: Duration) {
        self.capture_timeout = timeout;
    }

    /// The grid on `container`, created empty if it does not exist yet.
    pub fn create(&mut self, container: impl Into<OccupantId>) -> GridId {
        let container = container.into();
        if let Some(node) = self.containers.get(&container) {
            return GridId(*node);
        }
        trace!("Creating grid on {container}");
        let node = self.arena.new_node(GridLayout::new(container.clone()));
        self.containers.insert(container, node);
        self.relink();
        self.request_adjust(false);
        GridId(node)
    }

    /// Take ownership of a configured grid.
    ///
    /// It is filed under the grid that references its container, and adopts
    /// the registered grids it references. A grid already registered on the
    /// same container is replaced.
    ///
    /// # Errors
    /// Returns [`ConfigError::CyclicNesting`] or [`ConfigError::AlreadyNested`]
    /// when the nesting it declares is impossible.
    pub fn register_top_level(&mut self, layout: GridLayout) -> Result<GridId, ConfigError> {
        let existing = self.containers.get(layout.container()).copied();
        self.check_nesting(existing, layout.container(), layout.config())?;
        let node = match existing.and_then(|node| grid_mut(&mut self.arena, node).map(|slot| (node, slot))) {
            Some((node, slot)) => {
                debug!("Replacing grid on {}", layout.container());
                *slot = layout;
                node
            }
            None => {
                let container = layout.container().clone();
                let node = self.arena.new_node(layout);
                self.containers.insert(container, node);
                node
            }
        };
        self.relink();
        self.request_adjust(false);
        Ok(GridId(node))
    }

    /// Replace a grid's configuration and schedule an adjustment.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`]: invalid tracks or items, impossible
    /// nesting, or an unknown grid. The grid is unchanged on error.
    pub fn set_config(&mut self, grid: GridId, config: GridConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let container = grid_ref(&self.arena, grid.0)
            .ok_or(ConfigError::UnknownGrid(grid))?
            .container()
            .clone();
        self.check_nesting(Some(grid.0), &container, &config)?;
        grid_mut(&mut self.arena, grid.0)
            .ok_or(ConfigError::UnknownGrid(grid))?
            .set_config(config, &mut self.provider)?;
        if self.capture.is_some_and(|session| session.grid == grid) {
            debug!("Configuration of {container} replaced the tracks under an active drag");
            self.capture = None;
            self.phase = DragPhase::Idle;
        }
        self.relink();
        self.request_adjust(false);
        Ok(())
    }

    /// Ask for an adjustment run. Repeated requests before the run coalesce.
    ///
    /// This is an external trigger: it resets the oscillation breaker.
    pub fn request_adjust(&mut self, force_full: bool) {
        self.self_requested_runs = 0;
        let full = self.pending.unwrap_or(false) || force_full;
        trace!("Adjustment requested (full: {full})");
        self.pending = Some(full);
    }

    /// Whether a run is pending.
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run the pending adjustment now; `false` when nothing was pending.
    pub fn run_pending_now(&mut self) -> bool {
        let Some(full) = self.pending.take() else {
            return false;
        };
        self.run += 1;
        self.perf_runs_total += 1;
        trace!("Adjustment run {} (full: {full})", self.run);
        let self_requested = self.run_cycle(MeasurePass { full, run: self.run });
        match (self_requested, self.self_requested_runs < MAX_SELF_REQUESTED_RUNS) {
            (false, _) => self.self_requested_runs = 0,
            (true, true) => {
                self.self_requested_runs += 1;
                self.pending = Some(false);
            }
            (true, false) => {
                self.perf_runs_suppressed += 1;
                warn!(
                    "Layout did not settle after {MAX_SELF_REQUESTED_RUNS} self-requested runs, suppressing re-scheduling"
                );
            }
        }
        true
    }

    /// Run until nothing is pending; returns the number of runs.
    pub fn flush(&mut self) -> usize {
        let mut runs = 0;
        while self.run_pending_now() {
            runs += 1;
        }
        runs
    }

    /// Mark the items covering the given (row, col) cells fully dirty; `false` for unknown grids.
    pub fn notify_items_dirty(&mut self, grid: GridId, cells: &[(usize, usize)]) -> bool {
        let Some(layout) = grid_mut(&mut self.arena, grid.0) else {
            return false;
        };
        layout.mark_items_dirty(cells);
        self.request_adjust(false);
        true
    }

    /// Mark every item of a grid fully dirty; `false` for unknown grids.
    pub fn notify_all_dirty(&mut self, grid: GridId) -> bool {
        let Some(layout) = grid_mut(&mut self.arena, grid.0) else {
            return false;
        };
        layout.mark_all_dirty(DirtyLevel::Full);
        self.request_adjust(false);
        true
    }

    /// The viewport changed size: remeasure everything.
    pub fn notify_viewport_resized(&mut self) {
        debug!("Viewport resized");
        self.request_adjust(true);
    }

    /// A registered grid.
    pub fn grid(&self, grid: GridId) -> Option<&GridLayout> {
        grid_ref(&self.arena, grid.0)
    }

    /// The grid registered on `container`.
    pub fn grid_for_container(&self, container: &OccupantId) -> Option<GridId> {
        self.containers.get(container).copied().map(GridId)
    }

    /// Top-level grids in registration order.
    pub fn roots(&self) -> Vec<GridId> {
        self.roots.iter().copied().map(GridId).collect()
    }

    /// Grids nested directly in `grid`.
    pub fn children(&self, grid: GridId) -> Vec<GridId> {
        if grid.0.is_removed(&self.arena) {
            return Vec::new();
        }
        grid.0.children(&self.arena).map(GridId).collect()
    }

    /// Every grid, hosts before the grids nested in them.
    pub fn grids(&self) -> impl Iterator<Item = (GridId, &GridLayout)> {
        self.pre_order()
            .into_iter()
            .filter_map(move |node| grid_ref(&self.arena, node).map(|layout| (GridId(node), layout)))
    }

    /// Number of registered grids.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether no grid is registered.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Consecutive self-requested runs in the current burst.
    pub const fn self_requested_runs(&self) -> usize {
        self.self_requested_runs
    }

    /// Runs executed since creation.
    pub const fn runs_total(&self) -> u64 {
        self.perf_runs_total
    }

    /// Self-requested runs dropped by the oscillation breaker.
    pub const fn runs_suppressed(&self) -> u64 {
        self.perf_runs_suppressed
    }

    fn run_cycle(&mut self, pass: MeasurePass) -> bool {
        let mut self_requested = false;
        for axis in Axis::BOTH {
            for node in self.post_order() {
                let report = grid_mut(&mut self.arena, node)
                    .and_then(|layout| layout.measure(axis, pass, &mut self.provider));
                if let Some(report) = report {
                    self_requested |= self.deliver_report(report, pass.run);
                }
            }

            let mut pushes = Vec::new();
            for node in self.pre_order() {
                let Some(layout) = grid_mut(&mut self.arena, node) else {
                    continue;
                };
                if !layout.apply(axis, &mut self.provider, &mut pushes) {
                    self.remove_stale(node);
                    pushes.clear();
                    continue;
                }
                for push in pushes.drain(..) {
                    if let Some(nested) = grid_mut(&mut self.arena, push.grid.0) {
                        nested.impose_size(push.axis, push.size);
                    }
                }
            }

            for occupant in self.provider.take_reflowed() {
                if self.mark_occupant_dirty(&occupant) {
                    trace!("{occupant} reflowed after {axis:?} apply");
                    self_requested = true;
                }
            }
        }
        self_requested
    }

    fn deliver_report(&mut self, report: SizeReport, run: u64) -> bool {
        trace!(
            "Reporting {:?} totals ({}, {}) to slot {} of {:?}",
            report.axis,
            report.preferred,
            report.minimum,
            report.slot,
            report.host
        );
        grid_mut(&mut self.arena, report.host.0).is_some_and(|host| {
            host.report_preferred_size(report.slot, report.axis, report.preferred, report.minimum, run)
        })
    }

    fn mark_occupant_dirty(&mut self, occupant: &OccupantId) -> bool {
        let mut found = false;
        for node in self.containers.values() {
            if let Some(layout) = grid_mut(&mut self.arena, *node) {
                found |= layout.mark_occupant_dirty(occupant, DirtyLevel::SizeOnly);
            }
        }
        found
    }

    /// Current state of the drag capture.
    pub const fn drag_phase(&self) -> DragPhase {
        self.phase
    }

    /// Capture the handle after track `handle` and return its drag range.
    ///
    /// # Errors
    /// [`DragError::CaptureBusy`] while another live session holds the capture,
    /// [`DragError::UnknownGrid`] or [`DragError::NoSuchHandle`] when there is
    /// nothing to drag.
    pub fn begin_drag(&mut self, grid: GridId, axis: Axis, handle: usize, now: Instant) -> Result<DragBounds, DragError> {
        if let Some(session) = self.capture {
            if now.saturating_duration_since(session.last_activity) < self.capture_timeout {
                return Err(DragError::CaptureBusy);
            }
            debug!("Taking over a stale capture on {:?}", session.grid);
            self.abort_drag();
        }
        let layout = grid_ref(&self.arena, grid.0).ok_or(DragError::UnknownGrid(grid))?;
        let session = layout
            .start_capture(grid, axis, handle, now)
            .ok_or(DragError::NoSuchHandle { axis, handle })?;
        self.capture = Some(session);
        self.phase = DragPhase::Dragging;
        Ok(session.bounds)
    }

    /// Preview a drag by `delta` and schedule a speculative apply.
    ///
    /// Returns the clamped delta.
    ///
    /// # Errors
    /// [`DragError::NotDragging`] without an active session.
    pub fn drag_delta(&mut self, delta: f32, now: Instant) -> Result<f32, DragError> {
        let Some(active) = self.capture.as_mut() else {
            return Err(DragError::NotDragging);
        };
        active.last_activity = now;
        let session = *active;
        let layout = grid_mut(&mut self.arena, session.grid.0).ok_or(DragError::UnknownGrid(session.grid))?;
        layout.preview_resize(&session, session.logical_delta(delta));
        self.request_adjust(false);
        Ok(session.bounds.clamp(delta))
    }

    /// Release the capture and commit the drag as a fixed track size.
    ///
    /// Returns the clamped delta.
    ///
    /// # Errors
    /// [`DragError::NotDragging`] without an active session.
    pub fn commit_drag(&mut self, delta: f32) -> Result<f32, DragError> {
        let session = self.capture.take().ok_or(DragError::NotDragging)?;
        self.phase = DragPhase::Idle;
        let layout = grid_mut(&mut self.arena, session.grid.0).ok_or(DragError::UnknownGrid(session.grid))?;
        layout.commit_resize(&session, session.logical_delta(delta));
        self.phase = DragPhase::Released;
        self.request_adjust(true);
        Ok(session.bounds.clamp(delta))
    }

    /// Release the capture without committing; `false` when nothing was captured.
    pub fn abort_drag(&mut self) -> bool {
        let Some(session) = self.capture.take() else {
            return false;
        };
        if let Some(layout) = grid_mut(&mut self.arena, session.grid.0) {
            layout.clear_preview();
        }
        self.phase = DragPhase::Idle;
        self.request_adjust(false);
        true
    }

    /// Abort a session idle for longer than the capture timeout.
    pub fn release_stale_capture(&mut self, now: Instant) -> bool {
        let stale = self
            .capture
            .is_some_and(|session| now.saturating_duration_since(session.last_activity) >= self.capture_timeout);
        if !stale {
            return false;
        }
        warn!("Drag capture timed out");
        self.abort_drag()
    }
}
