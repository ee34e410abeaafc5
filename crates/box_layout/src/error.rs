//! Errors surfaced to callers.
//!
//! Stale containers, vanished occupants, undersized containers and runaway
//! re-scheduling are absorbed by the solver and never show up here. Only
//! configuration mistakes and drag-session misuse are reported.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::axis::Axis;
use crate::item::OccupantId;
use crate::scheduler::GridId;

/// A configuration that cannot be laid out.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The item list does not have one slot per cell.
    ItemCount {
        /// `rows * cols`
        expected: usize,
        /// Length of the item list
        found: usize,
    },
    /// An item declares a span of zero.
    ZeroSpan {
        /// Row of the item origin
        row: usize,
        /// Column of the item origin
        col: usize,
    },
    /// An item span extends past the last row or column.
    SpanOutOfBounds {
        /// Row of the item origin
        row: usize,
        /// Column of the item origin
        col: usize,
        /// Declared row span
        row_span: usize,
        /// Declared column span
        col_span: usize,
    },
    /// Two items claim the same cell.
    OverlappingItems {
        /// Row of the contested cell
        row: usize,
        /// Column of the contested cell
        col: usize,
    },
    /// A stretch factor is negative or not finite.
    InvalidStretch {
        /// Axis of the track
        axis: Axis,
        /// Track index
        track: usize,
        /// Offending value
        value: f32,
    },
    /// A size, margin or spacing is negative or not finite.
    InvalidSize {
        /// Which setting carried the value
        what: &'static str,
        /// Offending value
        value: f32,
    },
    /// A percent initial size lies outside `0..=100`.
    InvalidPercent {
        /// Axis of the track
        axis: Axis,
        /// Track index
        track: usize,
        /// Offending value
        value: f32,
    },
    /// Nesting this container would make a grid contain itself.
    CyclicNesting {
        /// Container that closes the cycle
        container: OccupantId,
    },
    /// The container is already nested in another grid.
    AlreadyNested {
        /// Container referenced twice
        container: OccupantId,
    },
    /// No grid with this id is registered.
    UnknownGrid(GridId),
}

impl Display for ConfigError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ItemCount { expected, found } => {
                write!(formatter, "Expected {expected} item slots, found {found}")
            }
            Self::ZeroSpan { row, col } => {
                write!(formatter, "Item at ({row}, {col}) has a zero span")
            }
            Self::SpanOutOfBounds {
                row,
                col,
                row_span,
                col_span,
            } => write!(
                formatter,
                "Item at ({row}, {col}) spanning {row_span}x{col_span} extends past the grid"
            ),
            Self::OverlappingItems { row, col } => {
                write!(formatter, "Cell ({row}, {col}) is claimed by more than one item")
            }
            Self::InvalidStretch { axis, track, value } => {
                write!(formatter, "Invalid stretch factor {value} on {axis:?} track {track}")
            }
            Self::InvalidSize { what, value } => write!(formatter, "Invalid {what}: {value}"),
            Self::InvalidPercent { axis, track, value } => {
                write!(formatter, "Invalid percent size {value} on {axis:?} track {track}")
            }
            Self::CyclicNesting { container } => {
                write!(formatter, "Nesting container '{container}' would create a cycle")
            }
            Self::AlreadyNested { container } => {
                write!(formatter, "Container '{container}' is already nested in another grid")
            }
            Self::UnknownGrid(grid) => write!(formatter, "Unknown grid {grid:?}"),
        }
    }
}

impl Error for ConfigError {}

/// Misuse of the resize-handle drag protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragError {
    /// Another drag session holds the pointer capture.
    CaptureBusy,
    /// No grid with this id is registered.
    UnknownGrid(GridId),
    /// No visible handle follows this track.
    NoSuchHandle {
        /// Axis of the handle
        axis: Axis,
        /// Index of the track before the handle
        handle: usize,
    },
    /// No drag session is active.
    NotDragging,
}

impl Display for DragError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::CaptureBusy => write!(formatter, "Another resize handle holds the capture"),
            Self::UnknownGrid(grid) => write!(formatter, "Unknown grid {grid:?}"),
            Self::NoSuchHandle { axis, handle } => {
                write!(formatter, "No resize handle after {axis:?} track {handle}")
            }
            Self::NotDragging => write!(formatter, "No drag session is active"),
        }
    }
}

impl Error for DragError {}
