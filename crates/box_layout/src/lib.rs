//! Constraint-based box layout for nested grids.
//!
//! Each [`GridLayout`] places rectangular occupants onto rows and columns and
//! runs two passes per axis: `measure` (content-driven preferred and minimum
//! track sizes, spanning redistribution) and `apply` (distribution of the
//! available size by stretch factor, placement of occupants). Grids can be
//! nested inside one another; a [`Scheduler`] owns every instance, coalesces
//! adjustment requests and runs the passes in nesting order.

// Axes and per-axis values
mod axis;
pub use axis::{Axis, AxisPair};

// Errors surfaced to callers
mod error;
pub use error::{ConfigError, DragError};

// Configuration value objects
mod config;
pub use config::{Alignment, AxisConfig, GridConfig, ItemAlign, ItemConfig, OccupantRef, Resizable, TrackConfig};

// Measurement collaborator
mod provider;
pub use provider::{MeasurementProvider, MemoryProvider, OccupantMetrics};

// Track and item models
mod item;
pub use item::{DirtyLevel, ItemBox, ItemModel, Occupant, OccupantId};

mod track;
pub use track::{HIDDEN_TRACK, TrackModel};

// Space distribution
mod distribute;
pub use distribute::{grow_by_weight, proportional_shares, shrink_toward_minimum};

// Grid layout instance
mod layout;
pub use layout::{AxisSnapshot, GridLayout, ItemSnapshot, LayoutSnapshot, MeasurePass};

// Parent/child size propagation
mod linkage;
pub use linkage::{ParentLink, SizePush, SizeReport};

// Resize handle protocol
mod resize;
pub use resize::{DragBounds, DragPhase};

// Adjustment scheduling
mod scheduler;
pub use scheduler::{DEFAULT_CAPTURE_TIMEOUT, GridId, MAX_SELF_REQUESTED_RUNS, Scheduler};

// JSON scenarios
mod scenario;
pub use scenario::{Scenario, ScenarioGrid};
