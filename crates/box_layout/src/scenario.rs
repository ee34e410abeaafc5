//! JSON scenarios: occupant measurements plus the grids to lay them out in.
//!
//! ```json
//! {
//!   "viewport": { "horizontal": 800, "vertical": 600 },
//!   "occupants": { "chart": { "preferred": { "horizontal": 120, "vertical": 80 } } },
//!   "grids": [{ "container": "main", "config": { "cols": [], "rows": [] } }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, AxisPair};
use crate::config::GridConfig;
use crate::error::ConfigError;
use crate::item::OccupantId;
use crate::provider::{MemoryProvider, OccupantMetrics};
use crate::scheduler::Scheduler;

/// A grid to register, in the order listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioGrid {
    /// Container element
    pub container: OccupantId,
    /// Tracks and items
    pub config: GridConfig,
}

/// Everything needed to run the solver without a host toolkit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    /// Available size of containers not listed in `containers`
    pub viewport: AxisPair<f32>,
    /// Available sizes of specific containers
    pub containers: BTreeMap<OccupantId, AxisPair<f32>>,
    /// Content sizes by occupant
    pub occupants: BTreeMap<OccupantId, OccupantMetrics>,
    /// Natural size growth per resize, for occupants that reflow
    pub reflow: BTreeMap<OccupantId, f32>,
    /// Grids to create
    pub grids: Vec<ScenarioGrid>,
}

impl Scenario {
    /// Parse a scenario.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The provider described by this scenario.
    pub fn provider(&self) -> MemoryProvider {
        let mut provider = MemoryProvider::new();
        for (id, metrics) in &self.occupants {
            provider.set_metrics(id.clone(), *metrics);
        }
        for (id, growth) in &self.reflow {
            provider.set_reflow_growth(id.clone(), *growth);
        }
        for grid in &self.grids {
            let available = self.containers.get(&grid.container).copied().unwrap_or(self.viewport);
            provider.set_available(
                grid.container.clone(),
                available.value(Axis::Horizontal),
                available.value(Axis::Vertical),
            );
        }
        provider
    }

    /// Register every grid with a fresh scheduler. Nothing runs until flushed.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] of any grid.
    pub fn build(&self) -> Result<Scheduler<MemoryProvider>, ConfigError> {
        let mut scheduler = Scheduler::new(self.provider());
        for grid in &self.grids {
            let id = scheduler.create(grid.container.clone());
            scheduler.set_config(id, grid.config.clone())?;
        }
        Ok(scheduler)
    }
}
