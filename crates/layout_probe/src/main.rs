//! Run a JSON scenario through the solver and print every grid's resolved layout.
//!
//! Usage: `layout_probe <scenario.json>`; reads stdin when no path is given.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{self, Read as _, Write as _};

use anyhow::{Context as _, Error};
use box_layout::{LayoutSnapshot, OccupantId, Scenario};
use log::{info, warn};

fn read_scenario() -> Result<String, Error> {
    match env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("Failed to read scenario {path}")),
        None => {
            let mut json = String::new();
            io::stdin()
                .read_to_string(&mut json)
                .context("Failed to read scenario from stdin")?;
            Ok(json)
        }
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let scenario = Scenario::from_json(&read_scenario()?).context("Malformed scenario")?;
    let mut scheduler = scenario.build()?;
    let runs = scheduler.flush();
    info!("Layout settled after {runs} runs");
    if scheduler.runs_suppressed() > 0 {
        warn!("Layout did not settle; results are from the last run");
    }

    let snapshots: BTreeMap<OccupantId, LayoutSnapshot> = scheduler
        .grids()
        .map(|(_, layout)| (layout.container().clone(), layout.snapshot()))
        .collect();
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &snapshots)?;
    writeln!(stdout)?;
    Ok(())
}
