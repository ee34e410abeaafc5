#![allow(dead_code, reason = "each test crate uses a different subset")]

use box_layout::{
    Axis, ConfigError, GridConfig, GridId, ItemConfig, MemoryProvider, OccupantId, Resizable, Scheduler, TrackConfig,
};

pub const EPSILON: f32 = 1e-3;

/// Install the test logger once per process.
pub fn init_logging() {
    let installed = env_logger::builder().is_test(true).try_init().is_ok();
    log::trace!("test logger installed: {installed}");
}

/// Three occupants sized like a toolbar row: (preferred, minimum) widths
/// 80/50, 60/30 and 100/50, all 20 high with a 10 minimum.
pub fn dashboard_provider(width: f32, height: f32) -> MemoryProvider {
    MemoryProvider::new()
        .with_occupant("left", (80.0, 20.0), (50.0, 10.0))
        .with_occupant("middle", (60.0, 20.0), (30.0, 10.0))
        .with_occupant("right", (100.0, 20.0), (50.0, 10.0))
        .with_container("main", width, height)
}

/// One row, three resizable columns; only the middle one stretches.
pub fn dashboard_config() -> GridConfig {
    let column = |stretch| TrackConfig::new(stretch).with_resizable(Resizable::Auto);
    GridConfig::new(
        vec![column(0.0), column(1.0), column(0.0)],
        vec![TrackConfig::new(1.0)],
        vec![
            Some(ItemConfig::element("left")),
            Some(ItemConfig::element("middle")),
            Some(ItemConfig::element("right")),
        ],
    )
}

/// A scheduler holding the dashboard grid on a `width` x 100 container.
pub fn dashboard(width: f32) -> Result<(Scheduler<MemoryProvider>, GridId), ConfigError> {
    init_logging();
    let mut scheduler = Scheduler::new(dashboard_provider(width, 100.0));
    let grid = scheduler.create("main");
    scheduler.set_config(grid, dashboard_config())?;
    Ok((scheduler, grid))
}

/// Target sizes of every track along `axis`.
pub fn targets(scheduler: &Scheduler<MemoryProvider>, grid: GridId, axis: Axis) -> Vec<Option<f32>> {
    scheduler
        .grid(grid)
        .map(|layout| {
            let tracks = layout.tracks(axis);
            (0..tracks.len()).map(|index| tracks.target_size(index)).collect()
        })
        .unwrap_or_default()
}

/// Sum of visible target sizes along `axis`.
pub fn target_total(scheduler: &Scheduler<MemoryProvider>, grid: GridId, axis: Axis) -> f32 {
    targets(scheduler, grid, axis).into_iter().flatten().sum()
}

pub fn grid_on(scheduler: &Scheduler<MemoryProvider>, container: &str) -> Option<GridId> {
    scheduler.grid_for_container(&OccupantId::from(container))
}

pub fn close(actual: Option<f32>, expected: f32) -> bool {
    actual.is_some_and(|value| (value - expected).abs() < EPSILON)
}
