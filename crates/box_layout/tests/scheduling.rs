use box_layout::{
    Axis, ConfigError, DirtyLevel, GridConfig, ItemConfig, MAX_SELF_REQUESTED_RUNS, MemoryProvider, OccupantId,
    Scheduler, TrackConfig,
};

use crate::common::{dashboard, init_logging, targets};

mod common;

#[test]
fn requests_coalesce_into_one_run() -> Result<(), ConfigError> {
    let (mut scheduler, _) = dashboard(300.0)?;
    scheduler.request_adjust(false);
    scheduler.request_adjust(true);
    scheduler.request_adjust(false);
    assert!(scheduler.is_pending());
    assert!(scheduler.run_pending_now());
    assert!(!scheduler.is_pending());
    assert!(!scheduler.run_pending_now());
    assert_eq!(scheduler.runs_total(), 1);
    Ok(())
}

#[test]
fn second_run_without_changes_is_identical() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(300.0)?;
    assert_eq!(scheduler.flush(), 1);
    let first = scheduler.grid(grid).map(|layout| layout.snapshot());

    scheduler.request_adjust(false);
    assert_eq!(scheduler.flush(), 1);
    assert_eq!(scheduler.grid(grid).map(|layout| layout.snapshot()), first);
    assert_eq!(scheduler.self_requested_runs(), 0);
    assert_eq!(scheduler.runs_suppressed(), 0);
    Ok(())
}

#[test]
fn clean_items_are_not_remeasured() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(300.0)?;
    scheduler.flush();
    let queries = scheduler.provider().minimum_queries();
    assert_eq!(queries, 6);

    scheduler.request_adjust(false);
    scheduler.flush();
    assert_eq!(scheduler.provider().minimum_queries(), queries);

    assert!(scheduler.notify_items_dirty(grid, &[(0, 2)]));
    scheduler.flush();
    assert_eq!(scheduler.provider().minimum_queries(), queries + 2);

    scheduler.request_adjust(true);
    scheduler.flush();
    assert_eq!(scheduler.provider().minimum_queries(), queries + 8);
    Ok(())
}

#[test]
fn all_dirty_marks_every_item() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(300.0)?;
    scheduler.flush();
    assert!(scheduler.notify_all_dirty(grid));
    let levels: Vec<DirtyLevel> = scheduler
        .grid(grid)
        .map(|layout| layout.items().map(|item| item.dirty_level(Axis::Vertical)).collect())
        .unwrap_or_default();
    assert_eq!(levels, vec![DirtyLevel::Full; 3]);
    assert!(scheduler.is_pending());
    Ok(())
}

#[test]
fn viewport_resize_redistributes() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(300.0)?;
    scheduler.flush();
    scheduler.provider_mut().set_available("main", 400.0, 100.0);
    scheduler.notify_viewport_resized();
    assert_eq!(scheduler.flush(), 1);
    assert_eq!(
        targets(&scheduler, grid, Axis::Horizontal),
        vec![Some(80.0), Some(220.0), Some(100.0)]
    );
    Ok(())
}

#[test]
fn reflowing_content_is_cut_off_after_six_self_requested_runs() -> Result<(), ConfigError> {
    init_logging();
    let mut provider = MemoryProvider::new()
        .with_occupant("text", (100.0, 20.0), (0.0, 0.0))
        .with_container("main", 300.0, 100.0);
    provider.set_reflow_growth("text", 5.0);
    let mut scheduler = Scheduler::new(provider);
    let grid = scheduler.create("main");
    scheduler.set_config(
        grid,
        GridConfig::new(
            vec![TrackConfig::new(1.0)],
            vec![TrackConfig::new(1.0)],
            vec![Some(ItemConfig::element("text"))],
        ),
    )?;

    assert_eq!(scheduler.flush(), MAX_SELF_REQUESTED_RUNS + 1);
    assert_eq!(scheduler.self_requested_runs(), MAX_SELF_REQUESTED_RUNS);
    assert_eq!(scheduler.runs_suppressed(), 1);
    assert!(!scheduler.is_pending());

    scheduler.request_adjust(false);
    assert_eq!(scheduler.self_requested_runs(), 0);
    assert_eq!(scheduler.flush(), MAX_SELF_REQUESTED_RUNS + 1);
    assert_eq!(scheduler.runs_suppressed(), 2);
    Ok(())
}

#[test]
fn content_that_keeps_its_size_does_not_reschedule() -> Result<(), ConfigError> {
    init_logging();
    let mut provider = MemoryProvider::new()
        .with_occupant("label", (50.0, 20.0), (0.0, 0.0))
        .with_container("main", 40.0, 100.0);
    provider.set_reflow_growth("label", 0.0);
    let mut scheduler = Scheduler::new(provider);
    let grid = scheduler.create("main");
    scheduler.set_config(
        grid,
        GridConfig::new(
            vec![TrackConfig::new(0.0)],
            vec![TrackConfig::new(0.0)],
            vec![Some(ItemConfig::element("label"))],
        ),
    )?;

    assert_eq!(scheduler.flush(), 1);
    assert_eq!(
        scheduler.provider().resolved_size(&OccupantId::from("label"), Axis::Horizontal),
        Some(40.0)
    );
    Ok(())
}

#[test]
fn dispose_returns_the_provider() -> Result<(), ConfigError> {
    let (mut scheduler, _) = dashboard(300.0)?;
    scheduler.flush();
    let provider = scheduler.dispose();
    assert_eq!(provider.resolved_size(&OccupantId::from("middle"), Axis::Horizontal), Some(120.0));
    Ok(())
}
