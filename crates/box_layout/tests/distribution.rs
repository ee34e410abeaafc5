use box_layout::{Axis, AxisConfig, ConfigError, GridConfig, ItemConfig, MemoryProvider, Scheduler, TrackConfig};

use crate::common::{EPSILON, close, dashboard, dashboard_config, dashboard_provider, init_logging, target_total, targets};

mod common;

#[test]
fn surplus_goes_to_the_stretchable_column() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(300.0)?;
    assert_eq!(scheduler.flush(), 1);
    assert_eq!(
        targets(&scheduler, grid, Axis::Horizontal),
        vec![Some(80.0), Some(120.0), Some(100.0)]
    );
    Ok(())
}

#[test]
fn deficit_pins_the_stretchable_column_at_its_minimum() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(200.0)?;
    scheduler.flush();
    let sizes = targets(&scheduler, grid, Axis::Horizontal);
    assert!((target_total(&scheduler, grid, Axis::Horizontal) - 200.0).abs() < EPSILON);
    assert!(close(sizes.get(1).copied().flatten(), 30.0));
    assert!(sizes.first().copied().flatten().is_some_and(|size| (76.0..=77.0).contains(&size)));
    assert!(sizes.get(2).copied().flatten().is_some_and(|size| (93.0..=94.0).contains(&size)));
    Ok(())
}

#[test]
fn targets_and_margins_fill_the_container() -> Result<(), ConfigError> {
    init_logging();
    let mut scheduler = Scheduler::new(dashboard_provider(300.0, 100.0));
    let grid = scheduler.create("main");
    let config = dashboard_config().with_axis(Axis::Horizontal, AxisConfig::new(5.0, 10.0, 10.0));
    scheduler.set_config(grid, config)?;
    scheduler.flush();
    assert!((target_total(&scheduler, grid, Axis::Horizontal) + 30.0 - 300.0).abs() < EPSILON);

    let offsets: Vec<Option<f32>> = scheduler
        .grid(grid)
        .map(|layout| (0..3).map(|index| layout.tracks(Axis::Horizontal).offset(index)).collect())
        .unwrap_or_default();
    assert_eq!(offsets, vec![Some(10.0), Some(95.0), Some(190.0)]);
    Ok(())
}

#[test]
fn undersized_container_overflows_at_minimums() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(100.0)?;
    scheduler.flush();
    assert_eq!(
        targets(&scheduler, grid, Axis::Horizontal),
        vec![Some(50.0), Some(30.0), Some(50.0)]
    );
    Ok(())
}

#[test]
fn hidden_column_takes_no_space_and_no_spacing() -> Result<(), ConfigError> {
    init_logging();
    let mut provider = dashboard_provider(300.0, 100.0);
    provider.set_hidden("middle", true);
    let mut scheduler = Scheduler::new(provider);
    let grid = scheduler.create("main");
    let config = GridConfig::new(
        vec![TrackConfig::new(0.0); 3],
        vec![TrackConfig::new(1.0)],
        vec![
            Some(ItemConfig::element("left")),
            Some(ItemConfig::element("middle")),
            Some(ItemConfig::element("right")),
        ],
    )
    .with_axis(Axis::Horizontal, AxisConfig::new(10.0, 0.0, 0.0));
    scheduler.set_config(grid, config)?;
    scheduler.flush();

    let layout = scheduler.grid(grid);
    let columns = layout.map(|layout| layout.tracks(Axis::Horizontal));
    assert!(columns.is_some_and(|tracks| (tracks.preferred_size(1) + 1.0).abs() < EPSILON));
    assert!(columns.is_some_and(|tracks| (tracks.minimum_size(1) + 1.0).abs() < EPSILON));
    assert_eq!(
        targets(&scheduler, grid, Axis::Horizontal),
        vec![Some(135.0), None, Some(155.0)]
    );
    assert_eq!(columns.and_then(|tracks| tracks.offset(2)), Some(145.0));
    assert_eq!(layout.and_then(|layout| layout.item(0, 1)).and_then(|item| item.resolved_box()), None);
    Ok(())
}

#[test]
fn spanning_overflow_follows_stretch_factors() -> Result<(), ConfigError> {
    init_logging();
    let provider = MemoryProvider::new()
        .with_occupant("a", (50.0, 20.0), (0.0, 0.0))
        .with_occupant("b", (50.0, 20.0), (0.0, 0.0))
        .with_occupant("wide", (130.0, 20.0), (0.0, 0.0))
        .with_container("main", 130.0, 40.0);
    let mut scheduler = Scheduler::new(provider);
    let grid = scheduler.create("main");
    let config = GridConfig::new(
        vec![TrackConfig::new(1.0), TrackConfig::new(2.0)],
        vec![TrackConfig::new(0.0); 2],
        vec![
            Some(ItemConfig::element("a")),
            Some(ItemConfig::element("b")),
            Some(ItemConfig::element("wide").span(1, 2)),
            None,
        ],
    );
    scheduler.set_config(grid, config)?;
    scheduler.flush();

    let columns = scheduler.grid(grid).map(|layout| layout.tracks(Axis::Horizontal));
    assert!(columns.is_some_and(|tracks| (tracks.preferred_size(0) - 60.0).abs() < EPSILON));
    assert!(columns.is_some_and(|tracks| (tracks.preferred_size(1) - 70.0).abs() < EPSILON));
    assert_eq!(
        targets(&scheduler, grid, Axis::Horizontal),
        vec![Some(60.0), Some(70.0)]
    );
    Ok(())
}

#[test]
fn items_are_placed_inside_their_cells() -> Result<(), ConfigError> {
    let (mut scheduler, grid) = dashboard(300.0)?;
    scheduler.flush();
    let middle = scheduler
        .grid(grid)
        .and_then(|layout| layout.item(0, 1))
        .and_then(|item| item.resolved_box());
    assert!(close(middle.map(|bounds| bounds.x), 80.0));
    assert!(close(middle.map(|bounds| bounds.width), 120.0));
    assert!(close(middle.map(|bounds| bounds.height), 100.0));
    let provider = scheduler.provider();
    assert_eq!(
        provider.resolved_offset(&"right".into(), Axis::Horizontal),
        Some(200.0)
    );
    assert_eq!(provider.resolved_size(&"right".into(), Axis::Horizontal), Some(100.0));
    Ok(())
}
