//! Measure pass: content-driven preferred and minimum track sizes.

use super::span::resolve_spanning;
use super::{GridLayout, MeasurePass};
use crate::axis::Axis;
use crate::item::{DirtyLevel, ItemModel};
use crate::linkage::SizeReport;
use crate::provider::MeasurementProvider;

impl GridLayout {
    /// Re-measure dirty items along `axis` and rebuild the track sizes and totals.
    ///
    /// Nested grids must already have been measured on `axis` in this run.
    /// Returns the totals owed to the host grid when they changed since the
    /// last report, or unconditionally on a full pass.
    pub fn measure<P: MeasurementProvider>(
        &mut self,
        axis: Axis,
        pass: MeasurePass,
        provider: &mut P,
    ) -> Option<SizeReport> {
        self.measured_in_run.set(axis, pass.run);
        self.drop_missing_occupants(provider);

        let count = self.tracks.get(axis).len();
        let mut occupied = vec![false; count];
        let mut shown = vec![false; count];
        for item in self.items.iter_mut().flatten() {
            let was_hidden = item.hidden;
            item.hidden = provider.is_hidden(item.id());
            let visible = !item.hidden;
            let start = item.start(axis);
            for track in start..start + item.span(axis) {
                if let Some(flag) = occupied.get_mut(track) {
                    *flag = true;
                }
                if let Some(flag) = shown.get_mut(track).filter(|_| visible) {
                    *flag = true;
                }
            }
            if !visible {
                continue;
            }
            if was_hidden {
                item.mark_dirty_along(axis, DirtyLevel::SizeOnly);
            }
            let taken = item.take_dirty(axis);
            let level = if pass.full { DirtyLevel::Full } else { taken };
            if level != DirtyLevel::Clean {
                measure_item(item, axis, level, provider);
            }
        }

        let tracks = self.tracks.get_mut(axis);
        tracks.begin_measure();
        for (index, (occupied, shown)) in occupied.into_iter().zip(shown).enumerate() {
            if occupied && !shown {
                tracks.mark_hidden(index);
            }
        }
        for item in self.items.iter().flatten().filter(|item| !item.hidden && item.span(axis) == 1) {
            tracks.include(item.start(axis), item.preferred(axis), item.minimum(axis));
        }
        tracks.settle_minimums();
        tracks.compute_handles();
        resolve_spanning(tracks, &self.items, axis);
        tracks.compute_totals();

        tracing::debug!(
            "measure {:?} {}: preferred={:?} minimum={:?} total_preferred={} total_minimum={}",
            axis,
            self.container,
            tracks.preferred,
            tracks.minimum,
            tracks.total_preferred,
            tracks.total_minimum
        );

        self.pending_report(axis, pass.full)
    }

    fn drop_missing_occupants<P: MeasurementProvider>(&mut self, provider: &P) {
        for slot in &mut self.items {
            let Some(item) = slot.take_if(|item| !provider.is_attached(item.id())) else {
                continue;
            };
            log::debug!("Dropping occupant {} of {}: no longer attached", item.id(), self.container);
        }
    }
}

fn measure_item<P: MeasurementProvider>(item: &mut ItemModel, axis: Axis, level: DirtyLevel, provider: &mut P) {
    match item.nested_totals.value(axis) {
        Some(totals) if item.is_laid_out_as_nested_grid() => measure_nested(item, axis, level, totals),
        _ => measure_leaf(item, axis, level, provider),
    }
}

fn measure_leaf<P: MeasurementProvider>(item: &mut ItemModel, axis: Axis, level: DirtyLevel, provider: &mut P) {
    if level == DirtyLevel::Full && item.has_override_set.value(axis) {
        provider.clear_resolved_size(item.id(), axis);
        item.has_override_set.set(axis, false);
    }
    let margin = item.margin.value(axis);
    if level == DirtyLevel::Full || !item.minimum_known.value(axis) {
        let minimum = provider.declared_minimum_size(item.id(), axis).max(0.0);
        item.minimum.set(axis, minimum + margin);
        item.minimum_known.set(axis, true);
    }
    let natural = provider.natural_preferred_size(item.id(), axis).max(0.0);
    item.natural.set(axis, natural);
    let preferred = item.size_hint.value(axis).map_or(natural, |hint| hint.max(natural)) + margin;
    item.preferred.set(axis, preferred.max(item.minimum.value(axis)));
}

/// A nested grid is sized from its reported totals. While stretched, the size
/// last pushed down holds so the host does not flicker between the two.
fn measure_nested(item: &mut ItemModel, axis: Axis, level: DirtyLevel, (preferred, minimum): (f32, f32)) {
    let margin = item.margin.value(axis);
    let preferred = match item.imposed.value(axis) {
        Some(imposed) if item.stretched.value(axis) && level < DirtyLevel::Full => preferred.max(imposed),
        _ => preferred,
    }
    .max(0.0);
    let minimum = minimum.max(0.0) + margin;
    item.minimum.set(axis, minimum);
    item.minimum_known.set(axis, true);
    item.natural.set(axis, preferred);
    item.preferred.set(axis, (preferred + margin).max(minimum));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, ItemConfig, TrackConfig};
    use crate::item::OccupantId;
    use crate::provider::{MemoryProvider, OccupantMetrics};
    use crate::track::HIDDEN_TRACK;

    const EPSILON: f32 = 1e-4;

    fn layout(provider: &mut MemoryProvider, config: GridConfig) -> GridLayout {
        GridLayout::configured("root", config, provider)
            .ok()
            .unwrap_or_else(|| GridLayout::new("root"))
    }

    fn pass(run: u64) -> MeasurePass {
        MeasurePass { full: false, run }
    }

    #[test]
    fn track_takes_largest_item_and_minimum_wins() {
        let mut provider = MemoryProvider::new()
            .with_occupant("small", (40.0, 10.0), (10.0, 5.0))
            .with_occupant("stubborn", (20.0, 10.0), (60.0, 5.0));
        let config = GridConfig::new(
            vec![TrackConfig::new(0.0)],
            vec![TrackConfig::new(0.0); 2],
            vec![Some(ItemConfig::element("small")), Some(ItemConfig::element("stubborn"))],
        );
        let mut grid = layout(&mut provider, config);
        let report = grid.measure(Axis::Horizontal, pass(1), &mut provider);
        assert_eq!(report, None);
        let tracks = grid.tracks(Axis::Horizontal);
        assert!((tracks.minimum_size(0) - 60.0).abs() < EPSILON);
        assert!((tracks.preferred_size(0) - 60.0).abs() < EPSILON);
    }

    #[test]
    fn clean_items_reuse_cache_and_size_only_keeps_minimum() {
        let mut provider = MemoryProvider::new().with_occupant("chart", (100.0, 50.0), (30.0, 20.0));
        let config = GridConfig::new(
            vec![TrackConfig::new(1.0)],
            vec![TrackConfig::new(1.0)],
            vec![Some(ItemConfig::element("chart"))],
        );
        let mut grid = layout(&mut provider, config);
        grid.measure(Axis::Horizontal, pass(1), &mut provider);
        assert_eq!(provider.minimum_queries(), 1);

        provider.set_metrics("chart", OccupantMetrics::new((140.0, 50.0), (80.0, 20.0)));
        grid.measure(Axis::Horizontal, pass(2), &mut provider);
        assert!((grid.tracks(Axis::Horizontal).preferred_size(0) - 100.0).abs() < EPSILON);

        grid.mark_occupant_dirty(&OccupantId::from("chart"), DirtyLevel::SizeOnly);
        grid.measure(Axis::Horizontal, pass(3), &mut provider);
        assert_eq!(provider.minimum_queries(), 1);
        assert!((grid.tracks(Axis::Horizontal).preferred_size(0) - 140.0).abs() < EPSILON);
        assert!((grid.tracks(Axis::Horizontal).minimum_size(0) - 30.0).abs() < EPSILON);

        grid.mark_items_dirty(&[(0, 0)]);
        grid.measure(Axis::Horizontal, pass(4), &mut provider);
        assert_eq!(provider.minimum_queries(), 2);
        assert!((grid.tracks(Axis::Horizontal).minimum_size(0) - 80.0).abs() < EPSILON);
    }

    #[test]
    fn hidden_items_keep_their_dirty_level() {
        let mut provider = MemoryProvider::new().with_occupant("ghost", (50.0, 50.0), (0.0, 0.0));
        provider.set_hidden("ghost", true);
        let config = GridConfig::new(
            vec![TrackConfig::new(0.0)],
            vec![TrackConfig::new(0.0)],
            vec![Some(ItemConfig::element("ghost"))],
        );
        let mut grid = layout(&mut provider, config);
        grid.measure(Axis::Horizontal, pass(1), &mut provider);
        assert!((grid.tracks(Axis::Horizontal).minimum_size(0) - HIDDEN_TRACK).abs() < EPSILON);
        assert_eq!(
            grid.item(0, 0).map(|item| item.dirty_level(Axis::Horizontal)),
            Some(DirtyLevel::Full)
        );
    }

    #[test]
    fn detached_occupants_are_dropped() {
        let mut provider = MemoryProvider::new().with_occupant("gone", (50.0, 50.0), (0.0, 0.0));
        let config = GridConfig::new(
            vec![TrackConfig::new(0.0)],
            vec![TrackConfig::new(0.0)],
            vec![Some(ItemConfig::element("gone"))],
        );
        let mut grid = layout(&mut provider, config);
        provider.detach("gone");
        grid.measure(Axis::Horizontal, pass(1), &mut provider);
        assert!(grid.item(0, 0).is_none());
        assert!(grid.tracks(Axis::Horizontal).is_visible(0));
    }

    #[test]
    fn margin_and_size_hint_feed_preferred_size() {
        let mut provider = MemoryProvider::new().with_occupant("field", (80.0, 20.0), (10.0, 10.0));
        let config = GridConfig::new(
            vec![TrackConfig::new(0.0)],
            vec![TrackConfig::new(0.0)],
            vec![Some(
                ItemConfig::element("field")
                    .with_margin(8.0, 4.0)
                    .with_size_hint(Axis::Horizontal, 120.0),
            )],
        );
        let mut grid = layout(&mut provider, config);
        grid.measure(Axis::Horizontal, pass(1), &mut provider);
        grid.measure(Axis::Vertical, pass(1), &mut provider);
        assert!((grid.tracks(Axis::Horizontal).preferred_size(0) - 128.0).abs() < EPSILON);
        assert!((grid.tracks(Axis::Horizontal).minimum_size(0) - 18.0).abs() < EPSILON);
        assert!((grid.tracks(Axis::Vertical).preferred_size(0) - 24.0).abs() < EPSILON);
    }
}
