//! Apply pass: distribute the available size and place the occupants.

use smallvec::SmallVec;

use super::GridLayout;
use crate::axis::Axis;
use crate::config::{Alignment, TrackConfig};
use crate::distribute::{grow_by_weight, shrink_toward_minimum};
use crate::linkage::SizePush;
use crate::provider::MeasurementProvider;
use crate::resize::ResizePreview;
use crate::track::TrackModel;

/// Leftover below this is float noise rather than overflow.
const OVERFLOW_TOLERANCE: f32 = 1e-3;

impl GridLayout {
    /// Distribute the available size along `axis` and resolve every visible
    /// occupant's size and offset on that axis.
    ///
    /// Sizes resolved for linked nested grids are appended to `pushes`.
    /// Returns `false` when the container is no longer attached; nothing is
    /// touched in that case.
    pub fn apply<P: MeasurementProvider>(&mut self, axis: Axis, provider: &mut P, pushes: &mut Vec<SizePush>) -> bool {
        if !provider.is_attached(&self.container) {
            log::debug!("Container {} is gone", self.container);
            return false;
        }
        let available = self.available_size(axis, provider);
        let preview = self.preview.filter(|preview| preview.axis == axis);
        let tracks = self.tracks.get_mut(axis);
        distribute(tracks, available, preview.as_ref());
        position_tracks(tracks);
        self.place_items(axis, provider, pushes);
        true
    }

    fn available_size<P: MeasurementProvider>(&self, axis: Axis, provider: &mut P) -> f32 {
        if let Some(imposed) = self.imposed.value(axis) {
            return imposed;
        }
        let tracks = self.tracks.get(axis);
        let settings = tracks.settings();
        let capped = |size: f32| {
            if settings.max_total_size > 0.0 {
                size.min(settings.max_total_size)
            } else {
                size
            }
        };
        if settings.fit_content {
            let size = capped(tracks.total_preferred_size());
            provider.set_resolved_size(&self.container, axis, size);
            size
        } else {
            capped(provider.available_size(&self.container, axis))
        }
    }

    fn place_items<P: MeasurementProvider>(&mut self, axis: Axis, provider: &mut P, pushes: &mut Vec<SizePush>) {
        let tracks = self.tracks.get(axis);
        let mirrored = self.config.mirrored && axis == Axis::Horizontal;
        for item in self.items.iter_mut().flatten() {
            let start = item.start(axis);
            let covered: SmallVec<usize, 4> = (start..start + item.span(axis))
                .filter(|index| tracks.is_visible(*index))
                .collect();
            let first = covered.first().and_then(|index| tracks.offset(*index));
            let Some(area_start) = first.filter(|_| !item.hidden) else {
                item.placed.set(axis, None);
                continue;
            };
            let area = covered
                .iter()
                .filter_map(|index| tracks.target_size(*index))
                .sum::<f32>()
                + tracks.gaps_between(&covered);
            let margin = item.margin.value(axis);
            let inner = (area - margin).max(0.0);
            let natural = (item.preferred(axis) - margin).max(0.0);
            let align = item.align.get(axis);

            let (size, lead) = if align != Alignment::Stretch && natural < inner {
                if item.has_override_set.value(axis) {
                    provider.clear_resolved_size(item.id(), axis);
                    item.has_override_set.set(axis, false);
                }
                let slack = inner - natural;
                let lead = match align {
                    Alignment::Center => slack / 2.0,
                    Alignment::End => slack,
                    Alignment::Start | Alignment::Stretch => 0.0,
                };
                (natural, lead)
            } else {
                provider.set_resolved_size(item.id(), axis, inner);
                item.has_override_set.set(axis, true);
                (inner, 0.0)
            };

            let logical = area_start + margin / 2.0 + lead;
            let position = if mirrored {
                tracks.available - logical - size
            } else {
                logical
            };
            provider.set_resolved_offset(item.id(), axis, position);
            item.placed.set(axis, Some((position, size)));
            item.stretched.set(
                axis,
                align == Alignment::Stretch && covered.iter().any(|index| tracks.is_stretched(*index)),
            );
            if let Some(grid) = item.occupant.nested_grid() {
                item.imposed.set(axis, Some(size));
                pushes.push(SizePush { grid, axis, size });
            }
        }
    }
}

fn set_target(tracks: &mut TrackModel, index: usize, size: f32) {
    if let Some(target) = tracks.target.get_mut(index) {
        *target = size.max(0.0);
    }
}

/// Assign a target size to every visible track.
///
/// Fixed tracks (committed drags, declared initial sizes, drag previews) are
/// served first; the rest is split between stretchable and rigid tracks.
fn distribute(tracks: &mut TrackModel, available: f32, preview: Option<&ResizePreview>) {
    tracks.available = available;
    tracks.stretched.fill(false);
    let visible: Vec<usize> = tracks.visible().collect();
    let content = available - tracks.margins_total();
    let minimum_total: f32 = visible.iter().map(|index| tracks.minimum_size(*index)).sum();
    if content < minimum_total {
        tracing::debug!("distribute: content {content} below minimums {minimum_total}, overflowing");
        for index in visible {
            let minimum = tracks.minimum_size(index);
            set_target(tracks, index, minimum);
        }
        return;
    }

    let mut fixed = Vec::new();
    let mut fixed_sizes = Vec::new();
    let mut flexible = Vec::new();
    for index in visible {
        let pinned = preview
            .and_then(|preview| preview.size_of(index))
            .or_else(|| tracks.fixed_size(index, content));
        if let Some(size) = pinned {
            fixed.push(index);
            fixed_sizes.push(size.max(tracks.minimum_size(index)));
        } else {
            flexible.push(index);
        }
    }

    let flexible_minimum: f32 = flexible.iter().map(|index| tracks.minimum_size(*index)).sum();
    let fixed_total: f32 = fixed_sizes.iter().sum();
    let budget = content - flexible_minimum;
    if fixed_total > budget {
        let minimums: Vec<f32> = fixed.iter().map(|index| tracks.minimum_size(*index)).collect();
        let overflow = shrink_toward_minimum(&mut fixed_sizes, &minimums, fixed_total - budget);
        report_overflow(overflow);
    }
    let remaining = content - fixed_sizes.iter().sum::<f32>();
    if let Some(last) = fixed_sizes.last_mut().filter(|_| flexible.is_empty()) {
        *last += remaining;
    }
    for (index, size) in fixed.iter().zip(&fixed_sizes) {
        set_target(tracks, *index, *size);
    }
    if !flexible.is_empty() {
        distribute_flexible(tracks, &flexible, remaining);
    }
}

fn distribute_flexible(tracks: &mut TrackModel, flexible: &[usize], remaining: f32) {
    let (stretchable, rigid): (Vec<usize>, Vec<usize>) = flexible
        .iter()
        .partition(|index| tracks.config(**index).is_some_and(TrackConfig::is_stretchable));
    let preferred = |indices: &[usize]| -> Vec<f32> { indices.iter().map(|index| tracks.preferred_size(*index)).collect() };
    let minimum = |indices: &[usize]| -> Vec<f32> { indices.iter().map(|index| tracks.minimum_size(*index)).collect() };

    let mut rigid_sizes = preferred(&rigid);
    let rigid_preferred: f32 = rigid_sizes.iter().sum();
    let stretch_preferred: f32 = preferred(&stretchable).iter().sum();
    let stretch_minimum: f32 = minimum(&stretchable).iter().sum();

    let mut stretch_sizes;
    let mut grown = Vec::new();
    if remaining >= rigid_preferred + stretch_minimum {
        stretch_sizes = preferred(&stretchable);
        if remaining >= rigid_preferred + stretch_preferred {
            let surplus = remaining - rigid_preferred - stretch_preferred;
            tracing::debug!("distribute: enlarging by {surplus}");
            if stretchable.is_empty() {
                grow_by_weight(&mut rigid_sizes, &vec![1.0; rigid.len()], surplus);
                grown.clone_from(&rigid);
            } else {
                grow_by_weight(&mut stretch_sizes, &tracks.stretch_factors(&stretchable), surplus);
                grown.clone_from(&stretchable);
            }
        } else {
            let deficit = rigid_preferred + stretch_preferred - remaining;
            tracing::debug!("distribute: shrinking stretchable tracks by {deficit}");
            let overflow = shrink_toward_minimum(&mut stretch_sizes, &minimum(&stretchable), deficit);
            report_overflow(overflow);
        }
    } else {
        stretch_sizes = minimum(&stretchable);
        let deficit = rigid_preferred + stretch_minimum - remaining;
        tracing::debug!("distribute: stretchable tracks at minimum, shrinking rigid tracks by {deficit}");
        let overflow = shrink_toward_minimum(&mut rigid_sizes, &minimum(&rigid), deficit);
        report_overflow(overflow);
    }

    for (index, size) in stretchable.iter().zip(stretch_sizes).chain(rigid.iter().zip(rigid_sizes)) {
        set_target(tracks, *index, size);
        let grew = grown.contains(index) && size > tracks.preferred_size(*index) + f32::EPSILON;
        if let Some(flag) = tracks.stretched.get_mut(*index) {
            *flag = grew;
        }
    }
}

fn report_overflow(overflow: f32) {
    if overflow > OVERFLOW_TOLERANCE {
        tracing::debug!("distribute: {overflow} left over with every track at its minimum");
    }
}

/// Offsets of the visible tracks, margins and gaps included.
fn position_tracks(tracks: &mut TrackModel) {
    let visible: Vec<usize> = tracks.visible().collect();
    let mut position = tracks.settings().margin_start;
    for (order, index) in visible.iter().enumerate() {
        if let Some(offset) = tracks.offset.get_mut(*index) {
            *offset = position;
        }
        position += tracks.target.get(*index).copied().unwrap_or_default();
        if order + 1 < visible.len() {
            position += tracks.gap_after(*index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisConfig, Resizable};

    const EPSILON: f32 = 1e-4;

    fn tracks(specs: &[(f32, f32, f32)], spacing: f32) -> TrackModel {
        let mut model = TrackModel::new(
            specs.iter().map(|(stretch, ..)| TrackConfig::new(*stretch)).collect(),
            AxisConfig::new(spacing, 0.0, 0.0),
            0.0,
        );
        for (index, (_, preferred, minimum)) in specs.iter().enumerate() {
            model.include(index, *preferred, *minimum);
        }
        model.settle_minimums();
        model.compute_handles();
        model.compute_totals();
        model
    }

    fn targets(model: &TrackModel) -> Vec<Option<f32>> {
        (0..model.len()).map(|index| model.target_size(index)).collect()
    }

    const COLUMNS: [(f32, f32, f32); 3] = [(0.0, 80.0, 50.0), (1.0, 60.0, 30.0), (0.0, 100.0, 50.0)];

    #[test]
    fn surplus_goes_to_stretchable_tracks() {
        let mut model = tracks(&COLUMNS, 0.0);
        distribute(&mut model, 300.0, None);
        assert_eq!(targets(&model), vec![Some(80.0), Some(120.0), Some(100.0)]);
        assert!(model.is_stretched(1));
        assert!(!model.is_stretched(0));
    }

    #[test]
    fn deficit_pins_stretchable_at_minimum_and_shrinks_rigid() {
        let mut model = tracks(&COLUMNS, 0.0);
        distribute(&mut model, 200.0, None);
        assert_eq!(targets(&model), vec![Some(76.0), Some(30.0), Some(94.0)]);
    }

    #[test]
    fn moderate_deficit_shrinks_stretchable_only() {
        let mut model = tracks(&COLUMNS, 0.0);
        distribute(&mut model, 230.0, None);
        assert_eq!(targets(&model), vec![Some(80.0), Some(50.0), Some(100.0)]);
    }

    #[test]
    fn undersized_container_falls_back_to_minimums() {
        let mut model = tracks(&COLUMNS, 5.0);
        distribute(&mut model, 100.0, None);
        assert_eq!(targets(&model), vec![Some(50.0), Some(30.0), Some(50.0)]);
    }

    #[test]
    fn without_stretchable_tracks_surplus_is_shared_equally() {
        let mut model = tracks(&[(0.0, 40.0, 0.0), (0.0, 60.0, 0.0)], 10.0);
        distribute(&mut model, 130.0, None);
        assert_eq!(targets(&model), vec![Some(50.0), Some(70.0)]);
        position_tracks(&mut model);
        assert_eq!(model.offset(1), Some(60.0));
    }

    #[test]
    fn declared_initial_size_is_fixed_when_a_handle_is_adjacent() {
        let mut model = TrackModel::new(
            vec![
                TrackConfig::new(0.0).with_resizable(Resizable::Initial {
                    size: 25.0,
                    is_percent: true,
                }),
                TrackConfig::new(1.0).with_resizable(Resizable::Auto),
            ],
            AxisConfig::default(),
            0.0,
        );
        model.include(0, 10.0, 0.0);
        model.include(1, 10.0, 0.0);
        model.compute_handles();
        model.compute_totals();
        distribute(&mut model, 400.0, None);
        assert_eq!(targets(&model), vec![Some(100.0), Some(300.0)]);
    }

    #[test]
    fn oversized_fixed_tracks_yield_to_flexible_minimums() {
        let mut model = TrackModel::new(
            vec![
                TrackConfig::new(0.0).with_resizable(Resizable::Auto),
                TrackConfig::new(1.0).with_resizable(Resizable::Auto),
            ],
            AxisConfig::default(),
            0.0,
        );
        model.include(0, 10.0, 20.0);
        model.include(1, 10.0, 40.0);
        model.settle_minimums();
        model.compute_handles();
        model.set_fixed_override(0, 180.0);
        distribute(&mut model, 200.0, None);
        let first = model.target_size(0).unwrap_or_default();
        let second = model.target_size(1).unwrap_or_default();
        assert!((first - 160.0).abs() < EPSILON);
        assert!((second - 40.0).abs() < EPSILON);
    }

    #[test]
    fn preview_pins_both_neighbours() {
        let mut model = tracks(&COLUMNS, 0.0);
        let preview = ResizePreview {
            axis: Axis::Horizontal,
            handle: 0,
            sizes: (95.0, 105.0),
        };
        distribute(&mut model, 300.0, Some(&preview));
        assert_eq!(targets(&model), vec![Some(95.0), Some(105.0), Some(100.0)]);
    }

    /// Deterministic xorshift stream for the fractional sweep.
    struct Sweep(u32);

    impl Sweep {
        fn next(&mut self) -> u32 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            self.0
        }

        /// A multiple of 0.25 in `[0, limit)`.
        fn quarters(&mut self, limit: u32) -> f32 {
            (self.next() % (limit * 4)) as f32 / 4.0
        }
    }

    #[test]
    fn fractional_sizes_fill_the_container_exactly() {
        let mut sweep = Sweep(0x9e37_79b9);
        for _ in 0..500 {
            let specs: Vec<(f32, f32, f32)> = (0..4)
                .map(|_| {
                    let stretch = (sweep.next() % 2) as f32;
                    let preferred = 1.0 + sweep.quarters(160);
                    let minimum = (preferred - sweep.quarters(160)).max(0.0);
                    (stretch, preferred, minimum)
                })
                .collect();
            let mut model = tracks(&specs, 2.5);
            let minimum_total = model.total_minimum_size();
            let available = (minimum_total + sweep.quarters(400)).ceil();
            distribute(&mut model, available, None);

            let assigned: f32 = (0..model.len()).filter_map(|index| model.target_size(index)).sum();
            assert!(
                (assigned + model.margins_total() - available).abs() < 1e-3,
                "{specs:?} in {available}: {:?}",
                targets(&model)
            );
            for (index, (_, _, minimum)) in specs.iter().enumerate() {
                assert!(model.target_size(index).unwrap_or_default() >= *minimum - 1e-3);
            }
        }
    }

    #[test]
    fn fractional_rigid_shrink_is_conserved() {
        let mut model = tracks(
            &[(1.0, 157.25, 73.5), (1.0, 155.75, 67.5), (1.0, 71.25, 2.5), (1.0, 77.0, 39.0)],
            0.0,
        );
        distribute(&mut model, 282.0, None);
        let assigned: f32 = (0..4).filter_map(|index| model.target_size(index)).sum();
        assert!((assigned - 282.0).abs() < EPSILON);
    }
}
