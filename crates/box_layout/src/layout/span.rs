//! Spanning items: spread what the covered tracks do not already hold.

use smallvec::SmallVec;

use crate::axis::Axis;
use crate::distribute::proportional_shares;
use crate::item::ItemModel;
use crate::track::TrackModel;

/// Grow the tracks covered by each visible spanning item until they hold the
/// item's minimum and preferred size, gaps between them included.
///
/// Items are processed from the narrowest span up. Excess goes to the covered
/// visible tracks in proportion to their stretch factors, or equally when none
/// of them stretches. Tracks only ever grow here.
pub(super) fn resolve_spanning(tracks: &mut TrackModel, items: &[Option<ItemModel>], axis: Axis) {
    let mut spanning: Vec<&ItemModel> = items
        .iter()
        .flatten()
        .filter(|item| !item.is_hidden() && item.span(axis) > 1)
        .collect();
    spanning.sort_by_key(|item| item.span(axis));

    for item in spanning {
        let start = item.start(axis);
        let covered: SmallVec<usize, 4> = (start..start + item.span(axis))
            .filter(|index| tracks.is_visible(*index))
            .collect();
        if covered.is_empty() {
            continue;
        }
        let gaps = tracks.gaps_between(&covered);
        let weights = tracks.stretch_factors(&covered);
        spread_excess(&mut tracks.minimum, &covered, &weights, item.minimum(axis) - gaps);
        spread_excess(&mut tracks.preferred, &covered, &weights, item.preferred(axis) - gaps);
        for index in &covered {
            let floor = tracks.minimum_size(*index);
            if let Some(preferred) = tracks.preferred.get_mut(*index) {
                *preferred = preferred.max(floor);
            }
        }
    }
}

fn spread_excess(sizes: &mut [f32], covered: &[usize], weights: &[f32], needed: f32) {
    let held: f32 = covered.iter().filter_map(|index| sizes.get(*index)).sum();
    let excess = needed - held;
    if excess <= 0.0 {
        return;
    }
    tracing::debug!("spanning excess {excess} over tracks {covered:?}");
    for (index, share) in covered.iter().zip(proportional_shares(excess, weights)) {
        if let Some(size) = sizes.get_mut(*index) {
            *size += share;
        }
    }
}
