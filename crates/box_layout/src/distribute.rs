//! Proportional space distribution with carry-forward rounding.
//!
//! Shares are rounded against a running cumulative total rather than one by
//! one, so rounding error never accumulates; the last weighted share takes the
//! exact remainder and the shares always sum to the amount distributed.

/// Split a non-negative `amount` across `weights`.
///
/// Falls back to equal weights when no weight is positive; otherwise entries
/// without a positive weight get exactly nothing. Shares are whole units
/// except the last weighted one, which absorbs whatever is left. No share is
/// negative.
pub fn proportional_shares(amount: f32, weights: &[f32]) -> Vec<f32> {
    let positive_total: f32 = weights.iter().map(|weight| weight.max(0.0)).sum();
    let equal = positive_total <= 0.0;
    let effective: Vec<f32> = weights
        .iter()
        .map(|weight| if equal { 1.0 } else { weight.max(0.0) })
        .collect();
    let Some(last) = effective.iter().rposition(|weight| *weight > 0.0) else {
        return Vec::new();
    };
    if amount <= 0.0 {
        return vec![0.0; weights.len()];
    }
    let total_weight = if equal { weights.len() as f32 } else { positive_total };

    let mut cumulative = 0.0f32;
    let mut assigned = 0.0f32;
    effective
        .iter()
        .enumerate()
        .map(|(index, weight)| {
            if *weight <= 0.0 {
                return 0.0;
            }
            cumulative += amount * weight / total_weight;
            let share = if index == last {
                amount - assigned
            } else {
                (cumulative.round().min(amount) - assigned).max(0.0)
            };
            assigned += share;
            share
        })
        .collect()
}

/// Grow `sizes` by `surplus`, in proportion to `weights`.
pub fn grow_by_weight(sizes: &mut [f32], weights: &[f32], surplus: f32) {
    if surplus <= 0.0 {
        return;
    }
    for (size, share) in sizes.iter_mut().zip(proportional_shares(surplus, weights)) {
        *size += share;
    }
}

/// Shrink `sizes` toward `minimums` by `deficit`, in proportion to each
/// entry's room `size - minimum`.
///
/// Entries that hit their minimum are frozen and the rest of the deficit is
/// spread over the others. Returns the part of the deficit that could not be
/// absorbed because every entry reached its minimum.
pub fn shrink_toward_minimum(sizes: &mut [f32], minimums: &[f32], deficit: f32) -> f32 {
    let mut remaining = deficit;
    for _ in 0..sizes.len() {
        if remaining <= f32::EPSILON {
            return 0.0;
        }
        let rooms = room_left(sizes, minimums);
        let total_room: f32 = rooms.iter().sum();
        if total_room <= f32::EPSILON {
            return remaining.max(0.0);
        }
        if remaining >= total_room {
            for (size, minimum) in sizes.iter_mut().zip(minimums) {
                *size = size.min(*minimum);
            }
            return remaining - total_room;
        }
        let shares = proportional_shares(remaining, &rooms);
        let mut applied = 0.0f32;
        for ((size, minimum), share) in sizes.iter_mut().zip(minimums).zip(shares) {
            let shrunk = (*size - share).max(*minimum);
            applied += *size - shrunk;
            *size = shrunk;
        }
        remaining -= applied;
    }

    // Rounded shares that overshot a frozen entry leave a residual; take it
    // from the last entries that still have room.
    let rooms = room_left(sizes, minimums);
    for (size, room) in sizes.iter_mut().zip(rooms).rev() {
        if remaining <= f32::EPSILON {
            return 0.0;
        }
        let taken = room.min(remaining);
        *size -= taken;
        remaining -= taken;
    }
    remaining.max(0.0)
}

fn room_left(sizes: &[f32], minimums: &[f32]) -> Vec<f32> {
    sizes
        .iter()
        .zip(minimums)
        .map(|(size, minimum)| (size - minimum).max(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn shares_follow_weights() {
        let shares = proportional_shares(30.0, &[1.0, 2.0]);
        assert_eq!(shares, vec![10.0, 20.0]);
    }

    #[test]
    fn zero_weights_split_equally() {
        let shares = proportional_shares(9.0, &[0.0, 0.0, 0.0]);
        assert_eq!(shares, vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn rounding_does_not_drift() {
        let shares = proportional_shares(10.0, &[1.0, 1.0, 1.0]);
        let total: f32 = shares.iter().sum();
        assert!((total - 10.0).abs() < EPSILON);
        assert!(shares.iter().all(|share| (share - share.round()).abs() < EPSILON));
    }

    #[test]
    fn fractional_amount_lands_on_last_share() {
        let shares = proportional_shares(10.5, &[1.0, 1.0]);
        assert_eq!(shares.first().copied(), Some(5.0));
        assert!((shares.get(1).copied().unwrap_or_default() - 5.5).abs() < EPSILON);
    }

    #[test]
    fn shrink_is_proportional_to_room() {
        let mut sizes = [80.0, 100.0];
        let leftover = shrink_toward_minimum(&mut sizes, &[50.0, 50.0], 10.0);
        assert!(leftover.abs() < EPSILON);
        // Rooms 30 and 50: 3.75 rounds to 4, the rest lands on the second track.
        assert_eq!(sizes, [76.0, 94.0]);
    }

    #[test]
    fn shrink_freezes_at_minimum_and_reports_overflow() {
        let mut sizes = [60.0, 40.0];
        let leftover = shrink_toward_minimum(&mut sizes, &[50.0, 30.0], 35.0);
        assert_eq!(sizes, [50.0, 30.0]);
        assert!((leftover - 15.0).abs() < EPSILON);
    }

    #[test]
    fn shrink_handles_fractional_room() {
        let mut sizes = [10.4, 100.0];
        let leftover = shrink_toward_minimum(&mut sizes, &[10.0, 0.0], 50.0);
        assert!(leftover.abs() < EPSILON);
        let total: f32 = sizes.iter().sum();
        assert!((total - 60.4).abs() < EPSILON);
        assert!(sizes.first().copied().unwrap_or_default() >= 10.0);
    }

    #[test]
    fn grow_adds_surplus_by_weight() {
        let mut sizes = [60.0, 10.0];
        grow_by_weight(&mut sizes, &[1.0, 3.0], 40.0);
        assert_eq!(sizes, [70.0, 40.0]);
    }

    #[test]
    fn trailing_zero_weight_gets_nothing() {
        let shares = proportional_shares(10.5, &[1.0, 0.0]);
        assert_eq!(shares, vec![10.5, 0.0]);

        let shares = proportional_shares(7.25, &[2.0, 0.0, 1.0, 0.0]);
        assert_eq!(shares.get(1).copied(), Some(0.0));
        assert_eq!(shares.get(3).copied(), Some(0.0));
        let total: f32 = shares.iter().sum();
        assert!((total - 7.25).abs() < EPSILON);
    }

    #[test]
    fn rounding_up_never_makes_a_share_negative() {
        let shares = proportional_shares(10.6, &[1.0, 0.001]);
        assert!(shares.iter().all(|share| *share >= 0.0), "{shares:?}");
        let total: f32 = shares.iter().sum();
        assert!((total - 10.6).abs() < EPSILON);
    }

    #[test]
    fn shrink_leaves_entries_without_room_alone() {
        let mut sizes = [13.0, 40.0];
        let leftover = shrink_toward_minimum(&mut sizes, &[10.0, 40.0], 2.5);
        assert!(leftover.abs() < EPSILON);
        assert_eq!(sizes, [10.5, 40.0]);
    }

    #[test]
    fn shrink_absorbs_fractional_deficit_exactly() {
        let mut sizes = [157.25, 155.75, 71.25, 77.0];
        let minimums = [73.5, 67.5, 2.5, 39.0];
        let leftover = shrink_toward_minimum(&mut sizes, &minimums, 179.25);
        assert!(leftover.abs() < EPSILON);
        let total: f32 = sizes.iter().sum();
        assert!((total - 282.0).abs() < EPSILON);
        assert!(sizes.iter().zip(&minimums).all(|(size, minimum)| size >= minimum));
    }
}
