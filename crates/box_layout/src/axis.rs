//! Layout axes and values stored once per axis.

use serde::{Deserialize, Serialize};

/// Axis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    /// Columns; sizes along this axis are widths.
    Horizontal,
    /// Rows; sizes along this axis are heights.
    Vertical,
}

impl Axis {
    /// Both axes in pass order.
    pub const BOTH: [Self; 2] = [Self::Horizontal, Self::Vertical];

    /// The perpendicular axis.
    pub const fn other(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// A value stored once for each axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisPair<T> {
    /// Value along the horizontal axis
    pub horizontal: T,
    /// Value along the vertical axis
    pub vertical: T,
}

impl<T> AxisPair<T> {
    /// Create a pair from its horizontal and vertical values.
    pub const fn new(horizontal: T, vertical: T) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Borrow the value for `axis`.
    pub const fn get(&self, axis: Axis) -> &T {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }

    /// Mutably borrow the value for `axis`.
    pub fn get_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Horizontal => &mut self.horizontal,
            Axis::Vertical => &mut self.vertical,
        }
    }

    /// Replace the value for `axis`.
    pub fn set(&mut self, axis: Axis, value: T) {
        *self.get_mut(axis) = value;
    }
}

impl<T: Copy> AxisPair<T> {
    /// A pair holding the same value on both axes.
    pub const fn splat(value: T) -> Self {
        Self::new(value, value)
    }

    /// Copy out the value for `axis`.
    pub const fn value(&self, axis: Axis) -> T {
        *self.get(axis)
    }
}
