//! Bounded axis and motor participation sets.
//!
//! `AxisSet` holds one bit per axis index. `MotorSet` holds two disjoint
//! halves of [`MOTOR_HALF_BITS`] bits each: motor side 0 of axis `n` is bit
//! `n`, motor side 1 is bit `MOTOR_HALF_BITS + n`. Blocking one motor of a
//! squared pair is therefore a mask on a single half.

use core::fmt;

use static_assertions::{const_assert, const_assert_eq};

use crate::consts::{MAX_N_AXIS, MOTOR_HALF_BITS};

const_assert!(MAX_N_AXIS <= MOTOR_HALF_BITS);
const_assert_eq!(core::mem::size_of::<AxisSet>(), 2);
const_assert_eq!(core::mem::size_of::<MotorSet>(), 4);

const AXIS_BITS_MASK: u16 = ((1u32 << MAX_N_AXIS) - 1) as u16;
const HALF_MASK: u32 = (1u32 << MOTOR_HALF_BITS) - 1;

// ─── Axis Set ───────────────────────────────────────────────────────

/// Set of axis indices in `0..MAX_N_AXIS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisSet(u16);

impl AxisSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Build from raw bits. Bits at or above `MAX_N_AXIS` are dropped.
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & AXIS_BITS_MASK)
    }

    /// Raw bit representation.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Set containing only `axis`. Out-of-range indices give the empty set.
    #[inline]
    pub const fn single(axis: usize) -> Self {
        if axis < MAX_N_AXIS {
            Self(1 << axis)
        } else {
            Self::EMPTY
        }
    }

    /// Set containing axes `0..n_axis`.
    #[inline]
    pub const fn first(n_axis: usize) -> Self {
        if n_axis >= MAX_N_AXIS {
            Self(AXIS_BITS_MASK)
        } else {
            Self(((1u32 << n_axis) - 1) as u16)
        }
    }

    #[inline]
    pub const fn contains(self, axis: usize) -> bool {
        axis < MAX_N_AXIS && self.0 & (1 << axis) != 0
    }

    #[inline]
    pub fn insert(&mut self, axis: usize) {
        *self = self.union(Self::single(axis));
    }

    #[inline]
    pub fn remove(&mut self, axis: usize) {
        *self = self.difference(Self::single(axis));
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Axis indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_N_AXIS).filter(move |&axis| self.contains(axis))
    }
}

impl FromIterator<usize> for AxisSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for axis in iter {
            set.insert(axis);
        }
        set
    }
}

impl fmt::Debug for AxisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ─── Motors ─────────────────────────────────────────────────────────

/// Which motor of an axis. Single-motor axes only use `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MotorSide {
    Primary = 0,
    Secondary = 1,
}

impl MotorSide {
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One motor, identified by axis index and side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotorId {
    pub axis: usize,
    pub side: MotorSide,
}

impl MotorId {
    #[inline]
    pub const fn new(axis: usize, side: MotorSide) -> Self {
        Self { axis, side }
    }

    /// Bit number inside a [`MotorSet`].
    #[inline]
    pub const fn bit(self) -> usize {
        self.side.index() * MOTOR_HALF_BITS + self.axis
    }
}

// ─── Motor Set ──────────────────────────────────────────────────────

/// Set of motors, split into one half per motor side.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MotorSet(u32);

impl MotorSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Build from raw bits. Bits outside the valid axis range of each half
    /// are dropped.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        let valid = AXIS_BITS_MASK as u32;
        Self(bits & (valid | (valid << MOTOR_HALF_BITS)))
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Set containing only `motor`.
    #[inline]
    pub const fn single(motor: MotorId) -> Self {
        if motor.axis < MAX_N_AXIS {
            Self(1 << motor.bit())
        } else {
            Self::EMPTY
        }
    }

    /// One side's motors for every axis in `axes`.
    #[inline]
    pub const fn from_axes(axes: AxisSet, side: MotorSide) -> Self {
        Self((axes.bits() as u32) << (side.index() * MOTOR_HALF_BITS))
    }

    /// Both motors of every axis in `axes`.
    #[inline]
    pub const fn from_axes_all_sides(axes: AxisSet) -> Self {
        Self::from_axes(axes, MotorSide::Primary).union(Self::from_axes(axes, MotorSide::Secondary))
    }

    #[inline]
    pub const fn contains(self, motor: MotorId) -> bool {
        motor.axis < MAX_N_AXIS && self.0 & (1 << motor.bit()) != 0
    }

    #[inline]
    pub fn insert(&mut self, motor: MotorId) {
        *self = self.union(Self::single(motor));
    }

    #[inline]
    pub fn remove(&mut self, motor: MotorId) {
        *self = self.difference(Self::single(motor));
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// The axes whose `side` motor is in the set.
    #[inline]
    pub const fn side(self, side: MotorSide) -> AxisSet {
        AxisSet::from_bits(((self.0 >> (side.index() * MOTOR_HALF_BITS)) & HALF_MASK) as u16)
    }

    /// Axes with at least one motor in the set.
    #[inline]
    pub const fn axes(self) -> AxisSet {
        self.side(MotorSide::Primary)
            .union(self.side(MotorSide::Secondary))
    }

    /// Axes with both motors in the set.
    #[inline]
    pub const fn squared_axes(self) -> AxisSet {
        self.side(MotorSide::Primary)
            .intersection(self.side(MotorSide::Secondary))
    }

    /// True if either motor of `axis` is in the set.
    #[inline]
    pub const fn has_axis(self, axis: usize) -> bool {
        self.axes().contains(axis)
    }

    /// Motors in the set, side 0 first, ascending axis within a side.
    pub fn iter(self) -> impl Iterator<Item = MotorId> {
        MotorSide::ALL.into_iter().flat_map(move |side| {
            self.side(side)
                .iter()
                .map(move |axis| MotorId::new(axis, side))
        })
    }
}

impl FromIterator<MotorId> for MotorSet {
    fn from_iter<I: IntoIterator<Item = MotorId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for motor in iter {
            set.insert(motor);
        }
        set
    }
}

impl fmt::Debug for MotorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MotorSet({:#010x})", self.0)
    }
}
