//! Numeric capability trait and the recording scalar.
//!
//! Code that should run both numerically and under recording is written once
//! against [`Real`]. Instantiated on `f64` it computes values; instantiated on
//! [`AdScalar`] it appends operations to the active tape (see
//! [`record`](crate::record)).

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use crate::tape::{Op, with_recorder};

/// Numeric type usable by the generic solver.
///
/// Covers the field operations plus the few transcendental functions the
/// rigid-body algorithms need. nalgebra's closed-operation traits follow from
/// the supertraits, so `Vector3<T>`, `Matrix3<T>` and friends work for any
/// `T: Real`.
pub trait Real:
    nalgebra::Scalar
    + Copy
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Send
    + Sync
{
    /// Lift a plain constant.
    fn from_f64(value: f64) -> Self;

    /// Sine.
    #[must_use]
    fn sin(self) -> Self;

    /// Cosine.
    #[must_use]
    fn cos(self) -> Self;

    /// Square root.
    #[must_use]
    fn sqrt(self) -> Self;
}

impl Real for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn sin(self) -> Self {
        f64::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        f64::cos(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
}

/// Scalar that records its arithmetic on the thread's active tape.
///
/// A value is either a constant, folded eagerly without touching the tape,
/// or a node of the tape that produced it. Nodes are only meaningful while
/// their recording is active; using one afterwards, or inside a different
/// recording, fails that recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdScalar {
    repr: Repr,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Repr {
    Const(f64),
    Node { tape: u64, index: u32 },
}

impl AdScalar {
    /// A constant that never appears on a tape unless combined with a node.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            repr: Repr::Const(value),
        }
    }

    pub(crate) fn node(tape: u64, index: u32) -> Self {
        Self {
            repr: Repr::Node { tape, index },
        }
    }

    pub(crate) fn repr(self) -> Repr {
        self.repr
    }

    /// The folded value, if this scalar does not depend on any input.
    #[must_use]
    pub fn constant_value(self) -> Option<f64> {
        match self.repr {
            Repr::Const(value) => Some(value),
            Repr::Node { .. } => None,
        }
    }

    /// Whether this scalar is a folded constant.
    #[must_use]
    pub fn is_constant(self) -> bool {
        self.constant_value().is_some()
    }

    fn is_const(self, target: f64) -> bool {
        #[allow(clippy::float_cmp)]
        let hit = self.constant_value() == Some(target);
        hit
    }

    fn binary(self, rhs: Self, fold: fn(f64, f64) -> f64, op: fn(u32, u32) -> Op) -> Self {
        if let (Some(a), Some(b)) = (self.constant_value(), rhs.constant_value()) {
            return Self::constant(fold(a, b));
        }
        with_recorder(|recorder| {
            let a = recorder.operand(self)?;
            let b = recorder.operand(rhs)?;
            recorder.push(op(a, b))
        })
    }

    fn unary(self, fold: fn(f64) -> f64, op: fn(u32) -> Op) -> Self {
        if let Some(a) = self.constant_value() {
            return Self::constant(fold(a));
        }
        with_recorder(|recorder| {
            let a = recorder.operand(self)?;
            recorder.push(op(a))
        })
    }
}

impl From<f64> for AdScalar {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl Add for AdScalar {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_const(0.0) {
            return rhs;
        }
        if rhs.is_const(0.0) {
            return self;
        }
        self.binary(rhs, |a, b| a + b, Op::Add)
    }
}

impl Sub for AdScalar {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        if rhs.is_const(0.0) {
            return self;
        }
        if self.is_const(0.0) {
            return -rhs;
        }
        self.binary(rhs, |a, b| a - b, Op::Sub)
    }
}

impl Mul for AdScalar {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.is_const(0.0) || rhs.is_const(0.0) {
            return Self::constant(0.0);
        }
        if self.is_const(1.0) {
            return rhs;
        }
        if rhs.is_const(1.0) {
            return self;
        }
        self.binary(rhs, |a, b| a * b, Op::Mul)
    }
}

impl Div for AdScalar {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if rhs.is_const(1.0) {
            return self;
        }
        self.binary(rhs, |a, b| a / b, Op::Div)
    }
}

impl Neg for AdScalar {
    type Output = Self;

    fn neg(self) -> Self {
        self.unary(|a| -a, Op::Neg)
    }
}

impl AddAssign for AdScalar {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for AdScalar {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for AdScalar {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for AdScalar {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Zero for AdScalar {
    fn zero() -> Self {
        Self::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.is_const(0.0)
    }
}

impl One for AdScalar {
    fn one() -> Self {
        Self::constant(1.0)
    }
}

impl Real for AdScalar {
    fn from_f64(value: f64) -> Self {
        Self::constant(value)
    }

    fn sin(self) -> Self {
        self.unary(f64::sin, Op::Sin)
    }

    fn cos(self) -> Self {
        self.unary(f64::cos, Op::Cos)
    }

    fn sqrt(self) -> Self {
        self.unary(f64::sqrt, Op::Sqrt)
    }
}
