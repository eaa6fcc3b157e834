//! Operation tape and recording.
//!
//! A recording installs a fresh tape in a thread-local slot, hands the
//! closure one input node per independent variable, and collects every
//! operation performed on [`AdScalar`] values until the closure returns.
//! Recordings on different threads are independent.

use std::cell::RefCell;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{AdError, Result};
use crate::scalar::{AdScalar, Repr};

/// One tape operation. Operands refer to earlier nodes by index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Independent variable `k`.
    Input(u32),
    /// Constant value.
    Const(f64),
    /// `a + b`
    Add(u32, u32),
    /// `a - b`
    Sub(u32, u32),
    /// `a * b`
    Mul(u32, u32),
    /// `a / b`
    Div(u32, u32),
    /// `-a`
    Neg(u32),
    /// `sin(a)`
    Sin(u32),
    /// `cos(a)`
    Cos(u32),
    /// `sqrt(a)`
    Sqrt(u32),
}

impl Op {
    /// Node indices this operation reads.
    #[must_use]
    pub fn operands(&self) -> (Option<u32>, Option<u32>) {
        match *self {
            Self::Input(_) | Self::Const(_) => (None, None),
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) => (Some(a), Some(b)),
            Self::Neg(a) | Self::Sin(a) | Self::Cos(a) | Self::Sqrt(a) => (Some(a), None),
        }
    }

    /// The same operation with operands renumbered through `map`.
    #[must_use]
    pub fn remap(&self, map: impl Fn(u32) -> u32) -> Self {
        match *self {
            Self::Input(k) => Self::Input(k),
            Self::Const(c) => Self::Const(c),
            Self::Add(a, b) => Self::Add(map(a), map(b)),
            Self::Sub(a, b) => Self::Sub(map(a), map(b)),
            Self::Mul(a, b) => Self::Mul(map(a), map(b)),
            Self::Div(a, b) => Self::Div(map(a), map(b)),
            Self::Neg(a) => Self::Neg(map(a)),
            Self::Sin(a) => Self::Sin(map(a)),
            Self::Cos(a) => Self::Cos(map(a)),
            Self::Sqrt(a) => Self::Sqrt(map(a)),
        }
    }
}

/// A finished recording: operations in topological order plus output nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tape {
    pub(crate) n_inputs: usize,
    pub(crate) ops: Vec<Op>,
    pub(crate) outputs: Vec<u32>,
}

impl Tape {
    /// Number of independent variables.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Number of recorded outputs.
    #[must_use]
    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Number of recorded nodes, including inputs and constants.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.ops.len()
    }

    /// Recorded operations.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Output node indices.
    #[must_use]
    pub fn outputs(&self) -> &[u32] {
        &self.outputs
    }
}

pub(crate) struct Recorder {
    id: u64,
    ops: Vec<Op>,
    failure: Option<String>,
}

impl Recorder {
    fn fail(&mut self, reason: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(reason.into());
        }
    }

    /// Append an operation. Returns `None` once the recording has failed.
    pub(crate) fn push(&mut self, op: Op) -> Option<AdScalar> {
        if let Op::Const(value) = op {
            if !value.is_finite() {
                self.fail(format!("non-finite constant {value} entered the tape"));
                return None;
            }
        }
        let Ok(index) = u32::try_from(self.ops.len()) else {
            self.fail("tape exceeds the maximum node count");
            return None;
        };
        self.ops.push(op);
        Some(AdScalar::node(self.id, index))
    }

    /// Node index of a scalar on this tape, materializing constants.
    pub(crate) fn operand(&mut self, x: AdScalar) -> Option<u32> {
        match x.repr() {
            Repr::Const(value) => match self.push(Op::Const(value))?.repr() {
                Repr::Node { index, .. } => Some(index),
                Repr::Const(_) => None,
            },
            Repr::Node { tape, index } if tape == self.id && (index as usize) < self.ops.len() => Some(index),
            Repr::Node { .. } => {
                self.fail("scalar from a different or finished recording");
                None
            }
        }
    }
}

thread_local! {
    static RECORDER: RefCell<Option<Recorder>> = const { RefCell::new(None) };
}

static NEXT_TAPE_ID: AtomicU64 = AtomicU64::new(1);

/// Run `f` against the active recorder.
///
/// Without an active recording, or after the recording failed, the result is
/// a NaN constant; the failure itself is reported when the recording ends.
pub(crate) fn with_recorder(f: impl FnOnce(&mut Recorder) -> Option<AdScalar>) -> AdScalar {
    RECORDER
        .with(|cell| cell.borrow_mut().as_mut().and_then(f))
        .unwrap_or_else(|| AdScalar::constant(f64::NAN))
}

/// Clears the thread's recorder on every exit path, including unwinding.
struct RecordingGuard;

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        RECORDER.with(|cell| cell.borrow_mut().take());
    }
}

/// Whether a recording is active on the current thread.
#[must_use]
pub fn is_recording() -> bool {
    RECORDER.with(|cell| cell.borrow().is_some())
}

/// Record `f` as a function of `n_inputs` independent variables.
///
/// The closure receives one [`AdScalar`] input node per variable and returns
/// the outputs. Constant outputs are materialized on the tape.
///
/// # Errors
///
/// - [`AdError::NestedRecording`] if a recording is already active on this thread.
/// - [`AdError::Recording`] if the closure fails, mixes in a scalar from another
///   recording, or produces a non-finite constant.
pub fn record<F, E>(n_inputs: usize, f: F) -> Result<Tape>
where
    F: FnOnce(&[AdScalar]) -> std::result::Result<Vec<AdScalar>, E>,
    E: Display,
{
    let n = u32::try_from(n_inputs).map_err(|_| AdError::recording("too many inputs"))?;
    let id = NEXT_TAPE_ID.fetch_add(1, Ordering::Relaxed);

    RECORDER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_some() {
            return Err(AdError::NestedRecording);
        }
        *slot = Some(Recorder {
            id,
            ops: (0..n).map(Op::Input).collect(),
            failure: None,
        });
        Ok(())
    })?;
    let _guard = RecordingGuard;

    let inputs: Vec<AdScalar> = (0..n).map(|k| AdScalar::node(id, k)).collect();
    let outputs = f(&inputs).map_err(|e| AdError::recording(e.to_string()))?;

    let mut recorder = RECORDER
        .with(|cell| cell.borrow_mut().take())
        .ok_or_else(|| AdError::recording("recorder was removed during recording"))?;
    let outputs: Vec<u32> = outputs.iter().filter_map(|&y| recorder.operand(y)).collect();

    if let Some(reason) = recorder.failure {
        return Err(AdError::recording(reason));
    }

    tracing::debug!(
        n_inputs,
        n_outputs = outputs.len(),
        n_nodes = recorder.ops.len(),
        "recorded tape"
    );

    Ok(Tape {
        n_inputs,
        ops: recorder.ops,
        outputs,
    })
}
