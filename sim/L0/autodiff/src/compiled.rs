//! Compiled tapes: pruned, renumbered, validated, and evaluable.

use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::error::{AdError, Result};
use crate::tape::{Op, Tape};

/// A validated operation list ready for repeated evaluation.
///
/// Compilation drops every node no output depends on and pools identical
/// constants. The result is immutable and `Send + Sync`; evaluation only
/// allocates local buffers, so one function can serve many threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    n_inputs: usize,
    ops: Vec<Op>,
    outputs: Vec<u32>,
}

impl CompiledFunction {
    /// Compile a recorded tape.
    ///
    /// # Errors
    ///
    /// Returns [`AdError::Compile`] if the tape is structurally invalid.
    pub fn compile(tape: &Tape) -> Result<Self> {
        let n = tape.ops.len();
        let mut live = vec![false; n];
        for &out in &tape.outputs {
            let out = out as usize;
            if out >= n {
                return Err(AdError::compile(format!("output node {out} out of range ({n} nodes)")));
            }
            live[out] = true;
        }
        for i in (0..n).rev() {
            if !live[i] {
                continue;
            }
            let (a, b) = tape.ops[i].operands();
            for operand in [a, b].into_iter().flatten() {
                if operand as usize >= i {
                    return Err(AdError::compile(format!("node {i} reads later node {operand}")));
                }
                live[operand as usize] = true;
            }
        }

        let mut index_map = vec![u32::MAX; n];
        let mut constants: HashMap<u64, u32> = HashMap::new();
        let mut ops = Vec::with_capacity(live.iter().filter(|&&l| l).count());
        for (i, op) in tape.ops.iter().enumerate() {
            if !live[i] {
                continue;
            }
            let next = u32::try_from(ops.len()).map_err(|_| AdError::compile("too many nodes"))?;
            if let Op::Const(value) = *op {
                if let Some(&pooled) = constants.get(&value.to_bits()) {
                    index_map[i] = pooled;
                    continue;
                }
                constants.insert(value.to_bits(), next);
            }
            index_map[i] = next;
            ops.push(op.remap(|k| index_map[k as usize]));
        }
        let outputs = tape.outputs.iter().map(|&o| index_map[o as usize]).collect();

        let compiled = Self::from_parts(tape.n_inputs, ops, outputs)?;
        tracing::debug!(
            recorded = n,
            compiled = compiled.n_nodes(),
            "compiled tape"
        );
        Ok(compiled)
    }

    /// Assemble and validate a function from raw parts.
    ///
    /// # Errors
    ///
    /// Returns [`AdError::Compile`] if an operand refers forward, an input
    /// index exceeds `n_inputs`, a constant is non-finite, or an output is out
    /// of range.
    pub fn from_parts(n_inputs: usize, ops: Vec<Op>, outputs: Vec<u32>) -> Result<Self> {
        for (i, op) in ops.iter().enumerate() {
            match *op {
                Op::Input(k) if k as usize >= n_inputs => {
                    return Err(AdError::compile(format!(
                        "node {i} reads input {k} of {n_inputs}"
                    )));
                }
                Op::Const(value) if !value.is_finite() => {
                    return Err(AdError::compile(format!("node {i} holds non-finite constant")));
                }
                _ => {}
            }
            let (a, b) = op.operands();
            if [a, b].into_iter().flatten().any(|k| k as usize >= i) {
                return Err(AdError::compile(format!("node {i} is not in topological order")));
            }
        }
        if let Some(&bad) = outputs.iter().find(|&&o| o as usize >= ops.len()) {
            return Err(AdError::compile(format!(
                "output node {bad} out of range ({} nodes)",
                ops.len()
            )));
        }
        Ok(Self {
            n_inputs,
            ops,
            outputs,
        })
    }

    /// Number of inputs.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Number of outputs.
    #[must_use]
    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Number of nodes after compilation.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.ops.len()
    }

    pub(crate) fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub(crate) fn outputs(&self) -> &[u32] {
        &self.outputs
    }

    fn check_input(&self, x: &[f64]) -> Result<()> {
        if x.len() == self.n_inputs {
            Ok(())
        } else {
            Err(AdError::DimensionMismatch {
                expected: self.n_inputs,
                actual: x.len(),
            })
        }
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        let mut val: Vec<f64> = Vec::with_capacity(self.ops.len());
        for op in &self.ops {
            let v = match *op {
                Op::Input(k) => x[k as usize],
                Op::Const(c) => c,
                Op::Add(a, b) => val[a as usize] + val[b as usize],
                Op::Sub(a, b) => val[a as usize] - val[b as usize],
                Op::Mul(a, b) => val[a as usize] * val[b as usize],
                Op::Div(a, b) => val[a as usize] / val[b as usize],
                Op::Neg(a) => -val[a as usize],
                Op::Sin(a) => val[a as usize].sin(),
                Op::Cos(a) => val[a as usize].cos(),
                Op::Sqrt(a) => val[a as usize].sqrt(),
            };
            val.push(v);
        }
        val
    }

    /// Evaluate the function.
    ///
    /// # Errors
    ///
    /// Returns [`AdError::DimensionMismatch`] if `x` has the wrong length.
    pub fn evaluate(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_input(x)?;
        let val = self.forward(x);
        Ok(self.outputs.iter().map(|&o| val[o as usize]).collect())
    }

    /// Evaluate the function and its Jacobian (`n_outputs × n_inputs`).
    ///
    /// One reverse sweep per output over the nodes that precede it.
    ///
    /// # Errors
    ///
    /// Returns [`AdError::DimensionMismatch`] if `x` has the wrong length.
    pub fn jacobian(&self, x: &[f64]) -> Result<(Vec<f64>, DMatrix<f64>)> {
        self.check_input(x)?;
        let val = self.forward(x);
        let values = self.outputs.iter().map(|&o| val[o as usize]).collect();

        let mut jac = DMatrix::zeros(self.outputs.len(), self.n_inputs);
        let mut adj = vec![0.0; self.ops.len()];
        for (row, &out) in self.outputs.iter().enumerate() {
            let out = out as usize;
            adj[..=out].fill(0.0);
            adj[out] = 1.0;
            for i in (0..=out).rev() {
                let g = adj[i];
                if g == 0.0 {
                    continue;
                }
                match self.ops[i] {
                    Op::Input(k) => jac[(row, k as usize)] += g,
                    Op::Const(_) => {}
                    Op::Add(a, b) => {
                        adj[a as usize] += g;
                        adj[b as usize] += g;
                    }
                    Op::Sub(a, b) => {
                        adj[a as usize] += g;
                        adj[b as usize] -= g;
                    }
                    Op::Mul(a, b) => {
                        adj[a as usize] += g * val[b as usize];
                        adj[b as usize] += g * val[a as usize];
                    }
                    Op::Div(a, b) => {
                        let denom = val[b as usize];
                        adj[a as usize] += g / denom;
                        adj[b as usize] -= g * val[i] / denom;
                    }
                    Op::Neg(a) => adj[a as usize] -= g,
                    Op::Sin(a) => adj[a as usize] += g * val[a as usize].cos(),
                    Op::Cos(a) => adj[a as usize] -= g * val[a as usize].sin(),
                    Op::Sqrt(a) => adj[a as usize] += g * 0.5 / val[i],
                }
            }
        }
        Ok((values, jac))
    }
}
