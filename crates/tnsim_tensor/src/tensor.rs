//! Dense complex tensors
//!
//! Gantree: L1_Network → Tensor
//!
//! A tensor has a fixed rank and shape. Its body is a row-major buffer of
//! `Complex64` whose length is the product of the shape once allocated.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tnsim_core::{SimError, SimResult};

/// Lifecycle of a tensor body
/// Gantree: BodyState // 할당 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyState {
    /// No storage reserved
    Unallocated,
    /// Storage reserved, contents not meaningful yet
    Allocated,
    /// Every element set to zero
    Zeroed,
    /// At least one element written or imported
    Populated,
}

/// Fixed-rank, fixed-shape array of complex amplitudes
/// Gantree: Tensor // 텐서
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    body: Vec<Complex64>,
    state: BodyState,
}

/// Row-major strides for a shape
fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for leg in (0..shape.len().saturating_sub(1)).rev() {
        strides[leg] = strides[leg + 1] * shape[leg + 1];
    }
    strides
}

impl Tensor {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a tensor with no body
    /// Gantree: new(rank, shape) -> Result<Self> // 형상 검증
    pub fn new(rank: usize, shape: Vec<usize>) -> SimResult<Self> {
        if shape.len() != rank || shape.iter().any(|&d| d == 0) {
            return Err(SimError::InvalidShape { rank, shape });
        }
        Ok(Self {
            shape,
            body: Vec::new(),
            state: BodyState::Unallocated,
        })
    }

    /// Rank-0 tensor holding one value
    pub fn scalar(value: Complex64) -> Self {
        Self {
            shape: Vec::new(),
            body: vec![value],
            state: BodyState::Populated,
        }
    }

    /// Create a zero-filled tensor
    pub fn zeros(shape: Vec<usize>) -> SimResult<Self> {
        let mut tensor = Self::new(shape.len(), shape)?;
        tensor.allocate_body()?;
        tensor.nullify_body()?;
        Ok(tensor)
    }

    /// Import a row-major body
    pub fn from_data(shape: Vec<usize>, data: Vec<Complex64>) -> SimResult<Self> {
        let mut tensor = Self::new(shape.len(), shape)?;
        let expected = tensor.checked_volume()?;
        if data.len() != expected {
            return Err(SimError::DataLengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        tensor.body = data;
        tensor.state = BodyState::Populated;
        Ok(tensor)
    }

    /// Reshape a `2^k x 2^k` row-major matrix into a rank-2k tensor
    ///
    /// Legs are `[out_0 .. out_{k-1}, in_0 .. in_{k-1}]`, each of dimension 2,
    /// with the first qubit as the most significant bit of the row and
    /// column index. The flat body is the matrix itself.
    pub fn from_matrix(num_qubits: usize, data: Vec<Complex64>) -> SimResult<Self> {
        if num_qubits == 0 {
            return Err(SimError::InvalidShape {
                rank: 0,
                shape: Vec::new(),
            });
        }
        Self::from_data(vec![2; 2 * num_qubits], data)
    }

    // ========================================================================
    // Shape Queries
    // ========================================================================

    /// Number of legs
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Per-leg dimensions
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Dimension of one leg
    pub fn dim(&self, leg: usize) -> Option<usize> {
        self.shape.get(leg).copied()
    }

    /// Number of elements (1 for a scalar)
    pub fn volume(&self) -> usize {
        self.shape.iter().product()
    }

    fn checked_volume(&self) -> SimResult<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(SimError::AllocationFailure {
                elements: usize::MAX,
            })
    }

    /// Allocation state of the body
    pub fn body_state(&self) -> BodyState {
        self.state
    }

    /// Check whether storage exists
    pub fn is_allocated(&self) -> bool {
        self.state != BodyState::Unallocated
    }

    // ========================================================================
    // Body Management
    // ========================================================================

    /// Reserve storage for the body
    /// Gantree: allocate_body() -> Result<()> // 저장소 확보
    pub fn allocate_body(&mut self) -> SimResult<()> {
        if self.is_allocated() {
            return Ok(());
        }
        let elements = self.checked_volume()?;
        self.body
            .try_reserve_exact(elements)
            .map_err(|_| SimError::AllocationFailure { elements })?;
        self.body.resize(elements, Complex64::new(0.0, 0.0));
        self.state = BodyState::Allocated;
        Ok(())
    }

    /// Zero every element
    pub fn nullify_body(&mut self) -> SimResult<()> {
        if !self.is_allocated() {
            return Err(SimError::BodyNotAllocated);
        }
        self.body.fill(Complex64::new(0.0, 0.0));
        self.state = BodyState::Zeroed;
        Ok(())
    }

    /// Row-major body
    pub fn body(&self) -> SimResult<&[Complex64]> {
        if !self.is_allocated() {
            return Err(SimError::BodyNotAllocated);
        }
        Ok(&self.body)
    }

    /// Consume the tensor, returning its body
    pub fn into_body(self) -> SimResult<Vec<Complex64>> {
        if !self.is_allocated() {
            return Err(SimError::BodyNotAllocated);
        }
        Ok(self.body)
    }

    fn offset(&self, index: &[usize]) -> SimResult<usize> {
        if index.len() != self.rank() {
            return Err(SimError::RankMismatch {
                expected: self.rank(),
                actual: index.len(),
            });
        }
        let mut offset = 0usize;
        for (leg, (&i, &dim)) in index.iter().zip(&self.shape).enumerate() {
            if i >= dim {
                return Err(SimError::IndexOutOfRange {
                    leg,
                    index: i,
                    dim,
                });
            }
            offset = offset * dim + i;
        }
        Ok(offset)
    }

    /// Read one element by multi-index
    pub fn get(&self, index: &[usize]) -> SimResult<Complex64> {
        if !self.is_allocated() {
            return Err(SimError::BodyNotAllocated);
        }
        let offset = self.offset(index)?;
        Ok(self.body[offset])
    }

    /// Write one element by multi-index
    /// Gantree: set(index, value) -> Result<()> // 원소 기록
    pub fn set(&mut self, index: &[usize], value: Complex64) -> SimResult<()> {
        if !self.is_allocated() {
            return Err(SimError::BodyNotAllocated);
        }
        let offset = self.offset(index)?;
        self.body[offset] = value;
        self.state = BodyState::Populated;
        Ok(())
    }

    // ========================================================================
    // Element-wise Operations
    // ========================================================================

    /// Complex conjugate
    pub fn conj(&self) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            body: self.body.iter().map(|z| z.conj()).collect(),
            state: self.state,
        }
    }

    /// Multiply every element by `factor`
    pub fn scale(&mut self, factor: Complex64) {
        for z in &mut self.body {
            *z *= factor;
        }
    }

    /// Sum of squared magnitudes
    pub fn norm_squared(&self) -> f64 {
        self.body.iter().map(|z| z.norm_sqr()).sum()
    }

    /// Largest element-wise distance to another tensor of the same shape
    pub fn max_abs_diff(&self, other: &Tensor) -> SimResult<f64> {
        if self.shape != other.shape {
            return Err(SimError::InvalidShape {
                rank: other.rank(),
                shape: other.shape.clone(),
            });
        }
        Ok(self
            .body
            .iter()
            .zip(&other.body)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max))
    }

    // ========================================================================
    // Leg Operations
    // ========================================================================

    fn check_leg(&self, leg: usize) -> SimResult<usize> {
        self.dim(leg).ok_or(SimError::IndexOutOfRange {
            leg,
            index: leg,
            dim: self.rank(),
        })
    }

    /// Reorder legs: leg `j` of the result is leg `order[j]` of `self`
    /// Gantree: permute(order) -> Result<Tensor> // 축 순서 변경
    pub fn permute(&self, order: &[usize]) -> SimResult<Tensor> {
        let rank = self.rank();
        if order.len() != rank {
            return Err(SimError::RankMismatch {
                expected: rank,
                actual: order.len(),
            });
        }
        let mut seen = vec![false; rank];
        for (j, &o) in order.iter().enumerate() {
            if o >= rank || seen[o] {
                return Err(SimError::IndexOutOfRange {
                    leg: j,
                    index: o,
                    dim: rank,
                });
            }
            seen[o] = true;
        }
        let body = self.body()?;
        if order.iter().enumerate().all(|(j, &o)| j == o) {
            return Ok(self.clone());
        }

        let src_strides = strides(&self.shape);
        let new_shape: Vec<usize> = order.iter().map(|&o| self.shape[o]).collect();
        let mapped: Vec<usize> = order.iter().map(|&o| src_strides[o]).collect();
        let volume = self.volume();

        let mut out = Vec::with_capacity(volume);
        let mut idx = vec![0usize; rank];
        let mut src = 0usize;
        for _ in 0..volume {
            out.push(body[src]);
            for leg in (0..rank).rev() {
                idx[leg] += 1;
                src += mapped[leg];
                if idx[leg] < new_shape[leg] {
                    break;
                }
                src -= mapped[leg] * new_shape[leg];
                idx[leg] = 0;
            }
        }

        Ok(Tensor {
            shape: new_shape,
            body: out,
            state: self.state,
        })
    }

    /// Sum over the diagonal of two legs of this tensor
    ///
    /// Removes both legs; the remaining legs keep their relative order.
    pub fn trace_pair(&self, a: usize, b: usize) -> SimResult<Tensor> {
        let dim_a = self.check_leg(a)?;
        let dim_b = self.check_leg(b)?;
        if a == b || dim_a != dim_b {
            return Err(SimError::InvalidShape {
                rank: self.rank(),
                shape: self.shape.clone(),
            });
        }
        let mut order: Vec<usize> = (0..self.rank()).filter(|&l| l != a && l != b).collect();
        let rest_shape: Vec<usize> = order.iter().map(|&l| self.shape[l]).collect();
        order.push(a);
        order.push(b);
        let moved = self.permute(&order)?;
        let body = moved.body()?;

        let rest: usize = rest_shape.iter().product();
        let block = dim_a * dim_a;
        let out: Vec<Complex64> = (0..rest)
            .map(|r| {
                (0..dim_a)
                    .map(|k| body[r * block + k * dim_a + k])
                    .sum::<Complex64>()
            })
            .collect();

        Tensor::from_data(rest_shape, out)
    }

    /// Contract legs of `self` with legs of `other`
    ///
    /// `pairs` lists `(leg of self, leg of other)`. The result carries the
    /// uncontracted legs of `self` in ascending order, then those of `other`.
    /// An empty `pairs` gives the outer product.
    /// Gantree: contract(other, pairs) -> Result<Tensor> // 쌍 축약
    pub fn contract(&self, other: &Tensor, pairs: &[(usize, usize)]) -> SimResult<Tensor> {
        let mut used_a = vec![false; self.rank()];
        let mut used_b = vec![false; other.rank()];
        for &(la, lb) in pairs {
            let da = self.check_leg(la)?;
            let db = other.check_leg(lb)?;
            if da != db || used_a[la] || used_b[lb] {
                return Err(SimError::InvalidShape {
                    rank: other.rank(),
                    shape: other.shape.clone(),
                });
            }
            used_a[la] = true;
            used_b[lb] = true;
        }

        let free_a: Vec<usize> = (0..self.rank()).filter(|&l| !used_a[l]).collect();
        let free_b: Vec<usize> = (0..other.rank()).filter(|&l| !used_b[l]).collect();

        let mut order_a = free_a.clone();
        order_a.extend(pairs.iter().map(|&(la, _)| la));
        let mut order_b: Vec<usize> = pairs.iter().map(|&(_, lb)| lb).collect();
        order_b.extend(free_b.iter().copied());

        let a = self.permute(&order_a)?;
        let b = other.permute(&order_b)?;
        let a_body = a.body()?;
        let b_body = b.body()?;

        let m: usize = free_a.iter().map(|&l| self.shape[l]).product();
        let k: usize = pairs.iter().map(|&(la, _)| self.shape[la]).product();
        let n: usize = free_b.iter().map(|&l| other.shape[l]).product();

        let zero = Complex64::new(0.0, 0.0);
        let mut out = vec![zero; m * n];
        for i in 0..m {
            let row = &mut out[i * n..(i + 1) * n];
            for l in 0..k {
                let x = a_body[i * k + l];
                if x == zero {
                    continue;
                }
                let b_row = &b_body[l * n..(l + 1) * n];
                for (acc, &y) in row.iter_mut().zip(b_row) {
                    *acc += x * y;
                }
            }
        }

        let mut shape: Vec<usize> = free_a.iter().map(|&l| self.shape[l]).collect();
        shape.extend(free_b.iter().map(|&l| other.shape[l]));
        Tensor::from_data(shape, out)
    }

    /// Apply a `k`-qubit operator tensor to legs `qubits` of this state
    ///
    /// `op` has rank `2k` with legs `[out.., in..]`. The result keeps the
    /// leg order of `self`.
    pub fn apply_operator(&self, op: &Tensor, qubits: &[usize]) -> SimResult<Tensor> {
        let k = qubits.len();
        if op.rank() != 2 * k {
            return Err(SimError::RankMismatch {
                expected: 2 * k,
                actual: op.rank(),
            });
        }
        let pairs: Vec<(usize, usize)> = qubits.iter().enumerate().map(|(j, &q)| (k + j, q)).collect();
        let applied = op.contract(self, &pairs)?;

        // applied legs: op outputs (qubit order), then untouched legs ascending
        let mut order = Vec::with_capacity(self.rank());
        let mut untouched = 0usize;
        for leg in 0..self.rank() {
            match qubits.iter().position(|&q| q == leg) {
                Some(j) => order.push(j),
                None => {
                    order.push(k + untouched);
                    untouched += 1;
                }
            }
        }
        applied.permute(&order)
    }
}

// ============================================================================
// Tests
// ============================================================================
