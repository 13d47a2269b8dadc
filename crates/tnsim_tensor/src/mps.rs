//! Matrix-product-state ring
//!
//! Gantree: L1_Network → StateRepresentation
//!
//! Site `i` is a rank-3 tensor with legs `(left bond, right bond, physical)`.
//! Its right bond connects to the left bond of site `(i + 1) mod n`, closing
//! the ring. In a network, site `i` gets id `i + 1` and its physical leg is
//! bound to open leg `i` of the output tensor.

use crate::contraction::ContractionStrategy;
use crate::leg::{TensorLeg, OUTPUT_TENSOR_ID};
use crate::network::{NodeKind, PendingTensor, TensorNetwork};
use crate::tensor::Tensor;
use num_complex::Complex64;
use tnsim_core::constants::tensor::{
    BASE_SPACE_DIM, LEFT_BOND_LEG, MPS_TENSOR_RANK, PHYSICAL_LEG, RIGHT_BOND_LEG,
};
use tnsim_core::{SimError, SimResult};

/// Ring of rank-3 site tensors, one per qubit
/// Gantree: MpsRing // 링 MPS
#[derive(Debug, Clone, PartialEq)]
pub struct MpsRing {
    sites: Vec<Tensor>,
}

impl MpsRing {
    /// Ring in |0...0> with uniform bond dimension `valence`
    /// Gantree: new(n, valence) -> Result<Self> // 초기 상태
    pub fn new(num_sites: usize, valence: usize) -> SimResult<Self> {
        if num_sites == 0 || valence == 0 {
            return Err(SimError::InvalidShape {
                rank: MPS_TENSOR_RANK,
                shape: vec![valence, valence, BASE_SPACE_DIM],
            });
        }
        let sites = (0..num_sites)
            .map(|_| {
                let mut site = Tensor::new(MPS_TENSOR_RANK, vec![valence, valence, BASE_SPACE_DIM])?;
                site.allocate_body()?;
                site.nullify_body()?;
                site.set(&[0, 0, 0], Complex64::new(1.0, 0.0))?;
                Ok(site)
            })
            .collect::<SimResult<Vec<_>>>()?;
        Ok(Self { sites })
    }

    /// Ring from explicit site tensors
    pub fn from_sites(sites: Vec<Tensor>) -> SimResult<Self> {
        if sites.is_empty() {
            return Err(SimError::InvalidShape {
                rank: MPS_TENSOR_RANK,
                shape: Vec::new(),
            });
        }
        let n = sites.len();
        for (i, site) in sites.iter().enumerate() {
            if site.rank() != MPS_TENSOR_RANK {
                return Err(SimError::RankMismatch {
                    expected: MPS_TENSOR_RANK,
                    actual: site.rank(),
                });
            }
            let next = &sites[(i + 1) % n];
            let right = site.shape()[RIGHT_BOND_LEG];
            let left = next.shape()[LEFT_BOND_LEG];
            if right != left {
                return Err(SimError::LegDimensionMismatch {
                    tensor: i + 1,
                    leg: RIGHT_BOND_LEG,
                    dim: right,
                    peer: (i + 1) % n + 1,
                    peer_leg: LEFT_BOND_LEG,
                    peer_dim: left,
                });
            }
        }
        Ok(Self { sites })
    }

    /// Number of sites
    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Site tensor
    pub fn site(&self, index: usize) -> Option<&Tensor> {
        self.sites.get(index)
    }

    /// All site tensors
    pub fn sites(&self) -> &[Tensor] {
        &self.sites
    }

    /// Right bond dimension of each site
    pub fn bond_dimensions(&self) -> Vec<usize> {
        self.sites
            .iter()
            .map(|s| s.shape()[RIGHT_BOND_LEG])
            .collect()
    }

    /// Largest bond dimension in the ring
    pub fn max_bond_dimension(&self) -> usize {
        self.bond_dimensions().into_iter().max().unwrap_or(0)
    }

    // ========================================================================
    // Network Construction
    // ========================================================================

    /// Materialize the output tensor and the ring in an empty network
    ///
    /// Fails with `NetworkAlreadyBuilt` if the network already holds tensors.
    /// Gantree: build_network(network) -> Result<()> // 링 네트워크 생성
    pub fn build_network(&self, network: &mut TensorNetwork) -> SimResult<()> {
        if !network.is_empty() {
            return Err(SimError::NetworkAlreadyBuilt);
        }
        let n = self.sites.len();
        let site_id = |i: usize| i + 1;

        let output = Tensor::new(n, self.sites.iter().map(|s| s.shape()[PHYSICAL_LEG]).collect())?;
        let mut batch = Vec::with_capacity(n + 1);
        batch.push(PendingTensor::new(
            output,
            (0..n).map(|i| TensorLeg::new(site_id(i), PHYSICAL_LEG)).collect(),
            NodeKind::Output,
        ));
        for (i, site) in self.sites.iter().enumerate() {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            let mut legs = vec![TensorLeg::new(OUTPUT_TENSOR_ID, 0); MPS_TENSOR_RANK];
            legs[LEFT_BOND_LEG] = TensorLeg::new(site_id(prev), RIGHT_BOND_LEG);
            legs[RIGHT_BOND_LEG] = TensorLeg::new(site_id(next), LEFT_BOND_LEG);
            legs[PHYSICAL_LEG] = TensorLeg::output(i);
            batch.push(PendingTensor::new(site.clone(), legs, NodeKind::State));
        }
        network.append_tensors(batch)?;
        log::debug!("built ring network with {} site(s)", n);
        Ok(())
    }

    /// Contract the ring alone into a dense state tensor
    pub fn to_state_tensor(&self, strategy: &dyn ContractionStrategy) -> SimResult<Tensor> {
        let mut network = TensorNetwork::new();
        self.build_network(&mut network)?;
        network.contract(strategy)
    }

    // ========================================================================
    // Factorization
    // ========================================================================

    /// Factor a dense state tensor into a left-canonical ring
    ///
    /// Each step splits the remaining amplitudes into orthonormal columns
    /// `Q` (the site) and coefficients `R` carried to the next site, keeping
    /// every column whose residual norm exceeds `tolerance` times the norm of
    /// the step's matrix. Nothing is truncated beyond numerical rank. The
    /// closing bond between the last and first site has dimension 1.
    /// Gantree: from_state_tensor(tensor, tol) -> Result<Self> // 상태 → 링
    pub fn from_state_tensor(state: &Tensor, tolerance: f64) -> SimResult<Self> {
        let n = state.rank();
        if n == 0 {
            return Err(SimError::InvalidShape {
                rank: 0,
                shape: Vec::new(),
            });
        }
        let dims = state.shape().to_vec();
        let mut rest: Vec<Complex64> = state.body()?.to_vec();
        let mut left = 1usize;
        let mut sites = Vec::with_capacity(n);

        for (i, &d) in dims.iter().enumerate().take(n - 1) {
            let rows = left * d;
            let cols: usize = dims[i + 1..].iter().product();
            let (q, r) = orthonormalize(&rest, rows, cols, tolerance);
            let rank = q.len();

            let mut site = Vec::with_capacity(left * rank * d);
            for l in 0..left {
                for b in 0..rank {
                    for p in 0..d {
                        site.push(q[b][l * d + p]);
                    }
                }
            }
            sites.push(Tensor::from_data(vec![left, rank, d], site)?);
            rest = r;
            left = rank;
        }

        let d = dims[n - 1];
        sites.push(Tensor::from_data(vec![left, 1, d], rest)?);
        Self::from_sites(sites)
    }
}

/// Rank-revealing Gram-Schmidt on the columns of a row-major `rows x cols`
/// matrix. Returns orthonormal columns `q` and the row-major `rank x cols`
/// coefficients `r` with `m = q r`.
fn orthonormalize(
    m: &[Complex64],
    rows: usize,
    cols: usize,
    tolerance: f64,
) -> (Vec<Vec<Complex64>>, Vec<Complex64>) {
    let zero = Complex64::new(0.0, 0.0);
    let scale = m.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    let threshold = tolerance * scale.max(f64::MIN_POSITIVE);
    let mut q: Vec<Vec<Complex64>> = Vec::new();

    for c in 0..cols {
        if q.len() == rows {
            break;
        }
        let mut v: Vec<Complex64> = (0..rows).map(|r| m[r * cols + c]).collect();
        // two passes keep the basis orthogonal in floating point
        for _ in 0..2 {
            for basis in &q {
                let overlap: Complex64 = basis.iter().zip(&v).map(|(b, x)| b.conj() * x).sum();
                for (x, b) in v.iter_mut().zip(basis) {
                    *x -= overlap * b;
                }
            }
        }
        let norm = v.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
        if norm > threshold {
            q.push(v.into_iter().map(|x| x / norm).collect());
        }
    }

    if q.is_empty() {
        let mut e0 = vec![zero; rows];
        e0[0] = Complex64::new(1.0, 0.0);
        q.push(e0);
    }

    let rank = q.len();
    let mut r = vec![zero; rank * cols];
    for (b, basis) in q.iter().enumerate() {
        for c in 0..cols {
            r[b * cols + c] = (0..rows).map(|row| basis[row].conj() * m[row * cols + c]).sum();
        }
    }
    (q, r)
}

// ============================================================================
// Tests
// ============================================================================
