//! Quadratic program solvers.
//!
//! The controller depends only on the [`QpSolver`] trait. [`ClarabelSolver`] is the default,
//! an interior point solver; the QP is mapped onto its conic form
//!
//! ```text
//!   min ½ xᵀPx + qᵀx   s.t.  Ax + s = b,  s ∈ K
//! ```
//!
//! with the equality rows in the zero cone and the inequality and bound rows in the
//! nonnegative cone.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};
use crate::qp::QpProblem;

/// Solves one QP. `None` means no feasible solution was found; the caller must not move.
pub trait QpSolver: Send + Sync {
    fn solve(&self, problem: &QpProblem) -> Option<DVector<f64>>;
}

#[derive(Debug, Clone, Copy)]
pub struct ClarabelSolver {
    pub max_iter: u32,
    pub verbose: bool,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver { max_iter: 200, verbose: false }
    }
}

/// Nonzero entries as triplets, optionally keeping only the upper triangle.
fn triplets(matrix: &DMatrix<f64>, row_offset: usize, upper_only: bool,
            rows: &mut Vec<usize>, cols: &mut Vec<usize>, values: &mut Vec<f64>) {
    for c in 0..matrix.ncols() {
        for r in 0..matrix.nrows() {
            if upper_only && r > c {
                continue;
            }
            let value = matrix[(r, c)];
            if value != 0.0 {
                rows.push(r + row_offset);
                cols.push(c);
                values.push(value);
            }
        }
    }
}

impl QpSolver for ClarabelSolver {
    fn solve(&self, problem: &QpProblem) -> Option<DVector<f64>> {
        let width = problem.width();
        let n_eq = problem.a_eq.nrows();
        let n_in = problem.a_in.nrows();

        // P: upper triangle of Q
        let (mut pi, mut pj, mut pv) = (Vec::new(), Vec::new(), Vec::new());
        triplets(&problem.q, 0, true, &mut pi, &mut pj, &mut pv);
        let p = CscMatrix::new_from_triplets(width, width, pi, pj, pv);
        let q: Vec<f64> = problem.c.iter().copied().collect();

        // A = [Aeq; Ain; I; -I], b = [beq; bin; ub; -lb]
        let rows = n_eq + n_in + 2 * width;
        let (mut ai, mut aj, mut av) = (Vec::new(), Vec::new(), Vec::new());
        triplets(&problem.a_eq, 0, false, &mut ai, &mut aj, &mut av);
        triplets(&problem.a_in, n_eq, false, &mut ai, &mut aj, &mut av);
        for k in 0..width {
            ai.push(n_eq + n_in + k);
            aj.push(k);
            av.push(1.0);
            ai.push(n_eq + n_in + width + k);
            aj.push(k);
            av.push(-1.0);
        }
        let a = CscMatrix::new_from_triplets(rows, width, ai, aj, av);

        let mut b: Vec<f64> = Vec::with_capacity(rows);
        b.extend(problem.b_eq.iter());
        b.extend(problem.b_in.iter());
        b.extend(problem.ub.iter());
        b.extend(problem.lb.iter().map(|v| -v));

        let cones = [
            SupportedConeT::ZeroConeT(n_eq),
            SupportedConeT::NonnegativeConeT(n_in + 2 * width),
        ];

        let settings: DefaultSettings<f64> = match DefaultSettingsBuilder::default()
            .verbose(self.verbose)
            .max_iter(self.max_iter)
            .build() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("invalid solver settings: {}", e);
                return None;
            }
        };

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                let x = DVector::from_column_slice(&solver.solution.x);
                if x.len() == width && x.iter().all(|v| v.is_finite()) {
                    Some(x)
                } else {
                    warn!("solver returned a non-finite solution");
                    None
                }
            }
            status => {
                debug!(?status, "QP not solved");
                None
            }
        }
    }
}
