//! Fill-reducing orderings for the factorizations.
//!
//! # Overview
//!
//! The amount of fill a sparse factorization generates depends heavily on
//! the order rows and columns are eliminated in. This module provides a
//! minimum-degree ordering over a quotient graph: at every step the node
//! with the fewest remaining connections is eliminated, and the clique its
//! elimination would create is represented implicitly as an *element*
//! instead of materializing fill edges.
//!
//! Three modes are exposed through [`OrderMode`]:
//!
//! * `Natural` keeps the input order (no permutation),
//! * `MinDegreeSum` orders the symmetrized pattern `A + A^T`, the right
//!   choice ahead of a Cholesky factorization,
//! * `MinDegreeProduct` orders the pattern of `A^T * A`, which also covers
//!   rectangular inputs and suits LU with partial pivoting, where row
//!   choices are unknown at ordering time.
//!
//! Ties on degree break toward the smaller node index, so the result is
//! deterministic for a given pattern.
//!
//! # References
//!
//! 1. Amestoy, P.R., Davis, T.A., Duff, I.S.,
//!    "An Approximate Minimum Degree Ordering Algorithm",
//!    SIAM J. Matrix Anal. Appl., Vol. 17, No. 4, pp. 886-905, 1996
//! 2. Davis, T.A., "Direct Methods for Sparse Linear Systems",
//!    SIAM, 2006, Chapter 7: Fill-reducing orderings

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::csc::CscMatrix;
use crate::error::SparseError;
use crate::scalar::Scalar;

/// Ordering strategy applied before factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderMode {
    /// Keep the natural order; no permutation is computed.
    #[default]
    Natural,
    /// Minimum degree on the pattern of `A + A^T`.
    MinDegreeSum,
    /// Minimum degree on the pattern of `A^T * A`.
    MinDegreeProduct,
}

/// Computes the fill-reducing permutation for `a` under the given mode.
///
/// Returns `None` for the natural order, otherwise a permutation in
/// `perm[old] = new` convention over the columns of `a`. `MinDegreeSum`
/// requires a square matrix; `MinDegreeProduct` accepts any shape and
/// orders the `ncols` columns.
pub fn order<T: Scalar>(
    a: &CscMatrix<T>,
    mode: OrderMode,
) -> Result<Option<Vec<usize>>, SparseError> {
    match mode {
        OrderMode::Natural => Ok(None),
        OrderMode::MinDegreeSum => {
            if !a.is_square() {
                return Err(SparseError::NotSquare {
                    rows: a.nrows,
                    cols: a.ncols,
                });
            }
            let result = min_degree(a.ncols, &a.col_ptr, &a.row_idx);
            Ok(Some(result.perm))
        }
        OrderMode::MinDegreeProduct => {
            let (col_ptr, row_idx) = product_pattern(a);
            let result = min_degree(a.ncols, &col_ptr, &row_idx);
            Ok(Some(result.perm))
        }
    }
}

/// Pattern of `A^T * A` in CSC arrays: column `j` holds every column of `A`
/// that shares at least one row with column `j`.
fn product_pattern<T: Scalar>(a: &CscMatrix<T>) -> (Vec<usize>, Vec<usize>) {
    let m = a.ncols;
    // column r of the transpose lists the columns of A with a row-r entry
    let at = a.pattern().transpose();
    let mut col_ptr = Vec::with_capacity(m + 1);
    col_ptr.push(0);
    let mut row_idx = Vec::new();
    let mut mark = vec![usize::MAX; m];
    for j in 0..m {
        let start = row_idx.len();
        for p in a.col_range(j) {
            let r = a.row_idx[p];
            for q in at.col_range(r) {
                let i = at.row_idx[q];
                if mark[i] != j {
                    mark[i] = j;
                    row_idx.push(i);
                }
            }
        }
        row_idx[start..].sort_unstable();
        col_ptr.push(row_idx.len());
    }
    (col_ptr, row_idx)
}

/// Permutation produced by [`min_degree`], with counters describing the run.
#[derive(Debug, Clone)]
pub struct MinDegreeResult {
    /// Permutation: `perm[old] = new` elimination position.
    pub perm: Vec<usize>,
    /// Inverse permutation: `iperm[new] = old` node.
    pub iperm: Vec<usize>,
    /// Statistics from the elimination.
    pub stats: MinDegreeStats,
}

/// Counters collected while the quotient graph is consumed.
#[derive(Debug, Clone, Default)]
pub struct MinDegreeStats {
    /// Number of nodes ordered.
    pub n: usize,
    /// Stored entries of the input pattern.
    pub nnz: usize,
    /// Elements formed, one per eliminated node.
    pub elements_created: usize,
    /// Elements merged away into newer ones.
    pub elements_absorbed: usize,
}

/// Minimum-degree ordering of a symmetric pattern given in CSC arrays.
///
/// `col_ptr` must hold `n + 1` entries delimiting `row_idx`, as in
/// [`CscMatrix`]; a shorter slice will panic. The pattern is symmetrized on
/// the fly, so passing only one triangle, or an unsymmetric pattern, orders
/// `A + A^T`. Diagonal entries and row indices at or above `n` are ignored.
pub fn min_degree(n: usize, col_ptr: &[usize], row_idx: &[usize]) -> MinDegreeResult {
    if n == 0 {
        return MinDegreeResult {
            perm: vec![],
            iperm: vec![],
            stats: MinDegreeStats::default(),
        };
    }
    let mut graph = QuotientGraph::new(n, col_ptr, row_idx);
    graph.run();
    MinDegreeResult {
        perm: graph.perm,
        iperm: graph.iperm,
        stats: graph.stats,
    }
}

/// A node is either still a variable awaiting elimination or has become an
/// element standing in for the clique its elimination created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    /// Active variable with its current degree bound.
    Active(usize),
    /// Eliminated; the adjacency list now holds the element's reach.
    Eliminated,
}

struct QuotientGraph {
    n: usize,
    perm: Vec<usize>,
    iperm: Vec<usize>,
    state: Vec<NodeState>,
    /// Adjacency per node: variables list neighboring variables and
    /// elements; elements list the variables in their reach.
    adjacency: Vec<Vec<usize>>,
    /// Lazy min-heap of `(degree, node)`; stale entries are skipped when
    /// popped.
    queue: BinaryHeap<Reverse<(usize, usize)>>,
    /// Versioned visit marks shared by all traversals.
    visit: Vec<usize>,
    visit_gen: usize,
    stats: MinDegreeStats,
    ordered: usize,
}

impl QuotientGraph {
    fn new(n: usize, col_ptr: &[usize], row_idx: &[usize]) -> Self {
        let nnz = col_ptr[n];

        // symmetrize into undirected adjacency lists, dropping the diagonal
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for col in 0..n {
            for p in col_ptr[col]..col_ptr[col + 1] {
                let row = row_idx[p];
                if row == col || row >= n {
                    continue;
                }
                if !adjacency[col].contains(&row) {
                    adjacency[col].push(row);
                }
                if !adjacency[row].contains(&col) {
                    adjacency[row].push(col);
                }
            }
        }

        let mut state = Vec::with_capacity(n);
        let mut queue = BinaryHeap::with_capacity(n);
        for node in 0..n {
            let degree = adjacency[node].len();
            state.push(NodeState::Active(degree));
            queue.push(Reverse((degree, node)));
        }

        QuotientGraph {
            n,
            perm: vec![0; n],
            iperm: vec![0; n],
            state,
            adjacency,
            queue,
            visit: vec![0; n],
            visit_gen: 0,
            stats: MinDegreeStats {
                n,
                nnz,
                ..Default::default()
            },
            ordered: 0,
        }
    }

    fn run(&mut self) {
        while self.ordered < self.n {
            match self.pop_min_active() {
                Some(node) => self.eliminate(node),
                None => break,
            }
        }
    }

    /// Pops the active node with the smallest current degree, discarding
    /// entries the degree updates have made stale.
    fn pop_min_active(&mut self) -> Option<usize> {
        loop {
            let Reverse((degree, node)) = self.queue.pop()?;
            match self.state[node] {
                NodeState::Eliminated => continue,
                NodeState::Active(current) => {
                    if degree != current {
                        self.queue.push(Reverse((current, node)));
                        continue;
                    }
                    return Some(node);
                }
            }
        }
    }

    /// Turns `node` into an element covering its neighborhood, absorbs the
    /// elements it touched, and refreshes the degrees of affected variables.
    fn eliminate(&mut self, node: usize) {
        self.perm[node] = self.ordered;
        self.iperm[self.ordered] = node;
        self.ordered += 1;

        self.visit_gen += 1;
        let gen = self.visit_gen;

        let mut reached_vars: Vec<usize> = Vec::new();
        let mut reached_elems: Vec<usize> = Vec::new();

        for &nbr in &self.adjacency[node] {
            match self.state[nbr] {
                NodeState::Active(_) => {
                    if self.visit[nbr] != gen {
                        self.visit[nbr] = gen;
                        reached_vars.push(nbr);
                    }
                }
                NodeState::Eliminated => reached_elems.push(nbr),
            }
        }
        for &elem in &reached_elems {
            for &nbr in &self.adjacency[elem] {
                if let NodeState::Active(_) = self.state[nbr] {
                    if nbr != node && self.visit[nbr] != gen {
                        self.visit[nbr] = gen;
                        reached_vars.push(nbr);
                    }
                }
            }
        }

        self.state[node] = NodeState::Eliminated;
        self.adjacency[node] = reached_vars.clone();
        self.stats.elements_created += 1;

        for &elem in &reached_elems {
            self.absorb(elem, node);
        }
        for &var in &reached_vars {
            self.refresh_degree(var);
        }
    }

    /// Merges element `src` into `dst`: every variable that still pointed at
    /// `src` is redirected, and `src`'s reach folds into `dst`.
    fn absorb(&mut self, src: usize, dst: usize) {
        if src == dst {
            return;
        }
        let reach = std::mem::take(&mut self.adjacency[src]);
        for var in reach {
            if let NodeState::Active(_) = self.state[var] {
                if !self.adjacency[dst].contains(&var) {
                    self.adjacency[dst].push(var);
                }
                if let Some(pos) = self.adjacency[var].iter().position(|&x| x == src) {
                    // keep the list duplicate free when the variable already
                    // references dst directly
                    if self.adjacency[var].contains(&dst) {
                        self.adjacency[var].swap_remove(pos);
                    } else {
                        self.adjacency[var][pos] = dst;
                    }
                }
            }
        }
        self.stats.elements_absorbed += 1;
    }

    /// Recounts the variables reachable from `var` directly or through one
    /// element, and queues the new degree.
    fn refresh_degree(&mut self, var: usize) {
        if let NodeState::Eliminated = self.state[var] {
            return;
        }
        self.visit_gen += 1;
        let gen = self.visit_gen;
        self.visit[var] = gen;

        let mut degree = 0;
        for &nbr in &self.adjacency[var] {
            match self.state[nbr] {
                NodeState::Active(_) => {
                    if self.visit[nbr] != gen {
                        self.visit[nbr] = gen;
                        degree += 1;
                    }
                }
                NodeState::Eliminated => {
                    for &reached in &self.adjacency[nbr] {
                        if let NodeState::Active(_) = self.state[reached] {
                            if self.visit[reached] != gen {
                                self.visit[reached] = gen;
                                degree += 1;
                            }
                        }
                    }
                }
            }
        }

        self.state[var] = NodeState::Active(degree);
        self.queue.push(Reverse((degree, var)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify_permutation(result: &MinDegreeResult, n: usize) {
        assert_eq!(result.perm.len(), n, "perm length mismatch");
        assert_eq!(result.iperm.len(), n, "iperm length mismatch");

        let mut seen = vec![false; n];
        for &p in &result.perm {
            assert!(p < n, "perm value {} out of range", p);
            seen[p] = true;
        }
        assert!(seen.iter().all(|&x| x), "perm missing some values");

        for pos in 0..n {
            assert_eq!(
                result.perm[result.iperm[pos]], pos,
                "inverse relationship broken at position {}",
                pos
            );
        }
    }

    #[test]
    fn test_min_degree_diagonal() {
        // no off-diagonal coupling, any order works
        let col_ptr = vec![0, 1, 2, 3];
        let row_idx = vec![0, 1, 2];
        let result = min_degree(3, &col_ptr, &row_idx);
        verify_permutation(&result, 3);
    }

    #[test]
    fn test_min_degree_tridiagonal() {
        let col_ptr = vec![0, 2, 5, 7];
        let row_idx = vec![0, 1, 0, 1, 2, 1, 2];
        let result = min_degree(3, &col_ptr, &row_idx);
        verify_permutation(&result, 3);
    }

    #[test]
    fn test_min_degree_star_orders_leaves_first() {
        // node 0 is connected to every leaf; eliminating it first would
        // create a dense clique
        let col_ptr = vec![0, 4, 6, 8, 10];
        let row_idx = vec![0, 1, 2, 3, 0, 1, 0, 2, 0, 3];
        let result = min_degree(4, &col_ptr, &row_idx);
        verify_permutation(&result, 4);
        // once two leaves are gone the hub ties the last leaf at degree
        // one, so only the first two leaves are guaranteed to precede it
        assert!(
            result.perm[1] < result.perm[0] && result.perm[2] < result.perm[0],
            "leaves should be eliminated before the hub, got perm = {:?}",
            result.perm
        );
    }

    #[test]
    fn test_min_degree_empty() {
        let result = min_degree(0, &[0], &[]);
        assert!(result.perm.is_empty());
        assert!(result.iperm.is_empty());
    }

    #[test]
    fn test_min_degree_single_node() {
        let result = min_degree(1, &[0, 1], &[0]);
        verify_permutation(&result, 1);
        assert_eq!(result.perm, vec![0]);
    }

    #[test]
    fn test_min_degree_symmetrizes_one_triangle() {
        // upper triangle of a dense 2x2; the lower edge must be implied
        let col_ptr = vec![0, 1, 3];
        let row_idx = vec![0, 0, 1];
        let result = min_degree(2, &col_ptr, &row_idx);
        verify_permutation(&result, 2);
    }

    #[test]
    fn test_min_degree_ignores_out_of_range_rows() {
        // row indices at or above n carry no adjacency; only the 0-1 edge
        // remains, and exactly col_ptr[n] entries are read
        let col_ptr = vec![0, 2, 3];
        let row_idx = vec![1, 9, 0];
        let result = min_degree(2, &col_ptr, &row_idx);
        verify_permutation(&result, 2);
        assert_eq!(result.stats.nnz, 3);
    }

    #[test]
    fn test_min_degree_chain_starts_at_an_endpoint() {
        // path 0-1-2-3-4: endpoints have degree 1
        let n = 5;
        let mut col_ptr = vec![0];
        let mut row_idx = Vec::new();
        for i in 0..n {
            if i > 0 {
                row_idx.push(i - 1);
            }
            row_idx.push(i);
            if i < n - 1 {
                row_idx.push(i + 1);
            }
            col_ptr.push(row_idx.len());
        }
        let result = min_degree(n, &col_ptr, &row_idx);
        verify_permutation(&result, n);
        assert!(
            result.perm[0] < result.perm[2] || result.perm[4] < result.perm[2],
            "an endpoint should be eliminated before the middle"
        );
    }

    #[test]
    fn test_min_degree_ladder() {
        // 0-2-4
        // | | |
        // 1-3-5
        let col_ptr = vec![0, 3, 6, 10, 14, 17, 20];
        let row_idx = vec![
            0, 1, 2, // col 0
            0, 1, 3, // col 1
            0, 2, 3, 4, // col 2
            1, 2, 3, 5, // col 3
            2, 4, 5, // col 4
            3, 4, 5, // col 5
        ];
        let result = min_degree(6, &col_ptr, &row_idx);
        verify_permutation(&result, 6);
    }

    #[test]
    fn test_min_degree_statistics() {
        let col_ptr = vec![0, 2, 5, 7];
        let row_idx = vec![0, 1, 0, 1, 2, 1, 2];
        let result = min_degree(3, &col_ptr, &row_idx);
        assert_eq!(result.stats.n, 3);
        assert_eq!(result.stats.nnz, 7);
        assert!(result.stats.elements_created > 0);
    }

    #[test]
    fn test_min_degree_arrow_defers_dense_node() {
        // [ x x x x ]
        // [ x x . . ]
        // [ x . x . ]
        // [ x . . x ]
        let col_ptr = vec![0, 4, 6, 8, 10];
        let row_idx = vec![0, 1, 2, 3, 0, 1, 0, 2, 0, 3];
        let result = min_degree(4, &col_ptr, &row_idx);
        verify_permutation(&result, 4);
        assert!(result.perm[0] > 0, "dense node must not go first");
    }

    #[test]
    fn test_order_natural_is_identity() {
        let a = CscMatrix::from_triplets(2, 2, &[0, 1], &[0, 1], &[1.0, 1.0]).unwrap();
        assert_eq!(order(&a, OrderMode::Natural).unwrap(), None);
    }

    #[test]
    fn test_order_sum_requires_square() {
        let a = CscMatrix::<f64>::pattern_from_triplets(3, 2, &[0, 1], &[0, 1]).unwrap();
        assert!(matches!(
            order(&a, OrderMode::MinDegreeSum).unwrap_err(),
            SparseError::NotSquare { .. }
        ));
    }

    #[test]
    fn test_order_product_handles_rectangular() {
        // 3x2 matrix: the ordering lives on the 2 columns
        let a = CscMatrix::<f64>::pattern_from_triplets(3, 2, &[0, 1, 1, 2], &[0, 0, 1, 1])
            .unwrap();
        let perm = order(&a, OrderMode::MinDegreeProduct).unwrap().unwrap();
        assert_eq!(perm.len(), 2);
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1]);
    }

    #[test]
    fn test_product_pattern_links_columns_sharing_a_row() {
        // columns 0 and 1 share row 1; column 2 is isolated
        let a = CscMatrix::<f64>::pattern_from_triplets(
            3,
            3,
            &[0, 1, 1, 2],
            &[0, 0, 1, 2],
        )
        .unwrap();
        let (col_ptr, row_idx) = product_pattern(&a);
        assert_eq!(col_ptr, vec![0, 2, 4, 5]);
        assert_eq!(row_idx, vec![0, 1, 0, 1, 2]);
    }
}
