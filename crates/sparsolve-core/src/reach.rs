//! Pattern reachability: which factor entries a single column touches.
//!
//! Both factorization kernels need, per column, the set of earlier columns
//! that feed into it, in an order where every column is listed after the
//! columns it depends on. For Cholesky that set is a union of elimination
//! tree paths ([`ereach`]); for LU, where no tree exists until the column is
//! eliminated, it is a depth-first search over the partially built factor
//! ([`reach`]).
//!
//! Both routines share a calling convention: the result is written into the
//! tail of a caller-owned scratch array `s`, and the returned index `top`
//! marks its start, so the pattern is `s[top..n]` and no per-call allocation
//! happens. Visited flags are versioned by a caller-chosen mark value, which
//! lets one workspace serve every column of a factorization without a
//! clearing pass.

use crate::csc::CscMatrix;
use crate::scalar::Scalar;

/// Nonzero pattern of row `k` of the Cholesky factor, computed by climbing
/// the elimination tree from every entry of column `k` of `c` until an
/// already visited node.
///
/// Writes the pattern into `s[top..n]` and returns `top`. Within the result,
/// descendants precede their ancestors, so a left-to-right sweep respects
/// the numeric dependencies. Uses `k + 1` as the visit mark, so one
/// `visited` array (initially all zero) serves an ascending sweep over all
/// columns.
///
/// `parent` must be the elimination tree of `c` itself; climbing a foreign
/// tree can run past the root and panic.
pub(crate) fn ereach<T: Scalar>(
    c: &CscMatrix<T>,
    k: usize,
    parent: &[usize],
    visited: &mut [usize],
    s: &mut [usize],
) -> usize {
    let n = parent.len();
    let mark = k + 1;
    let mut top = n;
    visited[k] = mark;
    for p in c.col_range(k) {
        let seed = c.row_idx[p];
        if seed >= k {
            continue;
        }
        // climb until a node already seen for this column; k itself is
        // marked, so the climb cannot leave the subtree below k
        let mut len = 0;
        let mut i = seed;
        while visited[i] != mark {
            s[len] = i;
            len += 1;
            visited[i] = mark;
            i = parent[i];
        }
        // unwind the climbed path onto the shrinking output tail; the seed
        // ends up first in its segment, ancestors after it
        while len > 0 {
            len -= 1;
            top -= 1;
            s[top] = s[len];
        }
    }
    top
}

/// Rows reachable from `seeds` through the partially built lower factor of
/// an LU decomposition.
///
/// A row that has been chosen as the pivot of column `j` (recorded as
/// `pivot_of_row[row] == j`) has the below-diagonal entries of that column
/// as its out-edges; rows not yet pivotal (`pivot_of_row[row] == n`) are
/// sinks. The reachable set lands in `s[top..n]` in topological order, every
/// row after the rows whose elimination feeds it.
///
/// The search keeps an explicit stack of `(row, scan position)` frames so a
/// node is emitted only once all of its descendants are, which is what makes
/// the order topological on this graph.
pub(crate) fn reach(
    l_col_ptr: &[usize],
    l_row_idx: &[usize],
    seeds: &[usize],
    pivot_of_row: &[usize],
    mark: usize,
    visited: &mut [usize],
    s: &mut [usize],
    stack: &mut Vec<(usize, usize)>,
) -> usize {
    let n = visited.len();
    let mut top = n;
    for &seed in seeds {
        if visited[seed] != mark {
            top = dfs(
                seed,
                l_col_ptr,
                l_row_idx,
                pivot_of_row,
                mark,
                visited,
                s,
                stack,
                top,
            );
        }
    }
    top
}

fn dfs(
    seed: usize,
    l_col_ptr: &[usize],
    l_row_idx: &[usize],
    pivot_of_row: &[usize],
    mark: usize,
    visited: &mut [usize],
    s: &mut [usize],
    stack: &mut Vec<(usize, usize)>,
    mut top: usize,
) -> usize {
    let n = visited.len();
    let col_start = |row: usize| {
        let j = pivot_of_row[row];
        if j == n {
            0
        } else {
            l_col_ptr[j]
        }
    };
    stack.clear();
    visited[seed] = mark;
    stack.push((seed, col_start(seed)));
    while !stack.is_empty() {
        let depth = stack.len() - 1;
        let node = stack[depth].0;
        let j = pivot_of_row[node];
        let end = if j == n { 0 } else { l_col_ptr[j + 1] };
        let mut next_child = None;
        while stack[depth].1 < end {
            let child = l_row_idx[stack[depth].1];
            stack[depth].1 += 1;
            if visited[child] != mark {
                next_child = Some(child);
                break;
            }
        }
        match next_child {
            Some(child) => {
                visited[child] = mark;
                stack.push((child, col_start(child)));
            }
            None => {
                // all descendants emitted; the node itself may go out
                stack.pop();
                top -= 1;
                s[top] = node;
            }
        }
    }
    top
}
