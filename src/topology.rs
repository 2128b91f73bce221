//! Topological (bond-count) distances over the molecular graph.

use std::collections::VecDeque;

use crate::Molecule;

/// Sentinel for atom pairs with no connecting path. Any value ≥ 11 is out of range for
/// the fingerprint, so disconnected pairs are naturally excluded downstream.
pub const UNREACHABLE: u32 = u32::MAX;

/// Full N×N shortest-path matrix over the bond graph, every edge weight 1.
/// Symmetric, zero diagonal; `UNREACHABLE` marks disconnected pairs. One BFS per atom.
pub fn distance_matrix(mol: &Molecule) -> Vec<Vec<u32>> {
    let n = mol.n_atoms();
    let mut dist = vec![vec![UNREACHABLE; n]; n];

    for start in 0..n {
        dist[start][start] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(u) = queue.pop_front() {
            let d = dist[start][u];
            for &(v, _) in &mol.adjacency[u] {
                if dist[start][v] == UNREACHABLE {
                    dist[start][v] = d + 1;
                    queue.push_back(v);
                }
            }
        }
    }

    dist
}
