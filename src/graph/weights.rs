use ahash::AHashMap;
use serde::Serialize;

use crate::config::{Contiguity, Normalization};
use crate::error::{Error, Result};
use crate::feature::FeatureId;

/// An unordered neighbor pair, stored by id-order index with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdjacencyEdge {
    pub a: u32,
    pub b: u32,
    /// Length of the shared boundary; 0 for a point contact.
    pub shared_boundary_length: f64,
}

impl AdjacencyEdge {
    pub fn new(a: u32, b: u32, shared_boundary_length: f64) -> Self {
        Self { a: a.min(b), b: a.max(b), shared_boundary_length }
    }
}

/// A sparse spatial weights matrix in compressed sparse row format.
///
/// Row `i` belongs to the `i`-th feature in id order; neighbors within a row are
/// sorted by index (hence by id). Symmetric by construction. Isolated features
/// have empty rows.
#[derive(Debug, Clone)]
pub struct WeightsMatrix {
    ids: Vec<FeatureId>,
    lookup: AHashMap<FeatureId, u32>,
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
    weights: Vec<f64>,
    edges: Vec<AdjacencyEdge>,
    contiguity: Contiguity,
    normalization: Normalization,
}

impl WeightsMatrix {
    /// Construct a matrix from feature ids and unordered neighbor pairs indexing into `ids`.
    ///
    /// Rows are reordered by id; duplicate pairs are merged, self-pairs and
    /// out-of-range indices are rejected.
    pub fn from_edges(ids: Vec<FeatureId>, edges: Vec<AdjacencyEdge>,
        contiguity: Contiguity, normalization: Normalization,
    ) -> Result<Self> {
        let n = ids.len();
        if n > u32::MAX as usize { return Err(Error::config("too many features for a weights matrix")) }

        // Permutation from the caller's order to id order.
        let mut order = (0..n).collect::<Vec<_>>();
        order.sort_by(|&i, &j| ids[i].cmp(&ids[j]));
        if let Some(pair) = order.windows(2).find(|pair| ids[pair[0]] == ids[pair[1]]) {
            return Err(Error::DuplicateId(ids[pair[0]].clone()));
        }
        let mut rank = vec![0u32; n];
        order.iter().enumerate().for_each(|(r, &i)| rank[i] = r as u32);

        let mut edges = edges.into_iter()
            .map(|edge| {
                if edge.a as usize >= n || edge.b as usize >= n {
                    return Err(Error::config(format!("edge ({}, {}) out of range for {n} features", edge.a, edge.b)));
                }
                if edge.a == edge.b {
                    return Err(Error::config(format!("self-edge on feature {}", ids[edge.a as usize])));
                }
                Ok(AdjacencyEdge::new(rank[edge.a as usize], rank[edge.b as usize], edge.shared_boundary_length))
            })
            .collect::<Result<Vec<_>>>()?;
        edges.sort_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));
        edges.dedup_by(|next, kept| next.a == kept.a && next.b == kept.b);

        let mut degree = vec![0u32; n];
        edges.iter().for_each(|edge| { degree[edge.a as usize] += 1; degree[edge.b as usize] += 1 });

        let offsets = std::iter::once(0u32).chain(
            degree.iter().scan(0u32, |acc, &d| { *acc += d; Some(*acc) })
        ).collect::<Vec<u32>>();

        // Edges are sorted by (a, b), so every row fills in ascending order.
        let mut cursor = offsets[..n].to_vec();
        let mut neighbors = vec![0u32; 2 * edges.len()];
        for edge in &edges {
            neighbors[cursor[edge.a as usize] as usize] = edge.b;
            cursor[edge.a as usize] += 1;
            neighbors[cursor[edge.b as usize] as usize] = edge.a;
            cursor[edge.b as usize] += 1;
        }

        let weights = match normalization {
            Normalization::Binary => vec![1.0; neighbors.len()],
            Normalization::RowStandardized => (0..n)
                .flat_map(|i| {
                    let d = degree[i] as usize;
                    std::iter::repeat_n(1.0 / d as f64, d)
                })
                .collect(),
        };

        let ids = order.into_iter().map(|i| ids[i].clone()).collect::<Vec<_>>();
        let lookup = ids.iter().enumerate().map(|(i, id)| (id.clone(), i as u32)).collect();

        Ok(Self { ids, lookup, offsets, neighbors, weights, edges, contiguity, normalization })
    }

    /// Get the number of rows (features).
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Feature ids in row order.
    #[inline] pub fn ids(&self) -> &[FeatureId] { &self.ids }

    #[inline] pub fn id(&self, row: usize) -> &FeatureId { &self.ids[row] }

    #[inline]
    pub fn index_of(&self, id: &FeatureId) -> Option<usize> {
        self.lookup.get(id).map(|&i| i as usize)
    }

    #[inline] pub fn contiguity(&self) -> Contiguity { self.contiguity }

    #[inline] pub fn normalization(&self) -> Normalization { self.normalization }

    /// Unordered neighbor pairs, sorted by `(a, b)`.
    #[inline] pub fn edges(&self) -> &[AdjacencyEdge] { &self.edges }

    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Get the range of CSR entries for a given row.
    #[inline]
    fn range(&self, row: usize) -> std::ops::Range<usize> {
        self.offsets[row] as usize .. self.offsets[row + 1] as usize
    }

    /// Get the number of neighbors of a given row.
    #[inline] pub fn degree(&self, row: usize) -> usize { self.range(row).len() }

    #[inline] pub fn is_isolated(&self, row: usize) -> bool { self.degree(row) == 0 }

    /// Rows with no neighbors.
    pub fn isolated(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&row| self.is_isolated(row))
    }

    /// Neighbor rows of a given row, ascending.
    #[inline]
    pub fn neighbors(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors[self.range(row)].iter().map(|&j| j as usize)
    }

    /// Neighbor rows paired with their weights.
    #[inline]
    pub fn neighbors_with_weights(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.range(row);
        self.neighbors[range.clone()].iter().zip(&self.weights[range])
            .map(|(&j, &w)| (j as usize, w))
    }

    /// `w_ij`, or 0 when `j` is not a neighbor of `i`.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        let range = self.range(i);
        match self.neighbors[range.clone()].binary_search(&(j as u32)) {
            Ok(k) => self.weights[range.start + k],
            Err(_) => 0.0,
        }
    }

    #[inline]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.neighbors[self.range(i)].binary_search(&(j as u32)).is_ok()
    }

    /// Sum of the weights in a row.
    pub fn row_sum(&self, row: usize) -> f64 {
        self.weights[self.range(row)].iter().sum()
    }

    /// Neighbor ids and weights of a feature, in id order.
    pub fn neighbors_of(&self, id: &FeatureId) -> Option<Vec<(FeatureId, f64)>> {
        let row = self.index_of(id)?;
        Some(self.neighbors_with_weights(row).map(|(j, w)| (self.ids[j].clone(), w)).collect())
    }
}
