//! Graph batch consumed by encoders and decoders.

use candle_core::{Device, Tensor};

use crate::error::{Error, Result};

/// A batch of graph data.
///
/// Owned by the external data-loading pipeline and consumed read-only here.
/// Index tensors are `u32`; `edge_index` rows are `[sources; destinations]`.
#[derive(Debug, Clone)]
pub struct GraphBatch {
    /// Node feature matrix `(num_nodes, in_channels)`, absent in featureless mode.
    pub x: Option<Tensor>,
    /// Node identifiers `(num_nodes,)`, indexes learnable embedding tables.
    pub node_ids: Tensor,
    /// Message-passing edges `(2, num_edges)`.
    pub edge_index: Tensor,
    /// Relation type per message-passing edge `(num_edges,)`.
    pub edge_type: Tensor,
    /// Positive edges to score `(2, num_pos)`.
    pub pos_edge_index: Option<Tensor>,
    /// Negative sampled edges to score `(2, num_neg)`.
    pub neg_edge_index: Option<Tensor>,
    /// Number of nodes in the batch.
    pub num_nodes: usize,
}

impl GraphBatch {
    /// Create a batch from pre-built index tensors.
    ///
    /// Node ids default to `0..num_nodes`.
    pub fn new(num_nodes: usize, edge_index: Tensor, edge_type: Tensor) -> Result<Self> {
        let (rows, num_edges) = edge_index.dims2()?;
        if rows != 2 {
            return Err(Error::Validation(format!(
                "edge_index must have shape (2, E), got ({rows}, {num_edges})"
            )));
        }
        if edge_type.dim(0)? != num_edges {
            return Err(Error::Validation(format!(
                "edge_index has {} edges but edge_type has {}",
                num_edges,
                edge_type.dim(0)?
            )));
        }
        let device = edge_index.device().clone();
        let node_ids = Tensor::arange(0u32, num_nodes as u32, &device)?;
        Ok(Self {
            x: None,
            node_ids,
            edge_index,
            edge_type,
            pos_edge_index: None,
            neg_edge_index: None,
            num_nodes,
        })
    }

    /// Create a batch from edge lists (convenient for tests and small graphs).
    pub fn from_edges(
        num_nodes: usize,
        edges: &[(u32, u32)],
        edge_types: &[u32],
        device: &Device,
    ) -> Result<Self> {
        if edges.len() != edge_types.len() {
            return Err(Error::Validation(format!(
                "{} edges but {} edge types",
                edges.len(),
                edge_types.len()
            )));
        }
        let edge_index = edge_index_tensor(edges, device)?;
        let edge_type = Tensor::from_slice(edge_types, edge_types.len(), device)?;
        Self::new(num_nodes, edge_index, edge_type)
    }

    /// Attach node features. Row count must match the node count.
    pub fn with_features(mut self, x: Tensor) -> Result<Self> {
        let (rows, _) = x.dims2()?;
        if rows != self.num_nodes {
            return Err(Error::Validation(format!(
                "feature matrix has {} rows but batch has {} nodes",
                rows, self.num_nodes
            )));
        }
        self.x = Some(x);
        Ok(self)
    }

    /// Attach positive edges to score.
    pub fn with_pos_edges(mut self, edges: &[(u32, u32)]) -> Result<Self> {
        let device = self.edge_index.device().clone();
        self.pos_edge_index = Some(edge_index_tensor(edges, &device)?);
        Ok(self)
    }

    /// Attach negative sampled edges to score.
    pub fn with_neg_edges(mut self, edges: &[(u32, u32)]) -> Result<Self> {
        let device = self.edge_index.device().clone();
        self.neg_edge_index = Some(edge_index_tensor(edges, &device)?);
        Ok(self)
    }
}

/// Build a `(2, E)` index tensor from an edge list.
fn edge_index_tensor(edges: &[(u32, u32)], device: &Device) -> Result<Tensor> {
    let src: Vec<u32> = edges.iter().map(|&(s, _)| s).collect();
    let dst: Vec<u32> = edges.iter().map(|&(_, d)| d).collect();
    let src = Tensor::from_slice(&src, (1, edges.len()), device)?;
    let dst = Tensor::from_slice(&dst, (1, edges.len()), device)?;
    Ok(Tensor::cat(&[&src, &dst], 0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_from_edges() {
        let device = Device::Cpu;
        let batch =
            GraphBatch::from_edges(4, &[(0, 1), (1, 2), (2, 3)], &[0, 1, 0], &device).unwrap();
        assert_eq!(batch.num_nodes, 4);
        assert_eq!(batch.edge_index.dims2().unwrap(), (2, 3));
        assert_eq!(batch.node_ids.to_vec1::<u32>().unwrap(), vec![0, 1, 2, 3]);
        assert!(batch.x.is_none());
    }

    #[test]
    fn test_edge_type_length_mismatch() {
        let device = Device::Cpu;
        let err = GraphBatch::from_edges(3, &[(0, 1), (1, 2)], &[0], &device);
        assert!(err.is_err());
    }

    #[test]
    fn test_feature_row_mismatch() {
        let device = Device::Cpu;
        let batch = GraphBatch::from_edges(3, &[(0, 1)], &[0], &device).unwrap();
        let x = Tensor::zeros((5, 8), candle_core::DType::F32, &device).unwrap();
        assert!(batch.with_features(x).is_err());
    }

    #[test]
    fn test_pos_and_neg_edges() {
        let device = Device::Cpu;
        let batch = GraphBatch::from_edges(4, &[(0, 1)], &[0], &device)
            .unwrap()
            .with_pos_edges(&[(0, 1), (1, 2)])
            .unwrap()
            .with_neg_edges(&[(3, 0)])
            .unwrap();
        assert_eq!(batch.pos_edge_index.unwrap().dims2().unwrap(), (2, 2));
        assert_eq!(batch.neg_edge_index.unwrap().dims2().unwrap(), (2, 1));
    }
}
