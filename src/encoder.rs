//! Encoders: graph batch -> latent node embeddings.
//!
//! Two families:
//!
//! - [`RgcnEncoder`]: two relational convolution layers with ReLU and
//!   dropout between them (Schlichtkrull et al., 2018).
//! - MLP encoders: three fully connected layers. [`MlpEncoder`] consumes
//!   node features; [`EmbeddingMlpEncoder`] is the featureless variant that
//!   substitutes a learnable per-node embedding table. The variant is chosen
//!   at construction time, not by branching inside a forward pass.
//!
//! Training/eval mode is an explicit `train` argument on every call; dropout
//! is the only mode-dependent operation.

use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Dropout, Linear, Module, VarBuilder, VarMap};
use tracing::debug;

use crate::config::ModelConfig;
use crate::conv::RgcnConv;
use crate::data::GraphBatch;
use crate::error::{Error, Result};
use crate::init::{reset_var_map, xavier_uniform};

/// Shared encode capability: batch in, latent matrix `(N, hidden_dim)` out.
pub trait Encoder {
    /// Compute latent node embeddings.
    fn encode(&self, batch: &GraphBatch, train: bool) -> Result<Tensor>;
}

/// Two-layer relational graph-convolutional encoder.
pub struct RgcnEncoder {
    conv1: RgcnConv,
    conv2: RgcnConv,
    dropout: Dropout,
    varmap: VarMap,
}

impl std::fmt::Debug for RgcnEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgcnEncoder")
            .field("conv1", &self.conv1)
            .field("conv2", &self.conv2)
            .field("dropout", &self.dropout)
            .finish_non_exhaustive()
    }
}

impl RgcnEncoder {
    /// Build from configuration. Uses `in_channels`, `hidden_dim`,
    /// `num_relations`, `num_blocks`, and `dropout`.
    pub fn new(cfg: &ModelConfig, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let conv1 = RgcnConv::new(
            cfg.in_channels,
            cfg.hidden_dim,
            cfg.num_relations,
            cfg.num_blocks,
            vb.pp("conv1"),
        )?;
        let conv2 = RgcnConv::new(
            cfg.hidden_dim,
            cfg.hidden_dim,
            cfg.num_relations,
            cfg.num_blocks,
            vb.pp("conv2"),
        )?;
        debug!(
            in_channels = cfg.in_channels,
            hidden_dim = cfg.hidden_dim,
            num_relations = cfg.num_relations,
            "built RgcnEncoder"
        );
        Ok(Self {
            conv1,
            conv2,
            dropout: Dropout::new(cfg.dropout),
            varmap,
        })
    }

    /// Re-initialize both convolution layers.
    pub fn reset_parameters(&self) -> Result<()> {
        reset_var_map(&self.varmap)
    }

    /// Learnable parameters, for the external optimizer.
    pub fn var_map(&self) -> &VarMap {
        &self.varmap
    }
}

impl Encoder for RgcnEncoder {
    fn encode(&self, batch: &GraphBatch, train: bool) -> Result<Tensor> {
        let x = batch
            .x
            .as_ref()
            .ok_or_else(|| Error::Validation("RgcnEncoder requires node features".to_string()))?;
        let z = self
            .conv1
            .forward(x, &batch.edge_index, &batch.edge_type)?
            .relu()?;
        let z = self.dropout.forward(&z, train)?;
        Ok(self.conv2.forward(&z, &batch.edge_index, &batch.edge_type)?)
    }
}

/// Three dense layers with ReLU after each and dropout after the first two.
#[derive(Debug)]
struct MlpStack {
    linear1: Linear,
    linear2: Linear,
    linear3: Linear,
    dropout: Dropout,
}

impl MlpStack {
    fn new(in_dim: usize, hidden_dim: usize, dropout: f32, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            linear1: linear(in_dim, hidden_dim, vb.pp("linear1"))?,
            linear2: linear(hidden_dim, hidden_dim, vb.pp("linear2"))?,
            linear3: linear(hidden_dim, hidden_dim, vb.pp("linear3"))?,
            dropout: Dropout::new(dropout),
        })
    }

    fn forward(&self, h: &Tensor, train: bool) -> Result<Tensor> {
        let h = self.linear1.forward(h)?.relu()?;
        let h = self.dropout.forward(&h, train)?;
        let h = self.linear2.forward(&h)?.relu()?;
        let h = self.dropout.forward(&h, train)?;
        Ok(self.linear3.forward(&h)?.relu()?)
    }
}

/// MLP encoder over externally supplied node features.
pub struct MlpEncoder {
    stack: MlpStack,
    varmap: VarMap,
}

impl std::fmt::Debug for MlpEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlpEncoder")
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl MlpEncoder {
    /// Build from configuration. Uses `in_channels`, `hidden_dim`, `dropout`.
    pub fn new(cfg: &ModelConfig, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let stack = MlpStack::new(cfg.in_channels, cfg.hidden_dim, cfg.dropout, vb)?;
        Ok(Self { stack, varmap })
    }

    /// Re-initialize all layers.
    pub fn reset_parameters(&self) -> Result<()> {
        reset_var_map(&self.varmap)
    }

    /// Learnable parameters, for the external optimizer.
    pub fn var_map(&self) -> &VarMap {
        &self.varmap
    }
}

impl Encoder for MlpEncoder {
    fn encode(&self, batch: &GraphBatch, train: bool) -> Result<Tensor> {
        let x = batch
            .x
            .as_ref()
            .ok_or_else(|| Error::Validation("MlpEncoder requires node features".to_string()))?;
        self.stack.forward(x, train)
    }
}

/// Featureless MLP encoder: input rows come from a learnable per-node
/// embedding table indexed by `batch.node_ids`.
pub struct EmbeddingMlpEncoder {
    node_embeddings: Tensor,
    stack: MlpStack,
    varmap: VarMap,
}

impl std::fmt::Debug for EmbeddingMlpEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingMlpEncoder")
            .field("node_embeddings", &self.node_embeddings)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl EmbeddingMlpEncoder {
    /// Build from configuration. The table has one `hidden_dim` row per node.
    pub fn new(cfg: &ModelConfig, num_nodes: usize, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let node_embeddings = vb.get_with_hints(
            (num_nodes, cfg.hidden_dim),
            "node_embeddings",
            xavier_uniform(&[num_nodes, cfg.hidden_dim]),
        )?;
        let stack = MlpStack::new(cfg.hidden_dim, cfg.hidden_dim, cfg.dropout, vb)?;
        debug!(num_nodes, hidden_dim = cfg.hidden_dim, "built EmbeddingMlpEncoder");
        Ok(Self {
            node_embeddings,
            stack,
            varmap,
        })
    }

    /// Re-initialize the embedding table and all layers.
    pub fn reset_parameters(&self) -> Result<()> {
        reset_var_map(&self.varmap)
    }

    /// Learnable parameters, for the external optimizer.
    pub fn var_map(&self) -> &VarMap {
        &self.varmap
    }
}

impl Encoder for EmbeddingMlpEncoder {
    fn encode(&self, batch: &GraphBatch, train: bool) -> Result<Tensor> {
        let h = self.node_embeddings.index_select(&batch.node_ids, 0)?;
        self.stack.forward(&h, train)
    }
}
