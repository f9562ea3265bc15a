//! Decoders: latent embeddings -> edge scores.
//!
//! | Decoder | Score | Output |
//! |---------|-------|--------|
//! | [`InnerProductDecoder`] | sigmoid(z zᵀ), classified per class | `(N, N, C)` probabilities |
//! | [`DistMultDecoder`] | Σᵢ h_i r_i t_i per edge | `(E,)` |
//! | [`HetDistMultDecoder`] | (h ∘ t) R, all relations at once | `(P+Q, R+1)` |
//!
//! DistMult is the bilinear-diagonal scoring function of Yang et al.,
//! "Embedding Entities and Relations for Learning and Inference in Knowledge
//! Bases" (ICLR 2015). The heterogeneous variant keeps one reserved column
//! beyond the relation count and concatenates negative-edge scores below the
//! positive ones for contrastive training.

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{ops, Dropout, VarBuilder, VarMap};

use crate::classifier::LinearClassifier;
use crate::config::ModelConfig;
use crate::data::GraphBatch;
use crate::error::{Error, Result};
use crate::init::{reset_var_map, xavier_uniform};

/// Dense inner-product decoder with a per-class classifier head.
///
/// Computes the full `N x N` score matrix; quadratic in node count and
/// intended for small graphs only.
#[derive(Debug)]
pub struct InnerProductDecoder {
    dropout: Dropout,
    classifier: LinearClassifier,
    num_classes: usize,
}

impl InnerProductDecoder {
    /// Build from configuration. Uses `hidden_dim`, `dropout`, `num_classes`.
    pub fn new(cfg: &ModelConfig, device: &Device) -> Result<Self> {
        let classifier = LinearClassifier::new(
            cfg.num_classes,
            cfg.hidden_dim,
            cfg.num_classes,
            cfg.dropout,
            device,
        )?;
        Ok(Self {
            dropout: Dropout::new(cfg.dropout),
            classifier,
            num_classes: cfg.num_classes,
        })
    }

    /// Score every node pair against every class.
    ///
    /// Returns `(N, N, num_classes)` probabilities in `[0, 1]`.
    pub fn forward(&self, z: &Tensor, train: bool) -> Result<Tensor> {
        let z = self.dropout.forward(z, train)?;
        let adj = ops::sigmoid(&z.matmul(&z.t()?)?)?;
        let n = adj.dim(0)?;
        let adj = adj
            .unsqueeze(2)?
            .expand((n, n, self.num_classes))?
            .contiguous()?;
        let logits = self.classifier.forward(&adj, train)?;
        Ok(ops::sigmoid(&logits)?)
    }

    /// Re-initialize the classifier head.
    pub fn reset_parameters(&self) -> Result<()> {
        self.classifier.reset_parameters()
    }

    /// Learnable parameters, for the external optimizer.
    pub fn var_map(&self) -> &VarMap {
        self.classifier.var_map()
    }
}

/// DistMult decoder: bilinear-diagonal score per given edge.
pub struct DistMultDecoder {
    /// Relation table `(num_relations, hidden_dim)`.
    rel_emb: Tensor,
    varmap: VarMap,
}

impl std::fmt::Debug for DistMultDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistMultDecoder")
            .field("rel_emb", &self.rel_emb)
            .finish_non_exhaustive()
    }
}

impl DistMultDecoder {
    /// Build with one relation vector per relation type.
    pub fn new(num_relations: usize, hidden_dim: usize, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let rel_emb = vb.get_with_hints(
            (num_relations, hidden_dim),
            "rel_emb",
            xavier_uniform(&[num_relations, hidden_dim]),
        )?;
        Ok(Self { rel_emb, varmap })
    }

    /// Score each edge `(src, dst)` under its relation type.
    ///
    /// * `z`: latent embeddings `(N, hidden_dim)`
    /// * `edge_index`: `(2, E)` as `[sources; destinations]`
    /// * `edge_type`: `(E,)` relation per edge
    ///
    /// Returns `(E,)` raw scores.
    pub fn forward(&self, z: &Tensor, edge_index: &Tensor, edge_type: &Tensor) -> Result<Tensor> {
        let z_src = z.index_select(&edge_index.i(0)?, 0)?;
        let z_dst = z.index_select(&edge_index.i(1)?, 0)?;
        let rel = self.rel_emb.index_select(edge_type, 0)?;
        Ok(((z_src * rel)? * z_dst)?.sum(1)?)
    }

    /// Re-initialize the relation table.
    pub fn reset_parameters(&self) -> Result<()> {
        reset_var_map(&self.varmap)
    }

    /// Learnable parameters, for the external optimizer.
    pub fn var_map(&self) -> &VarMap {
        &self.varmap
    }
}

/// Heterogeneous DistMult decoder: scores every edge against every relation
/// type simultaneously.
pub struct HetDistMultDecoder {
    /// Relation table `(hidden_dim, num_relations + 1)`; the extra column is
    /// a reserved slot.
    rel_emb: Tensor,
    num_relations: usize,
    varmap: VarMap,
}

impl std::fmt::Debug for HetDistMultDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HetDistMultDecoder")
            .field("rel_emb", &self.rel_emb)
            .field("num_relations", &self.num_relations)
            .finish_non_exhaustive()
    }
}

impl HetDistMultDecoder {
    /// Build with one column per relation type plus a reserved one.
    pub fn new(num_relations: usize, hidden_dim: usize, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let rel_emb = vb.get_with_hints(
            (hidden_dim, num_relations + 1),
            "rel_emb",
            xavier_uniform(&[hidden_dim, num_relations + 1]),
        )?;
        Ok(Self {
            rel_emb,
            num_relations,
            varmap,
        })
    }

    /// Number of relation types (excluding the reserved column).
    pub fn num_relations(&self) -> usize {
        self.num_relations
    }

    /// Score the batch's positive edges, and negative edges when present.
    ///
    /// Returns `(P + Q, num_relations + 1)` where `Q = 0` without negatives.
    /// Negative rows are concatenated below the positive ones.
    pub fn forward(&self, z: &Tensor, batch: &GraphBatch) -> Result<Tensor> {
        let pos = batch.pos_edge_index.as_ref().ok_or_else(|| {
            Error::Validation("HetDistMultDecoder requires pos_edge_index".to_string())
        })?;
        let out = self.score_edges(z, pos)?;
        match &batch.neg_edge_index {
            Some(neg) => {
                let neg_out = self.score_edges(z, neg)?;
                Ok(Tensor::cat(&[&out, &neg_out], 0)?)
            }
            None => Ok(out),
        }
    }

    fn score_edges(&self, z: &Tensor, edge_index: &Tensor) -> Result<Tensor> {
        let z_src = z.index_select(&edge_index.i(0)?, 0)?;
        let z_dst = z.index_select(&edge_index.i(1)?, 0)?;
        Ok((z_src * z_dst)?.matmul(&self.rel_emb)?)
    }

    /// Re-initialize the relation table.
    pub fn reset_parameters(&self) -> Result<()> {
        reset_var_map(&self.varmap)
    }

    /// Learnable parameters, for the external optimizer.
    pub fn var_map(&self) -> &VarMap {
        &self.varmap
    }
}
