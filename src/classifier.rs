//! Multi-label edge classification head.

use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Dropout, Linear, Module, VarBuilder, VarMap};

use crate::error::Result;
use crate::init::reset_var_map;

/// Three-layer classifier over a per-class score representation.
///
/// `Linear(C -> H) -> ReLU -> dropout -> Linear(H -> H) -> ReLU -> dropout ->
/// Linear(H -> C)`. No activation on the last layer; the loss consumes raw
/// logits. Accepts any leading shape, e.g. the `(N, N, C)` replicated
/// adjacency from the inner-product decoder.
pub struct LinearClassifier {
    layers: Vec<Linear>,
    dropout: Dropout,
    num_classes: usize,
    varmap: VarMap,
}

impl std::fmt::Debug for LinearClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearClassifier")
            .field("layers", &self.layers)
            .field("dropout", &self.dropout)
            .field("num_classes", &self.num_classes)
            .finish_non_exhaustive()
    }
}

impl LinearClassifier {
    /// Build a classifier with `in_dim` input features per position.
    pub fn new(
        in_dim: usize,
        hidden_dim: usize,
        num_classes: usize,
        dropout: f32,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let layers = vec![
            linear(in_dim, hidden_dim, vb.pp("layer0"))?,
            linear(hidden_dim, hidden_dim, vb.pp("layer1"))?,
            linear(hidden_dim, num_classes, vb.pp("layer2"))?,
        ];
        Ok(Self {
            layers,
            dropout: Dropout::new(dropout),
            num_classes,
            varmap,
        })
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Forward pass; returns one logit per class in the last dimension.
    pub fn forward(&self, z: &Tensor, train: bool) -> Result<Tensor> {
        let mut h = z.clone();
        for layer in &self.layers[..self.layers.len() - 1] {
            h = layer.forward(&h)?.relu()?;
            h = self.dropout.forward(&h, train)?;
        }
        let last = &self.layers[self.layers.len() - 1];
        Ok(last.forward(&h)?)
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
