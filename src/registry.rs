//! Model factory: name -> constructor dispatch.
//!
//! An explicit registry over a closed set of model names replaces runtime
//! introspection: lookup failure reports every registered name, and nothing
//! is partially constructed on error. `register` opens the set to downstream
//! extensions.

use std::collections::BTreeMap;

use candle_core::Device;
use tracing::debug;

use crate::classifier::LinearClassifier;
use crate::config::ModelConfig;
use crate::data::GraphBatch;
use crate::decoder::{DistMultDecoder, HetDistMultDecoder, InnerProductDecoder};
use crate::encoder::{EmbeddingMlpEncoder, MlpEncoder, RgcnEncoder};
use crate::error::{Error, Result};

/// Any model the registry can build.
#[derive(Debug)]
pub enum Model {
    /// Relational graph-convolutional encoder.
    RgcnEncoder(RgcnEncoder),
    /// MLP encoder over node features.
    MlpEncoder(MlpEncoder),
    /// Featureless MLP encoder over a learnable node table.
    EmbeddingMlpEncoder(EmbeddingMlpEncoder),
    /// Dense inner-product decoder with classifier head.
    InnerProductDecoder(InnerProductDecoder),
    /// Single-relation bilinear decoder.
    DistMultDecoder(DistMultDecoder),
    /// All-relations bilinear decoder.
    HetDistMultDecoder(HetDistMultDecoder),
    /// Standalone classifier head.
    LinearClassifier(LinearClassifier),
}

impl Model {
    /// The registry name of this model's variant.
    pub fn name(&self) -> &'static str {
        match self {
            Model::RgcnEncoder(_) => "RgcnEncoder",
            // Both MLP variants are built under the one registered name; the
            // batch decides which at construction time.
            Model::MlpEncoder(_) | Model::EmbeddingMlpEncoder(_) => "MlpEncoder",
            Model::InnerProductDecoder(_) => "InnerProductDecoder",
            Model::DistMultDecoder(_) => "DistMultDecoder",
            Model::HetDistMultDecoder(_) => "HetDistMultDecoder",
            Model::LinearClassifier(_) => "LinearClassifier",
        }
    }
}

/// Constructor signature stored in the registry.
pub type Constructor = fn(&ModelConfig, &GraphBatch, &Device) -> Result<Model>;

/// Registry mapping model names to constructors.
///
/// Ordered map so the enumerated error message is deterministic.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    builders: BTreeMap<&'static str, Constructor>,
}

impl ModelRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every built-in model.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("RgcnEncoder", build_rgcn_encoder);
        registry.register("MlpEncoder", build_mlp_encoder);
        registry.register("InnerProductDecoder", build_inner_product_decoder);
        registry.register("DistMultDecoder", build_distmult_decoder);
        registry.register("HetDistMultDecoder", build_het_distmult_decoder);
        registry.register("LinearClassifier", build_linear_classifier);
        registry
    }

    /// Register a constructor under a name, replacing any previous entry.
    pub fn register(&mut self, name: &'static str, constructor: Constructor) {
        self.builders.insert(name, constructor);
    }

    /// Every registered model name, in lexical order.
    pub fn available(&self) -> Vec<&'static str> {
        self.builders.keys().copied().collect()
    }

    /// Instantiate the model named by `cfg.model`.
    ///
    /// Fails with [`Error::UnknownModel`] listing every registered name when
    /// the requested name has no constructor.
    pub fn build(&self, cfg: &ModelConfig, batch: &GraphBatch, device: &Device) -> Result<Model> {
        let constructor = self.builders.get(cfg.model.as_str()).ok_or_else(|| {
            Error::UnknownModel {
                requested: cfg.model.clone(),
                available: self.available().iter().map(|s| s.to_string()).collect(),
            }
        })?;
        debug!(model = %cfg.model, "building model");
        constructor(cfg, batch, device)
    }
}

fn build_rgcn_encoder(cfg: &ModelConfig, _batch: &GraphBatch, device: &Device) -> Result<Model> {
    Ok(Model::RgcnEncoder(RgcnEncoder::new(cfg, device)?))
}

fn build_mlp_encoder(cfg: &ModelConfig, batch: &GraphBatch, device: &Device) -> Result<Model> {
    // Featureless batches get the embedding-table variant; the choice is
    // fixed at construction, not re-examined per forward pass.
    match batch.x {
        Some(_) => Ok(Model::MlpEncoder(MlpEncoder::new(cfg, device)?)),
        None => Ok(Model::EmbeddingMlpEncoder(EmbeddingMlpEncoder::new(
            cfg,
            batch.num_nodes,
            device,
        )?)),
    }
}

fn build_inner_product_decoder(
    cfg: &ModelConfig,
    _batch: &GraphBatch,
    device: &Device,
) -> Result<Model> {
    Ok(Model::InnerProductDecoder(InnerProductDecoder::new(
        cfg, device,
    )?))
}

fn build_distmult_decoder(cfg: &ModelConfig, _batch: &GraphBatch, device: &Device) -> Result<Model> {
    Ok(Model::DistMultDecoder(DistMultDecoder::new(
        cfg.num_relations,
        cfg.hidden_dim,
        device,
    )?))
}

fn build_het_distmult_decoder(
    cfg: &ModelConfig,
    _batch: &GraphBatch,
    device: &Device,
) -> Result<Model> {
    Ok(Model::HetDistMultDecoder(HetDistMultDecoder::new(
        cfg.num_relations,
        cfg.hidden_dim,
        device,
    )?))
}

fn build_linear_classifier(cfg: &ModelConfig, _batch: &GraphBatch, device: &Device) -> Result<Model> {
    Ok(Model::LinearClassifier(LinearClassifier::new(
        cfg.num_classes,
        cfg.hidden_dim,
        cfg.num_classes,
        cfg.dropout,
        device,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cfg() -> ModelConfig {
        ModelConfig::default()
            .with_in_channels(10)
            .with_hidden_dim(20)
            .with_num_relations(2)
            .with_num_blocks(5)
    }

    fn featureless_batch() -> GraphBatch {
        GraphBatch::from_edges(4, &[(0, 1), (1, 2)], &[0, 1], &Device::Cpu).unwrap()
    }

    #[test]
    fn test_every_builtin_builds_matching_variant() {
        let registry = ModelRegistry::with_builtins();
        let batch = featureless_batch();
        for name in [
            "RgcnEncoder",
            "MlpEncoder",
            "InnerProductDecoder",
            "DistMultDecoder",
            "HetDistMultDecoder",
            "LinearClassifier",
        ] {
            let cfg = small_cfg().with_model(name);
            let model = registry.build(&cfg, &batch, &Device::Cpu).unwrap();
            assert_eq!(model.name(), name, "requested {name}");
        }
    }

    #[test]
    fn test_mlp_encoder_variant_follows_batch_features() {
        let registry = ModelRegistry::with_builtins();
        let cfg = small_cfg().with_model("MlpEncoder");

        let featureless = registry
            .build(&cfg, &featureless_batch(), &Device::Cpu)
            .unwrap();
        assert!(matches!(featureless, Model::EmbeddingMlpEncoder(_)));

        let x = candle_core::Tensor::randn(0f32, 1f32, (4, 10), &Device::Cpu).unwrap();
        let with_features = featureless_batch().with_features(x).unwrap();
        let featured = registry
            .build(&cfg, &with_features, &Device::Cpu)
            .unwrap();
        assert!(matches!(featured, Model::MlpEncoder(_)));
    }

    #[test]
    fn test_unknown_model_enumerates_choices() {
        let registry = ModelRegistry::with_builtins();
        let cfg = small_cfg().with_model("GraphTransformer");
        let err = registry
            .build(&cfg, &featureless_batch(), &Device::Cpu)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("GraphTransformer is not implemented"));
        for name in registry.available() {
            assert!(msg.contains(name), "error should list {name}");
        }
    }

    #[test]
    fn test_register_extends_the_set() {
        let mut registry = ModelRegistry::with_builtins();
        registry.register("AliasDistMult", |cfg, _batch, device| {
            Ok(Model::DistMultDecoder(DistMultDecoder::new(
                cfg.num_relations,
                cfg.hidden_dim,
                device,
            )?))
        });
        assert!(registry.available().contains(&"AliasDistMult"));
        let cfg = small_cfg().with_model("AliasDistMult");
        let model = registry
            .build(&cfg, &featureless_batch(), &Device::Cpu)
            .unwrap();
        assert!(matches!(model, Model::DistMultDecoder(_)));
    }
}
