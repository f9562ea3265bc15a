//! Model hyperparameter configuration.

use serde::{Deserialize, Serialize};

/// Hyperparameters shared by all model constructors.
///
/// Supplied externally (CLI, config file) and read-only during construction.
/// Unknown fields are rejected at deserialization time; missing fields fall
/// back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Model class to instantiate (see `ModelRegistry`).
    pub model: String,
    /// Latent / hidden dimension (default: 64).
    pub hidden_dim: usize,
    /// Dropout rate, active only when `train = true` (default: 0.2).
    pub dropout: f32,
    /// Number of edge classes for multi-label classification (default: 10).
    pub num_classes: usize,
    /// Input node feature dimension (default: 300).
    pub in_channels: usize,
    /// Number of distinct edge/relation types (default: 8).
    pub num_relations: usize,
    /// Diagonal blocks per relation weight in the RGCN layers (default: 5).
    pub num_blocks: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "RgcnEncoder".to_string(),
            hidden_dim: 64,
            dropout: 0.2,
            num_classes: 10,
            in_channels: 300,
            num_relations: 8,
            num_blocks: 5,
        }
    }
}

impl ModelConfig {
    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the hidden dimension.
    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    /// Set the dropout rate.
    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    /// Set the number of edge classes.
    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    /// Set the input feature dimension.
    pub fn with_in_channels(mut self, in_channels: usize) -> Self {
        self.in_channels = in_channels;
        self
    }

    /// Set the number of relation types.
    pub fn with_num_relations(mut self, num_relations: usize) -> Self {
        self.num_relations = num_relations;
        self
    }

    /// Set the number of diagonal blocks per relation weight.
    pub fn with_num_blocks(mut self, num_blocks: usize) -> Self {
        self.num_blocks = num_blocks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ModelConfig::default();
        assert_eq!(cfg.model, "RgcnEncoder");
        assert_eq!(cfg.hidden_dim, 64);
        assert_eq!(cfg.num_blocks, 5);
    }

    #[test]
    fn test_builders() {
        let cfg = ModelConfig::default()
            .with_model("DistMultDecoder")
            .with_hidden_dim(32)
            .with_num_relations(4);
        assert_eq!(cfg.model, "DistMultDecoder");
        assert_eq!(cfg.hidden_dim, 32);
        assert_eq!(cfg.num_relations, 4);
    }

    #[test]
    fn test_serde_round_trip() {
        let cfg = ModelConfig::default().with_dropout(0.5);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dropout, 0.5);
        assert_eq!(back.model, cfg.model);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let cfg: ModelConfig = serde_json::from_str(r#"{"model": "MlpEncoder"}"#).unwrap();
        assert_eq!(cfg.model, "MlpEncoder");
        assert_eq!(cfg.in_channels, 300);
    }
}
