//! Variational graph autoencoder components for link prediction and
//! multi-relational edge classification.
//!
//! `relgae` provides the model pieces of a GAE/VGAE pipeline; the data
//! loading, optimizer, and training loop live outside this crate. All tensor
//! math is delegated to [candle](https://github.com/huggingface/candle).
//!
//! # Components
//!
//! | Piece | Role |
//! |-------|------|
//! | [`RgcnEncoder`], [`MlpEncoder`], [`EmbeddingMlpEncoder`] | graph batch -> latent node embeddings |
//! | [`InnerProductDecoder`], [`DistMultDecoder`], [`HetDistMultDecoder`] | latent embeddings -> edge scores |
//! | [`LinearClassifier`] | decoder scores -> multi-label edge logits |
//! | [`vgae_loss`] | weighted reconstruction BCE + KL divergence |
//! | [`ModelRegistry`] | name -> model construction |
//!
//! # Example
//!
//! ```rust,ignore
//! use candle_core::Device;
//! use relgae::{GraphBatch, ModelConfig, ModelRegistry, Model};
//!
//! let device = Device::Cpu;
//! let batch = GraphBatch::from_edges(4, &[(0, 1), (1, 2)], &[0, 1], &device)?;
//! let cfg = ModelConfig::default().with_model("MlpEncoder").with_num_relations(2);
//!
//! let registry = ModelRegistry::with_builtins();
//! let encoder = registry.build(&cfg, &batch, &device)?;
//! // batch has no features, so the featureless variant was selected
//! assert!(matches!(encoder, Model::EmbeddingMlpEncoder(_)));
//! ```
//!
//! # Mode handling
//!
//! Every forward entry point takes an explicit `train: bool`; dropout is the
//! only operation that observes it. There is no hidden training/eval state.
//!
//! # References
//!
//! - Kipf & Welling (2016). "Variational Graph Auto-Encoders."
//! - Schlichtkrull et al. (2018). "Modeling Relational Data with Graph
//!   Convolutional Networks." ESWC.
//! - Yang et al. (2015). "Embedding Entities and Relations for Learning and
//!   Inference in Knowledge Bases." ICLR.
//! - Kingma & Welling (2014). "Auto-Encoding Variational Bayes." ICLR.

pub mod classifier;
pub mod config;
pub mod conv;
pub mod data;
pub mod decoder;
pub mod encoder;
pub mod error;
mod init;
pub mod loss;
pub mod registry;

pub use classifier::LinearClassifier;
pub use config::ModelConfig;
pub use conv::RgcnConv;
pub use data::GraphBatch;
pub use decoder::{DistMultDecoder, HetDistMultDecoder, InnerProductDecoder};
pub use encoder::{EmbeddingMlpEncoder, Encoder, MlpEncoder, RgcnEncoder};
pub use error::{Error, Result};
pub use loss::vgae_loss;
pub use registry::{Constructor, Model, ModelRegistry};
