//! Visual-question-answering sample loader.
//!
//! Reads pre-serialized VQA records, tokenizes each question to a fixed
//! length, decodes the referenced image and assembles per-sample tuples.
//! [`VqaDataLoader`] batches those samples in shuffled order, optionally
//! materializing them on a worker pool.
//!
//! ```ignore
//! use vqa_loader::{get_loader, DataLoader, LoaderConfig};
//!
//! let config = LoaderConfig::from_json_file("loader.json")?;
//! let loaders = get_loader(&config, &candle_core::Device::Cpu)?;
//! for batch in loaders.train.batcher() {
//!     let batch = batch?;
//!     println!("{:?}", batch.questions.dims());
//! }
//! ```

use std::path::PathBuf;

pub mod config;
pub mod data_loader;
pub mod image_transform;
pub mod question_tokenizer;
pub mod vocab_dict;
pub mod vqa_data_batcher;
pub mod vqa_data_loader;
pub mod vqa_dataset;
pub mod vqa_dataset_iter;
pub mod vqa_record;

#[cfg(test)]
mod test_utils;

pub use config::{DatasetConfig, LoaderConfig};
pub use data_loader::DataLoader;
pub use image_transform::{ImageTransform, SampleImage, ToTensorNormalize};
pub use question_tokenizer::{Encoder, QuestionTokenizer};
pub use vocab_dict::VocabDict;
pub use vqa_data_batcher::{BatchImages, VqaBatch, VqaDataBatcher};
pub use vqa_data_loader::{Phase, VqaDataLoader, VqaLoaders, get_loader};
pub use vqa_dataset::{VqaDataset, VqaSample};
pub use vqa_dataset_iter::VqaDatasetIter;
pub use vqa_record::{QuestionId, VqaRecord};

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum VqaError {
    #[error("failed to load records from {path:?}: {reason}")]
    DataLoad { path: PathBuf, reason: String },

    #[error("failed to load vocabulary from {path:?}: {source}")]
    VocabLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load tokenizer from {path:?}: {reason}")]
    TokenizerLoad { path: PathBuf, reason: String },

    #[error("failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("index {index} out of range for dataset of length {len}")]
    Index { index: usize, len: usize },

    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("word {0:?} not in dictionary (while dictionary does not contain <unk>)")]
    UnknownWord(String),

    #[error("record {index} has no valid answers")]
    MissingAnswers { index: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VqaError>;
