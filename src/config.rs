use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Result, VqaError};

/// Settings shared by every split's dataset.
///
/// Relative paths are resolved against the dataset's input directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub qst_vocab: PathBuf,
    pub ans_vocab: PathBuf,
    /// `tokenizer.json`, or a directory holding one
    pub tokenizer: PathBuf,
    pub max_qst_length: usize,
    pub max_num_ans: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            qst_vocab: PathBuf::from("vocab_questions.txt"),
            ans_vocab: PathBuf::from("vocab_answers.txt"),
            tokenizer: PathBuf::from("tokenizer.json"),
            max_qst_length: 30,
            max_num_ans: 10,
        }
    }
}

impl DatasetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_qst_length == 0 {
            return Err(VqaError::Config("max_qst_length must be > 0".to_string()));
        }
        if self.max_num_ans == 0 {
            return Err(VqaError::Config("max_num_ans must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn resolve(input_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            input_dir.join(path)
        }
    }
}

/// Everything needed to build the train/valid/test loaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub input_dir: PathBuf,
    pub input_vqa_train: PathBuf,
    pub input_vqa_valid: PathBuf,
    pub input_vqa_test: PathBuf,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub num_workers: usize,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default)]
    pub drop_last: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_batch_size() -> usize {
    64
}

fn default_shuffle() -> bool {
    true
}

impl LoaderConfig {
    pub fn new<P: Into<PathBuf>>(input_dir: P, train: P, valid: P, test: P) -> Self {
        Self {
            input_dir: input_dir.into(),
            input_vqa_train: train.into(),
            input_vqa_valid: valid.into(),
            input_vqa_test: test.into(),
            dataset: DatasetConfig::default(),
            batch_size: default_batch_size(),
            num_workers: 0,
            shuffle: default_shuffle(),
            drop_last: false,
            seed: None,
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: LoaderConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(VqaError::Config("batch_size must be > 0".to_string()));
        }
        self.dataset.validate()
    }
}
