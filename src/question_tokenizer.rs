use std::path::Path;

use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::{Result, VqaError};

pub const PAD_TOKEN: &str = "[PAD]";

pub trait Encoder {
    fn encode(&self, txt: &str) -> Result<Vec<u32>>;
}

pub trait Decoder {
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// Pretrained tokenizer that always yields exactly `max_length` ids: no
/// special tokens, truncated on the right and right-padded with `[PAD]`.
#[derive(Clone)]
pub struct QuestionTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
    pad_id: u32,
}

impl QuestionTokenizer {
    /// Loads a `tokenizer.json`, or the one inside `path` when it is a directory.
    pub fn from_file<P: AsRef<Path>>(path: P, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            path.join("tokenizer.json")
        } else {
            path.to_path_buf()
        };
        let tokenizer = Tokenizer::from_file(&file).map_err(|e| VqaError::TokenizerLoad {
            path: file.clone(),
            reason: e.to_string(),
        })?;
        log::info!(
            "Loaded tokenizer {:?}: vocab size {}",
            file,
            tokenizer.get_vocab_size(true)
        );
        Self::new(tokenizer, max_length)
    }

    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(VqaError::Config("max_qst_length must be > 0".to_string()));
        }
        let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or_else(|| {
            log::warn!("tokenizer has no {} token, padding with id 0", PAD_TOKEN);
            0
        });

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| VqaError::Config(format!("invalid truncation: {}", e)))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token: PAD_TOKEN.to_string(),
            ..Default::default()
        }));

        Ok(Self {
            tokenizer,
            max_length,
            pad_id,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }
}

impl Encoder for QuestionTokenizer {
    fn encode(&self, txt: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(txt, false)
            .map_err(|e| VqaError::Tokenize(e.to_string()))?;

        // a post-processor in the tokenizer file may still add tokens
        let mut ids = encoding.get_ids().to_vec();
        ids.truncate(self.max_length);
        ids.resize(self.max_length, self.pad_id);
        Ok(ids)
    }
}

impl Decoder for QuestionTokenizer {
    fn decode(&self, tokens: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(|e| VqaError::Tokenize(e.to_string()))
    }
}
