use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{Result, VqaError};

pub const UNK_TOKEN: &str = "<unk>";

/// Word list read from a vocabulary file, one word per line.
///
/// A word's index is its line number. Indices are `usize`, so the `-1`
/// padding used for multiple-choice answers can never collide with one.
#[derive(Clone, Debug)]
pub struct VocabDict {
    word_list: Vec<String>,
    word2idx_dict: HashMap<String, usize>,
    unk2idx: Option<usize>,
}

impl VocabDict {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let vocab_load = |source| VqaError::VocabLoad {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(vocab_load)?);
        let word_list = reader
            .lines()
            .map(|line| line.map(|l| l.trim().to_string()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(vocab_load)?;

        let vocab = Self::from_words(word_list);
        log::info!("Loaded vocabulary {:?}: {} words", path, vocab.vocab_size());
        Ok(vocab)
    }

    /// Later duplicates win, matching a dict built over the list.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let word_list: Vec<String> = words.into_iter().map(Into::into).collect();
        let word2idx_dict: HashMap<String, usize> = word_list
            .iter()
            .enumerate()
            .map(|(n_w, w)| (w.clone(), n_w))
            .collect();
        let unk2idx = word2idx_dict.get(UNK_TOKEN).copied();

        Self {
            word_list,
            word2idx_dict,
            unk2idx,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.word_list.len()
    }

    pub fn unk2idx(&self) -> Option<usize> {
        self.unk2idx
    }

    pub fn idx2word(&self, n_w: usize) -> Option<&str> {
        self.word_list.get(n_w).map(String::as_str)
    }

    pub fn word2idx(&self, w: &str) -> Result<usize> {
        match self.word2idx_dict.get(w) {
            Some(&idx) => Ok(idx),
            None => self
                .unk2idx
                .ok_or_else(|| VqaError::UnknownWord(w.to_string())),
        }
    }

    pub fn tokenize_and_index(&self, sentence: &str) -> Result<Vec<usize>> {
        tokenize(sentence)
            .iter()
            .map(|w| self.word2idx(w))
            .collect()
    }
}

/// Lower-cases and splits on runs of non-word characters. Punctuation runs
/// are kept as tokens; whitespace is dropped.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let lowered = sentence.to_lowercase();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_word = true;
    for c in lowered.chars() {
        if !current.is_empty() && is_word(c) != current_is_word {
            push_trimmed(&mut tokens, &current);
            current.clear();
        }
        current_is_word = is_word(c);
        current.push(c);
    }
    push_trimmed(&mut tokens, &current);
    tokens
}

fn push_trimmed(tokens: &mut Vec<String>, run: &str) {
    let t = run.trim();
    if !t.is_empty() {
        tokens.push(t.to_string());
    }
}
