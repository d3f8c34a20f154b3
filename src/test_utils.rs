//! Fixture files for unit tests.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use serde_json::{Value, json};

pub const QUESTION_WORDS: &[&str] = &[
    "[PAD]", "[UNK]", "is", "this", "red", "or", "orange", "what", "color", "the", "bus", "?",
];

pub const ANSWER_WORDS: &[&str] = &["<unk>", "yes", "no", "red", "orange", "blue"];

/// Word-level tokenizer over [`QUESTION_WORDS`], split on whitespace.
pub fn write_tokenizer(dir: &Path) -> std::io::Result<PathBuf> {
    let vocab: serde_json::Map<String, Value> = QUESTION_WORDS
        .iter()
        .enumerate()
        .map(|(i, w)| (w.to_string(), json!(i)))
        .collect();
    let tokenizer = json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    });
    let path = dir.join("tokenizer.json");
    std::fs::write(&path, tokenizer.to_string())?;
    Ok(path)
}

pub fn write_vocabs(dir: &Path) -> std::io::Result<()> {
    let questions: Vec<&str> = QUESTION_WORDS[2..].to_vec();
    std::fs::write(
        dir.join("vocab_questions.txt"),
        format!("<unk>\n{}\n", questions.join("\n")),
    )?;
    std::fs::write(dir.join("vocab_answers.txt"), ANSWER_WORDS.join("\n"))
}

/// Temp dir holding `tokenizer.json` and both vocabulary files.
pub fn fixture_dir() -> std::io::Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    write_tokenizer(dir.path())?;
    write_vocabs(dir.path())?;
    Ok(dir)
}

pub fn write_image(dir: &Path, name: &str, width: u32, height: u32, pixel: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb(pixel))
        .save(&path)
        .unwrap();
    path
}

pub fn write_records(dir: &Path, name: &str, records: &Value) -> std::io::Result<()> {
    std::fs::write(dir.join(name), records.to_string())
}

pub fn answer_idx(word: &str) -> i64 {
    ANSWER_WORDS.iter().position(|w| *w == word).unwrap() as i64
}
