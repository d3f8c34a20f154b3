use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Result, VqaError};

/// Question identifier, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Int(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Int(id) => write!(f, "{}", id),
            QuestionId::Text(id) => f.write_str(id),
        }
    }
}

/// One pre-processed VQA example. Extra fields in the input are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VqaRecord {
    pub question_str: String,
    pub question_id: QuestionId,
    pub image_path: PathBuf,
    #[serde(default)]
    pub valid_answers: Option<Vec<String>>,
}

/// Reads a record list: JSON Lines for `.jsonl`, otherwise one JSON array.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<VqaRecord>> {
    let path = path.as_ref();
    let data_load = |reason: String| VqaError::DataLoad {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| data_load(e.to_string()))?;
    let reader = BufReader::new(file);

    let records = if path.extension().is_some_and(|ext| ext == "jsonl") {
        let mut records = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| data_load(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|e| data_load(format!("line {}: {}", n + 1, e)))?;
            records.push(record);
        }
        records
    } else {
        serde_json::from_reader(reader).map_err(|e| data_load(e.to_string()))?
    };

    log::info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}
