use std::{ops::Deref, path::Path, sync::Arc};

use image::{RgbImage, io::Reader as ImageReader};
use rand::{Rng, seq::IndexedRandom};

use crate::{
    Result, VqaError,
    config::DatasetConfig,
    image_transform::{ImageTransform, SampleImage},
    question_tokenizer::{Encoder, QuestionTokenizer},
    vocab_dict::VocabDict,
    vqa_record::{QuestionId, VqaRecord, load_records},
};

/// Padding for unused multiple-choice slots. Vocabulary indices are never negative.
pub const NO_ANSWER: i64 = -1;

#[derive(Debug, Clone)]
pub struct VqaSample {
    pub image: SampleImage,
    pub question: Vec<u32>,
    pub qst_id: QuestionId,
    /// One of the valid answers, drawn uniformly on every access
    pub answer_label: Option<i64>,
    /// Valid answers left-aligned, padded with [`NO_ANSWER`]
    pub answer_multi_choice: Option<Vec<i64>>,
}

/// Indexed access to processed VQA samples. Cloning is cheap and clones
/// share the loaded records, vocabularies and tokenizer.
#[derive(Clone)]
pub struct VqaDataset(Arc<VqaDataset_>);

pub struct VqaDataset_ {
    records: Vec<VqaRecord>,
    qst_vocab: VocabDict,
    ans_vocab: VocabDict,
    tokenizer: QuestionTokenizer,
    max_num_ans: usize,
    load_ans: bool,
    transform: Option<Arc<dyn ImageTransform>>,
}

impl VqaDataset {
    pub fn new<P: AsRef<Path>>(
        input_dir: P,
        input_vqa: P,
        config: &DatasetConfig,
        transform: Option<Arc<dyn ImageTransform>>,
    ) -> Result<Self> {
        config.validate()?;
        let input_dir = input_dir.as_ref();

        let records = load_records(input_dir.join(input_vqa.as_ref()))?;
        let qst_vocab = VocabDict::new(DatasetConfig::resolve(input_dir, &config.qst_vocab))?;
        let ans_vocab = VocabDict::new(DatasetConfig::resolve(input_dir, &config.ans_vocab))?;
        let tokenizer = QuestionTokenizer::from_file(
            DatasetConfig::resolve(input_dir, &config.tokenizer),
            config.max_qst_length,
        )?;

        Self::from_parts(
            records,
            qst_vocab,
            ans_vocab,
            tokenizer,
            config.max_num_ans,
            transform,
        )
    }

    pub fn from_parts(
        records: Vec<VqaRecord>,
        qst_vocab: VocabDict,
        ans_vocab: VocabDict,
        tokenizer: QuestionTokenizer,
        max_num_ans: usize,
        transform: Option<Arc<dyn ImageTransform>>,
    ) -> Result<Self> {
        if max_num_ans == 0 {
            return Err(VqaError::Config("max_num_ans must be > 0".to_string()));
        }

        let load_ans = match records.first() {
            Some(first) => first.valid_answers.is_some(),
            None => {
                log::warn!("empty record list, answers will not be loaded");
                false
            }
        };

        log::info!(
            "Dataset ready: {} records, load_ans={}, max_qst_length={}, max_num_ans={}",
            records.len(),
            load_ans,
            tokenizer.max_length(),
            max_num_ans
        );

        let dataset_ = VqaDataset_ {
            records,
            qst_vocab,
            ans_vocab,
            tokenizer,
            max_num_ans,
            load_ans,
            transform,
        };

        Ok(Self(Arc::new(dataset_)))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load_ans(&self) -> bool {
        self.load_ans
    }

    pub fn max_qst_length(&self) -> usize {
        self.tokenizer.max_length()
    }

    pub fn max_num_ans(&self) -> usize {
        self.max_num_ans
    }

    pub fn qst_vocab(&self) -> &VocabDict {
        &self.qst_vocab
    }

    pub fn ans_vocab(&self) -> &VocabDict {
        &self.ans_vocab
    }

    pub fn tokenizer(&self) -> &QuestionTokenizer {
        &self.tokenizer
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub fn record(&self, idx: usize) -> Result<&VqaRecord> {
        self.records.get(idx).ok_or(VqaError::Index {
            index: idx,
            len: self.len(),
        })
    }

    pub fn get(&self, idx: usize) -> Result<VqaSample> {
        self.get_with_rng(idx, &mut rand::rng())
    }

    /// Like [`get`](Self::get), drawing the answer label from `rng`.
    pub fn get_with_rng<R: Rng + ?Sized>(&self, idx: usize, rng: &mut R) -> Result<VqaSample> {
        let record = self.record(idx)?;

        let question = self.tokenizer.encode(&record.question_str)?;

        let image = load_rgb(&record.image_path).map_err(|source| VqaError::ImageLoad {
            path: record.image_path.clone(),
            source,
        })?;

        let (answer_label, answer_multi_choice) = if self.load_ans {
            let (label, multi_choice) = self.answers(idx, record, rng)?;
            (Some(label), Some(multi_choice))
        } else {
            (None, None)
        };

        let image = match &self.transform {
            Some(transform) => SampleImage::Tensor(transform.transform(image)?),
            None => SampleImage::Rgb(image),
        };

        Ok(VqaSample {
            image,
            question,
            qst_id: record.question_id.clone(),
            answer_label,
            answer_multi_choice,
        })
    }

    fn answers<R: Rng + ?Sized>(
        &self,
        idx: usize,
        record: &VqaRecord,
        rng: &mut R,
    ) -> Result<(i64, Vec<i64>)> {
        let ans2idc = record
            .valid_answers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|w| self.ans_vocab.word2idx(w).map(|i| i as i64))
            .collect::<Result<Vec<i64>>>()?;

        let ans2idx = *ans2idc
            .choose(rng)
            .ok_or(VqaError::MissingAnswers { index: idx })?;

        let mut mul2idc = vec![NO_ANSWER; self.max_num_ans];
        let n = ans2idc.len().min(self.max_num_ans);
        mul2idc[..n].copy_from_slice(&ans2idc[..n]);

        Ok((ans2idx, mul2idc))
    }
}

/// Format is detected from the file contents, not the extension.
fn load_rgb(path: &Path) -> image::ImageResult<RgbImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.to_rgb8())
}

impl Deref for VqaDataset {
    type Target = VqaDataset_;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
