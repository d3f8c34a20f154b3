use candle_core::{Device, Tensor};
use image::RgbImage;

use crate::{
    Result, VqaError,
    image_transform::SampleImage,
    vqa_dataset::VqaSample,
    vqa_dataset_iter::VqaDatasetIter,
    vqa_record::QuestionId,
};

#[derive(Debug, Clone)]
pub enum BatchImages {
    /// `(B, 3, H, W)`
    Tensor(Tensor),
    Rgb(Vec<RgbImage>),
}

#[derive(Debug, Clone)]
pub struct VqaBatch {
    pub images: BatchImages,
    /// `(B, max_qst_length)` u32
    pub questions: Tensor,
    pub qst_ids: Vec<QuestionId>,
    /// `(B,)` i64
    pub answer_labels: Option<Tensor>,
    /// `(B, max_num_ans)` i64
    pub answer_multi_choice: Option<Tensor>,
}

impl VqaBatch {
    pub fn len(&self) -> usize {
        self.qst_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qst_ids.is_empty()
    }
}

/// Stacks samples field by field. All samples must come from the same dataset.
pub fn collate(samples: Vec<VqaSample>, device: &Device) -> Result<VqaBatch> {
    let batch_size = samples.len();
    let Some(first) = samples.first() else {
        return Err(VqaError::Config("cannot collate an empty batch".to_string()));
    };
    let qst_len = first.question.len();
    let load_ans = first.answer_label.is_some();
    let num_ans = first.answer_multi_choice.as_ref().map_or(0, Vec::len);

    let mut tensors = Vec::with_capacity(batch_size);
    let mut rgb = Vec::with_capacity(batch_size);
    let mut questions = Vec::with_capacity(batch_size * qst_len);
    let mut qst_ids = Vec::with_capacity(batch_size);
    let mut labels = Vec::with_capacity(batch_size);
    let mut multi_choice = Vec::with_capacity(batch_size * num_ans);

    for sample in samples {
        match sample.image {
            SampleImage::Tensor(t) => tensors.push(t),
            SampleImage::Rgb(im) => rgb.push(im),
        }
        questions.extend(sample.question);
        qst_ids.push(sample.qst_id);
        if let (Some(label), Some(choices)) = (sample.answer_label, sample.answer_multi_choice) {
            labels.push(label);
            multi_choice.extend(choices);
        }
    }

    let images = match (tensors.is_empty(), rgb.is_empty()) {
        (false, true) => BatchImages::Tensor(Tensor::stack(&tensors, 0)?.to_device(device)?),
        (true, false) => BatchImages::Rgb(rgb),
        _ => {
            return Err(VqaError::Config(
                "batch mixes transformed and raw images".to_string(),
            ));
        }
    };

    let questions = Tensor::from_vec(questions, (batch_size, qst_len), device)?;
    let (answer_labels, answer_multi_choice) = if load_ans {
        (
            Some(Tensor::from_vec(labels, batch_size, device)?),
            Some(Tensor::from_vec(multi_choice, (batch_size, num_ans), device)?),
        )
    } else {
        (None, None)
    };

    Ok(VqaBatch {
        images,
        questions,
        qst_ids,
        answer_labels,
        answer_multi_choice,
    })
}

/// Groups a [`VqaDatasetIter`] into [`VqaBatch`]es. A sample that fails to
/// load fails its whole batch.
pub struct VqaDataBatcher {
    inner: VqaDatasetIter,
    batch_size: usize,
    return_last_incomplete_batch: bool,
    device: Device,
}

impl VqaDataBatcher {
    pub fn new(inner: VqaDatasetIter, device: Device) -> Self {
        Self {
            inner,
            batch_size: 16,
            return_last_incomplete_batch: false,
            device,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn return_last_incomplete_batch(mut self, r: bool) -> Self {
        self.return_last_incomplete_batch = r;
        self
    }
}

impl Iterator for VqaDataBatcher {
    type Item = Result<VqaBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.inner.remaining() == 0
            || (self.inner.remaining() < self.batch_size && !self.return_last_incomplete_batch)
        {
            return None;
        }

        let samples = self.inner.next_chunk(self.batch_size);
        let batch = samples
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .and_then(|samples| collate(samples, &self.device));
        if let Ok(batch) = &batch {
            log::debug!(
                "batch of {} samples, {} remaining",
                batch.len(),
                self.inner.remaining()
            );
        }
        Some(batch)
    }
}
