use std::sync::Arc;

use rand::{SeedableRng, rng, rngs::StdRng, seq::SliceRandom};
use rayon::{ThreadPool, prelude::*};

use crate::{
    Result,
    vqa_dataset::{VqaDataset, VqaSample},
};

/// One pass over a dataset, in order or shuffled.
///
/// With a seed, both the order and every sample's answer draw are fixed, no
/// matter whether samples are fetched one at a time or on a worker pool.
pub struct VqaDatasetIter {
    dataset: VqaDataset,
    remaining_indices: Vec<usize>,
    seed: Option<u64>,
    drawn: u64,
    pool: Option<Arc<ThreadPool>>,
}

impl VqaDatasetIter {
    pub fn new(dataset: VqaDataset, shuffle: bool) -> Self {
        Self::with_options(dataset, shuffle, None, None)
    }

    pub fn with_options(
        dataset: VqaDataset,
        shuffle: bool,
        seed: Option<u64>,
        pool: Option<Arc<ThreadPool>>,
    ) -> Self {
        let mut remaining_indices = (0..dataset.len()).rev().collect::<Vec<_>>();
        if shuffle {
            match seed {
                Some(seed) => remaining_indices.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => remaining_indices.shuffle(&mut rng()),
            }
        }
        Self {
            dataset,
            remaining_indices,
            seed,
            drawn: 0,
            pool,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining_indices.len()
    }

    pub fn dataset(&self) -> &VqaDataset {
        &self.dataset
    }

    /// Fetches up to `n` samples in iteration order. Fewer are returned only
    /// at the end of the pass.
    pub fn next_chunk(&mut self, n: usize) -> Vec<Result<VqaSample>> {
        let take = n.min(self.remaining_indices.len());
        let mut chunk = self
            .remaining_indices
            .split_off(self.remaining_indices.len() - take);
        chunk.reverse();

        let jobs: Vec<(usize, Option<u64>)> = chunk
            .into_iter()
            .map(|idx| {
                self.drawn += 1;
                let drawn = self.drawn;
                (idx, self.seed.map(|s| s.wrapping_add(drawn)))
            })
            .collect();

        let dataset = &self.dataset;
        match &self.pool {
            Some(pool) => pool.install(|| {
                jobs.par_iter()
                    .map(|&(idx, seed)| fetch(dataset, idx, seed))
                    .collect::<Vec<_>>()
            }),
            None => jobs
                .iter()
                .map(|&(idx, seed)| fetch(dataset, idx, seed))
                .collect(),
        }
    }
}

fn fetch(dataset: &VqaDataset, idx: usize, seed: Option<u64>) -> Result<VqaSample> {
    match seed {
        Some(seed) => dataset.get_with_rng(idx, &mut StdRng::seed_from_u64(seed)),
        None => dataset.get(idx),
    }
}

impl Iterator for VqaDatasetIter {
    type Item = Result<VqaSample>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk(1).pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}
