use std::{
    fmt,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use candle_core::Device;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    Result, VqaError,
    config::LoaderConfig,
    data_loader::DataLoader,
    image_transform::{ImageTransform, ToTensorNormalize},
    vqa_data_batcher::VqaDataBatcher,
    vqa_dataset::VqaDataset,
    vqa_dataset_iter::VqaDatasetIter,
};

const EPOCH_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct VqaDataLoader {
    dataset: VqaDataset,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    seed: Option<u64>,
    device: Device,
    pool: Option<Arc<ThreadPool>>,
    epoch: AtomicU64,
}

impl VqaDataLoader {
    pub fn new(dataset: VqaDataset, batch_size: usize, shuffle: bool, drop_last: bool) -> Self {
        Self {
            dataset,
            batch_size: batch_size.max(1),
            shuffle,
            drop_last,
            seed: None,
            device: Device::Cpu,
            pool: None,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Materializes each batch on `num_workers` threads. `0` and `1` keep
    /// loading on the calling thread.
    pub fn with_num_workers(mut self, num_workers: usize) -> Result<Self> {
        self.pool = if num_workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(num_workers)
                .thread_name(|i| format!("vqa-loader-{}", i))
                .build()
                .map_err(|e| VqaError::Config(format!("failed to start workers: {}", e)))?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(self)
    }

    pub fn dataset(&self) -> &VqaDataset {
        &self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_batches(&self) -> usize {
        if self.drop_last {
            self.dataset.len() / self.batch_size
        } else {
            self.dataset.len().div_ceil(self.batch_size)
        }
    }
}

impl DataLoader for VqaDataLoader {
    type Batcher = VqaDataBatcher;

    fn batcher(&self) -> VqaDataBatcher {
        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed);
        let seed = self
            .seed
            .map(|s| s ^ epoch.wrapping_mul(EPOCH_SEED_STRIDE));
        let iter = VqaDatasetIter::with_options(
            self.dataset.clone(),
            self.shuffle,
            seed,
            self.pool.clone(),
        );
        VqaDataBatcher::new(iter, self.device.clone())
            .batch_size(self.batch_size)
            .return_last_incomplete_batch(!self.drop_last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Phase {
    Train,
    Valid,
    Test,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Train => "train",
            Phase::Valid => "valid",
            Phase::Test => "test",
        })
    }
}

pub struct VqaLoaders {
    pub train: VqaDataLoader,
    pub valid: VqaDataLoader,
    pub test: VqaDataLoader,
}

impl VqaLoaders {
    pub fn phase(&self, phase: Phase) -> &VqaDataLoader {
        match phase {
            Phase::Train => &self.train,
            Phase::Valid => &self.valid,
            Phase::Test => &self.test,
        }
    }
}

/// Builds train, valid and test loaders over one input directory. Train has
/// its own normalization; valid and test share one.
pub fn get_loader(config: &LoaderConfig, device: &Device) -> Result<VqaLoaders> {
    config.validate()?;

    let train_transform: Arc<dyn ImageTransform> = Arc::new(ToTensorNormalize::default());
    let valid_transform: Arc<dyn ImageTransform> = Arc::new(ToTensorNormalize::default());

    let build = |phase: Phase, input_vqa: &Path, transform: &Arc<dyn ImageTransform>| {
        log::info!("Building {} loader from {:?}", phase, input_vqa);
        let dataset = VqaDataset::new(
            config.input_dir.as_path(),
            input_vqa,
            &config.dataset,
            Some(Arc::clone(transform)),
        )?;
        VqaDataLoader::new(dataset, config.batch_size, config.shuffle, config.drop_last)
            .with_seed(config.seed)
            .with_device(device.clone())
            .with_num_workers(config.num_workers)
    };

    Ok(VqaLoaders {
        train: build(Phase::Train, &config.input_vqa_train, &train_transform)?,
        valid: build(Phase::Valid, &config.input_vqa_valid, &valid_transform)?,
        test: build(Phase::Test, &config.input_vqa_test, &valid_transform)?,
    })
}
