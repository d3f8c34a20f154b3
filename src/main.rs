use std::path::PathBuf;

use anyhow::Result;
use candle_core::Device;
use clap::Parser;

use vqa_loader::{
    BatchImages, DataLoader, LoaderConfig, Phase, get_loader, question_tokenizer::Decoder,
};

/// Iterate one split of a VQA dataset and report what the loader produces.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON loader configuration
    #[arg(short, long)]
    config: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Phase::Train)]
    phase: Phase,

    /// Stop after this many batches
    #[arg(long)]
    max_batches: Option<usize>,

    /// Keep tensors on the CPU even when CUDA is available
    #[arg(long)]
    cpu: bool,

    /// -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let dev = if cli.cpu {
        Device::Cpu
    } else {
        Device::cuda_if_available(0)?
    };

    let config = LoaderConfig::from_json_file(&cli.config)?;
    let loaders = get_loader(&config, &dev)?;
    let loader = loaders.phase(cli.phase);
    let dataset = loader.dataset();

    println!(
        "{}: {} samples, {} batches, question vocab {}, answer vocab {}",
        cli.phase,
        dataset.len(),
        loader.num_batches(),
        dataset.qst_vocab().vocab_size(),
        dataset.ans_vocab().vocab_size()
    );

    let (mut num_batches, mut num_samples) = (0_usize, 0_usize);
    for batch in loader.batcher() {
        let batch = batch?;
        if num_batches == 0 {
            print_first_sample(&batch, dataset)?;
        }
        num_batches += 1;
        num_samples += batch.len();
        if cli.max_batches.is_some_and(|n| num_batches >= n) {
            break;
        }
    }

    println!("Loaded {} samples in {} batches", num_samples, num_batches);
    Ok(())
}

fn print_first_sample(
    batch: &vqa_loader::VqaBatch,
    dataset: &vqa_loader::VqaDataset,
) -> Result<()> {
    match &batch.images {
        BatchImages::Tensor(t) => println!("images: {:?}", t.dims()),
        BatchImages::Rgb(images) => println!("images: {} raw", images.len()),
    }
    println!("questions: {:?}", batch.questions.dims());

    let question = batch.questions.get(0)?.to_vec1::<u32>()?;
    println!(
        "first question {}: {:?}",
        batch.qst_ids[0],
        dataset.tokenizer().decode(&question)?
    );
    if let Some(labels) = &batch.answer_labels {
        let label = labels.get(0)?.to_scalar::<i64>()?;
        println!(
            "first answer label: {} ({})",
            label,
            dataset.ans_vocab().idx2word(label as usize).unwrap_or("?")
        );
    }
    Ok(())
}
