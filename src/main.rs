//! CLI entry point for tokenbatch.
//!
//! Demonstration driver around the library: inspect how a text file
//! tokenizes, and print the first batches a loader would feed a training
//! loop. Not part of the library contract.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use tokenbatch::config::{LoaderConfig, WindowConfig};
use tokenbatch::data::{load_text, DataLoader, Gpt2Tokenizer, HfTokenizer, TextTokenizer};
use tokenbatch::error::DataResult;

/// `gpt2` for the stock encoding, otherwise a path to a tokenizer.json.
fn resolve_tokenizer(spec: &str) -> DataResult<Box<dyn TextTokenizer>> {
    match spec {
        "gpt2" => Ok(Box::new(Gpt2Tokenizer::new()?)),
        "gpt2-no-special" => Ok(Box::new(Gpt2Tokenizer::without_special_tokens()?)),
        path => Ok(Box::new(HfTokenizer::from_file(Path::new(path))?)),
    }
}

fn load_loader_config(path: Option<&Path>, cli: LoaderConfig) -> anyhow::Result<LoaderConfig> {
    let config = match path {
        Some(p) => {
            let json = std::fs::read_to_string(p)?;
            serde_json::from_str(&json)?
        }
        None => cli,
    };
    config.validate()?;
    Ok(config)
}

#[derive(Parser)]
#[command(
    name = "tokenbatch",
    about = "Sliding-window token batches for next-token-prediction training"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a text file and report counts
    Stats {
        /// Path to input text file
        #[arg(long)]
        text: PathBuf,

        /// Tokenizer: gpt2, gpt2-no-special, or path to tokenizer.json
        #[arg(long, default_value = "gpt2")]
        tokenizer: String,
    },

    /// Print the first batches of a windowed pass over a text file
    Preview {
        /// Path to input text file
        #[arg(long)]
        text: PathBuf,

        /// Tokenizer: gpt2, gpt2-no-special, or path to tokenizer.json
        #[arg(long, default_value = "gpt2")]
        tokenizer: String,

        /// Tokens per window
        #[arg(long, default_value = "4")]
        max_length: usize,

        /// Offset between consecutive window starts
        #[arg(long, default_value = "1")]
        stride: usize,

        /// Windows per batch
        #[arg(long, default_value = "1")]
        batch_size: usize,

        /// Permute window order
        #[arg(long, default_value = "false")]
        shuffle: bool,

        /// Keep a final short batch instead of dropping it
        #[arg(long, default_value = "false")]
        keep_last: bool,

        /// Worker threads for batch assembly (0 = synchronous)
        #[arg(long, default_value = "0")]
        num_workers: usize,

        /// Shuffle seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of batches to print
        #[arg(long, default_value = "2")]
        n_batches: usize,

        /// Also print each input row decoded back to text
        #[arg(long, default_value = "false")]
        decode: bool,

        /// Load LoaderConfig from a JSON file instead of the flags above
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn print_batch(
    step: usize,
    inputs: &candle_core::Tensor,
    targets: &candle_core::Tensor,
    decode_with: Option<&dyn TextTokenizer>,
) -> anyhow::Result<()> {
    println!("--- Batch {} ---", step);
    println!("Inputs  {:?}:", inputs.dims());
    for row in inputs.to_vec2::<u32>()? {
        println!("  {:?}", row);
        if let Some(tok) = decode_with {
            println!("    {:?}", tok.decode(&row)?);
        }
    }
    println!("Targets {:?}:", targets.dims());
    for row in targets.to_vec2::<u32>()? {
        println!("  {:?}", row);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tokenbatch::logging::init_console_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { text, tokenizer } => {
            let raw_text = load_text(&text)?;
            let tok = resolve_tokenizer(&tokenizer)?;
            let ids = tok.encode(&raw_text)?;

            println!("File:             {}", text.display());
            println!("Total characters: {}", raw_text.chars().count());
            println!("Total tokens:     {}", ids.len());
            println!("Vocab size:       {}", tok.vocab_size());
            println!(
                "First 10 tokens:  {:?}",
                &ids[..ids.len().min(10)]
            );
        }

        Commands::Preview {
            text,
            tokenizer,
            max_length,
            stride,
            batch_size,
            shuffle,
            keep_last,
            num_workers,
            seed,
            n_batches,
            decode,
            config,
        } => {
            let cli_config = LoaderConfig {
                batch_size,
                shuffle,
                drop_last: !keep_last,
                num_workers,
                ..LoaderConfig::default()
            };
            let loader_config = load_loader_config(config.as_deref(), cli_config)?;
            let window = WindowConfig::new(max_length, stride);
            window.validate()?;

            let raw_text = load_text(&text)?;
            let tok = resolve_tokenizer(&tokenizer)?;
            let loader = DataLoader::from_text(
                &raw_text,
                tok.as_ref(),
                &window,
                loader_config,
                seed,
                &candle_core::Device::Cpu,
            )?;

            tracing::info!(
                n_windows = loader.dataset().len(),
                n_batches = loader.n_batches(),
                num_workers = loader_config.num_workers,
                "Previewing first {} batches",
                n_batches.min(loader.n_batches())
            );

            let decode_with = decode.then_some(tok.as_ref());
            if loader_config.num_workers > 0 {
                for (step, batch) in loader.prefetch_iter(0).take(n_batches).enumerate() {
                    let (inputs, targets) = batch?;
                    print_batch(step, &inputs, &targets, decode_with)?;
                }
            } else {
                for (step, batch) in loader.iter(0).take(n_batches).enumerate() {
                    let (inputs, targets) = batch?;
                    print_batch(step, &inputs, &targets, decode_with)?;
                }
            }
        }
    }

    Ok(())
}
