//! blockstore CLI
//!
//! Command-line interface for storing and reading records in a block file.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use blockstore::{BlockId, BlockStore, ByteOrder, Config};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// blockstore CLI
#[derive(Parser, Debug)]
#[command(name = "blockstore-cli")]
#[command(about = "Fixed-block record storage")]
#[command(version)]
struct Args {
    /// Backing block file
    #[arg(short, long, default_value = "./blockstore.dat")]
    file: PathBuf,

    /// Block size in bytes (must divide the page size)
    #[arg(short, long, default_value = "512")]
    block_size: usize,

    /// Encode block headers little-endian instead of big-endian
    #[arg(long)]
    little_endian: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a file's contents and print its id
    Put {
        /// Input file, or "-" for stdin
        input: String,
    },

    /// Print a record
    Get {
        /// The record id
        id: BlockId,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a record and reclaim its blocks
    Rm {
        /// The record id
        id: BlockId,
    },

    /// Show file geometry and usage
    Stat,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blockstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> blockstore::Result<()> {
    let byte_order = if args.little_endian {
        ByteOrder::Little
    } else {
        ByteOrder::Big
    };

    let config = Config::builder()
        .path(&args.file)
        .block_size(args.block_size)
        .byte_order(byte_order)
        .build();

    let store = BlockStore::open(config)?;

    match args.command {
        Commands::Put { input } => {
            let data = if input == "-" {
                let mut buf = Vec::new();
                io::stdin().read_to_end(&mut buf)?;
                buf
            } else {
                fs::read(&input)?
            };

            let id = store.persist(&data)?;
            tracing::info!("Stored {} bytes", data.len());
            println!("{}", id);
        }
        Commands::Get { id, output } => {
            let data = store.retrieve(id)?;
            match output {
                Some(path) => fs::write(path, &data)?,
                None => io::stdout().write_all(&data)?,
            }
        }
        Commands::Rm { id } => {
            let blocks = store.remove(id)?;
            tracing::info!("Removed record {} ({} blocks reclaimed)", id, blocks);
        }
        Commands::Stat => {
            let layout = store.layout();
            println!("file:        {}", store.config().path.display());
            println!("block size:  {}", layout.block_size);
            println!("data size:   {}", layout.data_size);
            println!("blocks:      {}", store.block_count()?);
            println!("free blocks: {}", store.free_count());
            println!("file length: {}", store.file_len()?);
        }
    }

    store.close()
}
