use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

use coldbuf_codecs::{new_buffer, CODEC_NAMES};
use coldbuf_core::{BufferConfig, BufferStats, CompressedBuffer, TextEncoding};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "coldbuf",
    about = "Load data into a block-compressed buffer and inspect, dump, or benchmark it",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Buffer settings shared by every subcommand.
#[derive(Args)]
struct BufferArgs {
    /// Logical size of each block, in KB
    #[arg(short, long, default_value_t = 4)]
    alloc_size_kb: usize,
    /// Maximum uncompressed bytes held at once, in KB
    #[arg(long, default_value_t = 64)]
    cache_kb: usize,
    /// Block codec
    #[arg(
        short,
        long,
        default_value = "zlib",
        ignore_case = true,
        value_parser = PossibleValuesParser::new(CODEC_NAMES.iter().copied())
    )]
    codec: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file into a buffer and print its memory accounting
    Stats {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        #[command(flatten)]
        buffer: BufferArgs,
        /// Compress every block before reporting
        #[arg(long)]
        compress_all: bool,
        /// Check that the buffer reads back byte-exact (xxh3-64)
        #[arg(long)]
        verify: bool,
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Hex dump a byte range of the loaded buffer
    Dump {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        #[command(flatten)]
        buffer: BufferArgs,
        /// First logical offset to dump
        #[arg(short, long, default_value_t = 0)]
        start: usize,
        /// Number of bytes to dump
        #[arg(short, long, default_value_t = 256)]
        len: usize,
    },
    /// Print the loaded buffer as text
    Encode {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        #[command(flatten)]
        buffer: BufferArgs,
        /// utf8 | hex | base64 | latin1 | ascii | utf16le
        #[arg(short, long, default_value = "base64")]
        encoding: String,
    },
    /// Benchmark random 32-bit reads across the loaded buffer
    Bench {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        #[command(flatten)]
        buffer: BufferArgs,
        /// Number of random reads
        #[arg(short = 'n', long, default_value_t = 100_000)]
        count: u64,
        /// Fixed random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

impl BufferArgs {
    fn config(&self) -> BufferConfig {
        BufferConfig::builder()
            .alloc_size_kb(self.alloc_size_kb)
            .cache_budget_kb(self.cache_kb)
            .codec(self.codec.as_str())
            .build()
    }
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

/// Stream `input` into a fresh buffer one block at a time.
///
/// Returns the buffer and the xxh3-64 of everything read.
fn load_buffer(input: &Path, args: &BufferArgs) -> anyhow::Result<(CompressedBuffer, u64)> {
    let config = args.config();
    let mut buffer = new_buffer(&config).context("creating buffer")?;

    let mut src: Box<dyn Read> = if input.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(input).with_context(|| format!("opening input file {:?}", input))?,
        ))
    };

    let t0 = Instant::now();
    let mut hasher = Xxh3::new();
    let mut chunk = vec![0u8; config.alloc_size];
    let mut offset = 0usize;
    loop {
        let n = src.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
        buffer.write_range(&chunk[..n], offset)?;
        offset += n;
    }

    info!(
        bytes = offset,
        blocks = buffer.block_count(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "loaded input"
    );
    Ok((buffer, hasher.digest()))
}

fn print_stats(stats: &BufferStats) {
    let ratio = if stats.total_physical == 0 {
        1.0
    } else {
        stats.length as f64 / stats.total_physical as f64
    };
    println!("  codec          : {}", stats.codec);
    println!("  block size     : {}", human_bytes(stats.alloc_size as u64));
    println!("  cache budget   : {}", human_bytes(stats.cache_budget as u64));
    println!(
        "  blocks         : {} ({} compressed)",
        stats.block_count, stats.compressed_blocks
    );
    println!("  length         : {}", human_bytes(stats.length as u64));
    println!("  capacity       : {}", human_bytes(stats.capacity as u64));
    println!("  uncompressed   : {}", human_bytes(stats.uncompressed_total as u64));
    println!("  compressed     : {}", human_bytes(stats.compressed_total as u64));
    println!("  total physical : {}", human_bytes(stats.total_physical as u64));
    println!("  ratio          : {:.2}x", ratio);
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_stats(
    input: PathBuf,
    args: BufferArgs,
    compress_all: bool,
    verify: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (mut buffer, input_hash) = load_buffer(&input, &args)?;

    if verify {
        let t0 = Instant::now();
        let readback = xxh3_64(&buffer.to_bytes()?);
        if readback != input_hash {
            anyhow::bail!(
                "read-back mismatch: input {:016x}, buffer {:016x}",
                input_hash,
                readback
            );
        }
        eprintln!(
            "  verified {:016x} in {:.3}s",
            readback,
            t0.elapsed().as_secs_f64()
        );
    }

    if compress_all {
        buffer.compress_all()?;
    }

    let stats = buffer.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("=== coldbuf: {:?} ===", input);
        println!();
        print_stats(&stats);
    }
    Ok(())
}

fn run_dump(input: PathBuf, args: BufferArgs, start: usize, len: usize) -> anyhow::Result<()> {
    let (mut buffer, _) = load_buffer(&input, &args)?;
    let end = (start + len).min(buffer.len());
    let bytes = buffer.sub_range(start, Some(end))?.into_owned();

    println!("--- bytes {}..{} of {} ---", start, end.max(start), buffer.len());
    for (i, chunk) in bytes.chunks(16).enumerate() {
        print!("  {:08x}  ", start + i * 16);
        for b in chunk {
            print!("{:02x} ", b);
        }
        // padding
        for _ in chunk.len()..16 {
            print!("   ");
        }
        print!("  |");
        for b in chunk {
            if b.is_ascii_graphic() || *b == b' ' {
                print!("{}", *b as char);
            } else {
                print!(".");
            }
        }
        println!("|");
    }
    Ok(())
}

fn run_encode(input: PathBuf, args: BufferArgs, encoding: &str) -> anyhow::Result<()> {
    let encoding: TextEncoding = encoding.parse()?;
    let (mut buffer, _) = load_buffer(&input, &args)?;
    println!("{}", buffer.to_text(encoding)?);
    Ok(())
}

fn run_bench(input: PathBuf, args: BufferArgs, count: u64, seed: u64) -> anyhow::Result<()> {
    let (mut buffer, _) = load_buffer(&input, &args)?;
    let length = buffer.len();
    if length < 4 {
        anyhow::bail!("input too small to benchmark ({} bytes)", length);
    }

    // Simple LCG for reproducible random offsets (no external dep)
    let offsets: Vec<usize> = {
        let mut rng = seed;
        (0..count)
            .map(|_| {
                rng = rng
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((rng >> 33) % (length as u64 - 3)) as usize
            })
            .collect()
    };

    eprintln!(
        "benchmarking {} random u32 reads across {}...",
        count,
        human_bytes(length as u64)
    );

    let t0 = Instant::now();
    let mut checksum = 0u64;
    let mut latencies_ns: Vec<u64> = Vec::with_capacity(count as usize);

    for &offset in &offsets {
        let t = Instant::now();
        let value = buffer.read_u32(offset)?;
        latencies_ns.push(t.elapsed().as_nanos() as u64);
        checksum = checksum.wrapping_add(value as u64);
    }

    let elapsed = t0.elapsed();
    latencies_ns.sort_unstable();

    let Some(&max) = latencies_ns.last() else {
        anyhow::bail!("no reads performed (count = 0)");
    };
    let p50 = latencies_ns[latencies_ns.len() / 2];
    let p95 = latencies_ns[(latencies_ns.len() as f64 * 0.95) as usize];
    let p99 = latencies_ns[(latencies_ns.len() as f64 * 0.99) as usize];
    let min = latencies_ns[0];

    println!();
    println!("=== Random Read Benchmark ===");
    println!("  reads       : {}", count);
    println!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    println!(
        "  reads/s     : {:.0}",
        count as f64 / elapsed.as_secs_f64()
    );
    println!("  checksum    : {:016x}", checksum);
    println!("  latency:");
    println!("    min  : {} ns", min);
    println!("    p50  : {} ns", p50);
    println!("    p95  : {} ns", p95);
    println!("    p99  : {} ns", p99);
    println!("    max  : {} ns", max);
    println!();
    print_stats(&buffer.stats());

    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Stats {
            input,
            buffer,
            compress_all,
            verify,
            json,
        } => run_stats(input, buffer, compress_all, verify, json),
        Commands::Dump {
            input,
            buffer,
            start,
            len,
        } => run_dump(input, buffer, start, len),
        Commands::Encode {
            input,
            buffer,
            encoding,
        } => run_encode(input, buffer, &encoding),
        Commands::Bench {
            input,
            buffer,
            count,
            seed,
        } => run_bench(input, buffer, count, seed),
    }
}
