use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use ferrous_control::classifier::{Classification, ControlFilter};
use ferrous_control::defaults;
use ferrous_control::filter_opt::{ControlSpec, FilterOpt};
use ferrous_control::io::fasta_reader::load_control_sequence;
use ferrous_control::io::fastq_reader::FastqReader;
use ferrous_control::ksw::ReportDepth;
use ferrous_control::pipeline::filter_reads;
use ferrous_control::reference::build_named_reference;

#[derive(Parser)]
#[command(name = "ferrous-control")]
#[command(about = "FerrousControl - flag reads originating from a spike-in control sequence", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a FASTQ file into control and non-control reads
    Filter {
        #[command(flatten)]
        control: ControlArgs,

        /// Input FASTQ file ("-" for stdin)
        #[arg(value_name = "READS.FQ")]
        reads: PathBuf,

        /// Output FASTQ for non-control reads (default: stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output FASTQ for control reads (dropped if absent)
        #[arg(long, value_name = "FILE")]
        control_out: Option<PathBuf>,

        /// Number of reads classified per batch
        #[arg(short = 'K', long, value_name = "INT", default_value_t = defaults::BATCH_SIZE)]
        batch_size: usize,

        /// Number of threads (default: all available cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,
    },

    /// Classify sequences given on the command line and print one TSV line each
    Classify {
        #[command(flatten)]
        control: ControlArgs,

        /// Read sequences
        #[arg(value_name = "SEQUENCE", required = true)]
        sequences: Vec<String>,
    },
}

#[derive(Args)]
struct ControlArgs {
    /// FASTA file holding the control sequence
    #[arg(short = 'c', long = "control", value_name = "REF.FA")]
    reference: PathBuf,

    /// Control name, 1-based first cycle and window length
    #[arg(long, value_name = "NAME,CYCLE,LEN", default_value = defaults::CONTROL_SPEC)]
    filter_control: String,

    // ===== Scoring Options =====
    /// Score for a sequence match
    #[arg(short = 'A', long, value_name = "INT", default_value_t = defaults::MATCH_SCORE)]
    match_score: i32,

    /// Penalty for a mismatch
    #[arg(short = 'B', long, value_name = "INT", default_value_t = defaults::MISMATCH_PENALTY)]
    mismatch_penalty: i32,

    /// Gap open penalty; a gap of size k costs '{-O} + {-E}*(k-1)'
    #[arg(short = 'O', long, value_name = "INT", default_value_t = defaults::GAP_OPEN_PENALTY)]
    gap_open: i32,

    /// Gap extension penalty
    #[arg(short = 'E', long, value_name = "INT", default_value_t = defaults::GAP_EXTEND_PENALTY)]
    gap_extend: i32,

    // ===== Decision Options =====
    /// Minimum alignment score to call a read control
    #[arg(short = 'T', long, value_name = "INT", default_value_t = defaults::MIN_CONTROL_SCORE)]
    min_score: i32,

    /// Mask length around the best hit when looking for a secondary hit
    #[arg(long, value_name = "INT", default_value_t = defaults::MASK_LEN)]
    mask_len: usize,

    /// First position of the control reference to search
    #[arg(long, value_name = "INT", default_value_t = defaults::REF_START)]
    ref_start: usize,

    /// Also recover alignment start positions
    #[arg(long)]
    with_start: bool,

    /// Verbose level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
    verbosity: i32,
}

impl ControlArgs {
    fn filter_opt(&self) -> FilterOpt {
        FilterOpt {
            a: self.match_score,
            b: self.mismatch_penalty,
            o: self.gap_open,
            e: self.gap_extend,
            min_score: self.min_score,
            mask_len: self.mask_len,
            ref_start: self.ref_start,
            report: if self.with_start {
                ReportDepth::WithStart
            } else {
                ReportDepth::Basic
            },
            verbosity: self.verbosity,
            ..FilterOpt::default()
        }
    }
}

fn init_logger(verbosity: i32) {
    // 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

fn configure_threads(threads: Option<usize>) -> usize {
    let mut num_threads = threads.unwrap_or_else(num_cpus::get);
    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(_) => log::debug!("Built global Rayon thread pool with {} threads", num_threads),
        Err(e) => log::warn!(
            "Failed to configure thread pool: {} (may already be initialized)",
            e
        ),
    }

    num_threads
}

/// Load the control, build the reference and matrix, and return the filter
/// together with the parsed control spec.
fn build_filter(args: &ControlArgs, opt: &FilterOpt) -> Result<(ControlFilter, ControlSpec)> {
    let spec: ControlSpec = args
        .filter_control
        .parse()
        .with_context(|| format!("invalid --filter-control '{}'", args.filter_control))?;

    opt.validate().context("invalid scoring options")?;
    opt.check_window(&spec.window);

    let (id, raw) = load_control_sequence(&args.reference, &spec.name)
        .with_context(|| format!("loading control from {}", args.reference.display()))?;
    let reference = build_named_reference(&id, &raw)
        .with_context(|| format!("building control reference '{}'", id))?;

    log::info!(
        "Control '{}': {} bp, searching cycles {}-{} (min score {})",
        id,
        reference.strand_len(),
        spec.window.start + 1,
        spec.window.start + spec.window.length,
        opt.min_score
    );

    let filter = ControlFilter::new(reference, opt.score_matrix()?, opt.classifier_params());
    Ok((filter, spec))
}

fn run_filter(
    control: ControlArgs,
    reads: PathBuf,
    output: Option<PathBuf>,
    control_out: Option<PathBuf>,
    batch_size: usize,
    threads: Option<usize>,
) -> Result<()> {
    let mut opt = control.filter_opt();
    opt.batch_size = batch_size;
    opt.n_threads = configure_threads(threads);

    let (filter, spec) = build_filter(&control, &opt)?;

    let mut reader = FastqReader::new(&reads)
        .with_context(|| format!("opening reads {}", reads.display()))?;

    let mut pass_out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut control_file = match &control_out {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let stats = filter_reads(
        &filter,
        spec.window,
        &mut reader,
        &mut pass_out,
        control_file.as_mut().map(|w| w as &mut dyn Write),
        &opt,
    )
    .with_context(|| format!("filtering {}", reads.display()))?;

    if stats.skipped > 0 {
        log::warn!(
            "{} reads could not be classified and were kept in the pass output",
            stats.skipped
        );
    }
    Ok(())
}

fn format_classification(seq: &str, c: &Classification) -> String {
    let score = c.score.map_or("-".to_string(), |s| s.to_string());
    let strand = c.strand.map_or('-', |s| s.as_char());
    let ref_end = c.ref_end.map_or("-".to_string(), |e| e.to_string());
    let decision = if c.is_control { "control" } else { "pass" };
    format!("{}\t{}\t{}\t{}\t{}", seq, decision, score, strand, ref_end)
}

fn run_classify(control: ControlArgs, sequences: Vec<String>) -> Result<()> {
    let opt = control.filter_opt();
    let (filter, spec) = build_filter(&control, &opt)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for seq in &sequences {
        match filter.classify(seq.as_bytes(), spec.window) {
            Ok(c) => writeln!(out, "{}", format_classification(seq, &c))?,
            Err(e) => {
                log::warn!("{}: {}", seq, e);
                writeln!(out, "{}\tskipped\t-\t-\t-", seq)?;
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Filter {
            control,
            reads,
            output,
            control_out,
            batch_size,
            threads,
        } => {
            init_logger(control.verbosity);
            run_filter(control, reads, output, control_out, batch_size, threads)
        }
        Commands::Classify { control, sequences } => {
            init_logger(control.verbosity);
            run_classify(control, sequences)
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
