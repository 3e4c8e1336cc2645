use crate::common::*;
use crate::sampling_driver::*;
use anyhow::Context;
use sblock::io::{read_labels_file, read_model, write_model};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Edge model CLI enum
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
#[clap(rename_all = "lowercase")]
pub enum ModelTypeCli {
    /// Bernoulli edges, one density per block pair
    Uncorrected,
    /// Poisson edges scaled by node degrees
    Degree,
}

impl From<ModelTypeCli> for ModelVariant {
    fn from(cli: ModelTypeCli) -> Self {
        match cli {
            ModelTypeCli::Uncorrected => ModelVariant::Uncorrected,
            ModelTypeCli::Degree => ModelVariant::DegreeCorrected,
        }
    }
}

/// Output format CLI enum
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
#[clap(rename_all = "lowercase")]
pub enum OutputFormatCli {
    /// Line-oriented plain text
    Plain,
    /// JSON
    Json,
    /// Discard the fitted model
    Null,
}

impl From<OutputFormatCli> for Format {
    fn from(cli: OutputFormatCli) -> Self {
        match cli {
            OutputFormatCli::Plain => Format::Plain,
            OutputFormatCli::Json => Format::Json,
            OutputFormatCli::Null => Format::Null,
        }
    }
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if p > 0.0 && p <= 1.0 {
        Ok(p)
    } else {
        Err(format!("{} is not in (0, 1]", p))
    }
}

/// Fit a stochastic block model to a graph by Markov chain Monte Carlo
#[derive(Parser, Debug)]
#[command(name = "lentil", version, about, long_about, term_width = 80)]
pub struct SampleArgs {
    #[arg(
        required = true,
        help = "Input model file (`-` for stdin)",
        long_help = "Block model to start the chain from.\n\
		     Plain text by default; `.json` files are read as JSON.\n\
		     Gzipped files (`.gz`) are decompressed on the fly.\n\
		     Use `-` to read plain text from standard input."
    )]
    input: Box<str>,

    #[arg(long, short = 'v', conflicts_with = "quiet", help = "Verbose mode (more output)")]
    verbose: bool,

    #[arg(long, short = 'q', help = "Quiet mode (less output, only errors)")]
    quiet: bool,

    #[arg(
        long,
        short = 'o',
        default_value = "-",
        help = "Output file for the fitted model (`-` for stdout)"
    )]
    output: Box<str>,

    #[arg(
        long,
        value_enum,
        help = "Output format",
        long_help = "Format of the fitted model:\n\n\
		     - plain: line-oriented text, readable as input\n\
		     - json: JSON document\n\
		     - null: write nothing (dry run)\n\n\
		     Default: json if the output file ends in `.json`, plain otherwise."
    )]
    output_format: Option<OutputFormatCli>,

    #[arg(
        long,
        short = 'l',
        help = "Labels file of pinned nodes",
        long_help = "Partially labelled nodes, one `node block` pair per line.\n\
		     Labelled nodes are placed in their block before sampling\n\
		     and are never moved by the chain."
    )]
    labels: Option<Box<str>>,

    #[arg(long, help = "Random seed (default: current time)")]
    seed: Option<u64>,

    #[arg(
        long,
        value_enum,
        help = "Block model type",
        long_help = "Edge model of the block model:\n\n\
		     - uncorrected: one edge density per block pair\n\
		     - degree: degree-corrected Poisson model\n\n\
		     Overrides the type stored in the input; uncorrected if neither is given."
    )]
    model: Option<ModelTypeCli>,

    #[arg(
        long,
        short = 'k',
        help = "Number of blocks for random initialisation",
        long_help = "Number of blocks used when the input has no partition\n\
		     and nodes are assigned to random blocks."
    )]
    blocks: Option<usize>,

    #[arg(
        long,
        short = 'c',
        default_value_t = 1,
        help = "Number of samples to take",
        long_help = "Number of samples to take from the chain.\n\
		     0 exits immediately; 1 reports the initial model without sampling."
    )]
    count: usize,

    #[arg(
        long,
        short = 'f',
        default_value_t = 0.01,
        value_parser = parse_probability,
        help = "Probability of taking a sample at each step, in (0, 1]"
    )]
    freq: f64,

    #[arg(
        long,
        short = 'p',
        default_value_t = 8192,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Steps between progress lines"
    )]
    log_period: u64,

    #[arg(
        long,
        help = "Entropy change below which the chain counts as converged",
        long_help = "Enables the entropy convergence check.\n\
		     Every window of taken samples is averaged into a per-node\n\
		     entropy estimate and compared with the previous window."
    )]
    convergence_threshold: Option<f64>,

    #[arg(
        long,
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Number of samples per convergence check"
    )]
    convergence_window: u64,
}

impl SampleArgs {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Error
        } else if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }

    pub fn sampling_options(&self) -> SamplingOptions {
        SamplingOptions {
            num_samples: self.count,
            sampling_prob: self.freq,
            log_period: self.log_period as usize,
            quiet: self.quiet,
        }
    }

    fn output_format(&self) -> Format {
        match self.output_format {
            Some(format) => format.into(),
            None => Format::from_path(&self.output),
        }
    }

    fn random_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(42)
        })
    }
}

pub fn run_sampling(args: &SampleArgs) -> anyhow::Result<()> {
    let options = args.sampling_options();
    if options.num_samples == 0 {
        info!("no samples requested");
        return Ok(());
    }

    let seed = args.random_seed();
    debug!(">> using random seed: {}", seed);

    info!(">> loading model: {}", args.input);
    let load_options = LoadOptions {
        variant: args.model.map(ModelVariant::from),
        num_blocks: args.blocks,
        init_seed: seed,
    };
    let mut model = read_model(&args.input, load_options)?;

    info!(
        "{} model: {} nodes, {} blocks, logL = {:.4}",
        model.variant(),
        model.num_nodes(),
        model.num_blocks(),
        model.log_likelihood()
    );
    if let Some(g) = model.graph() {
        debug!("graph: {} edges", g.num_edges());
    }

    let mut driver = SamplingDriver::new(options);

    if let Some(labels_file) = args.labels.as_deref() {
        let labels = read_labels_file(labels_file)?;
        let mut pinned = HashSet::with_capacity(labels.len());
        for &(node, block) in &labels {
            model
                .assign(node, block)
                .with_context(|| format!("invalid label in {}", labels_file))?;
            pinned.insert(node);
        }
        let free: Vec<usize> = (0..model.num_nodes())
            .filter(|v| !pinned.contains(v))
            .collect();
        info!(
            "pinned {} labelled nodes, {} free nodes",
            pinned.len(),
            free.len()
        );
        driver = driver.with_proposal_nodes(free);
    }

    if let Some(threshold) = args.convergence_threshold {
        driver = driver.with_convergence(
            Box::new(EntropyConvergenceCriterion::new(threshold)),
            args.convergence_window as usize,
        );
    }

    // the model initialisation consumed `seed`; the chain gets its own stream
    let rng = RandomSource::new(seed.wrapping_add(1));
    let summary = driver.run(&mut model, rng)?;

    info!(
        "sampling done: steps={}, samples={}, logL={:.4}, best={:.4}, acceptance={:.4}",
        summary.steps,
        summary.samples_taken,
        summary.final_log_likelihood,
        summary.best_log_likelihood,
        summary.acceptance_ratio
    );
    if let (Some(mean), Some(var)) = (summary.trace.mean(), summary.trace.variance()) {
        debug!(
            "sampled logL: mean={:.4}, var={:.4}, initial={:.4}",
            mean, var, summary.initial_log_likelihood
        );
    }
    match summary.converged {
        Some(true) => info!("chain converged"),
        Some(false) => info!("chain has not converged yet"),
        None => {}
    }

    write_model(&model, &args.output, args.output_format())?;
    Ok(())
}
