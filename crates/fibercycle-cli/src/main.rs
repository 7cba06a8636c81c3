//! CLI for fibercycle: which trajectories does the carry-coupled Collatz map capture?

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fibercycle")]
#[command(about = "fibercycle: cycle capture and fiber drift under a carry-coupled Collatz map")]
#[command(version = fibercycle_core::VERSION)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full batch: setup, burn-in, test window, survivor report
    Run {
        /// Load simulation constants from a JSON file (flags below override it)
        #[arg(long)]
        config: Option<String>,

        /// Prime modulus for the fiber recurrence
        #[arg(long)]
        prime_mod: Option<i64>,

        /// Multiplier in the odd branch and fiber recurrence
        #[arg(long)]
        k_factor: Option<i64>,

        /// Number of parallel trajectories
        #[arg(long)]
        batch_size: Option<usize>,

        /// Burn-in steps discarded before observation
        #[arg(long)]
        burn_in: Option<usize>,

        /// Full 3-step cycles in the test window
        #[arg(long)]
        test_cycles: Option<usize>,

        /// Generator seed (default: drawn from the OS and printed)
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads per step
        #[arg(long)]
        threads: Option<usize>,

        /// Also run the Exp(1) goodness-of-fit battery on survivor spacings
        #[arg(long)]
        battery: bool,

        /// Histogram bins for the spacing spectrum
        #[arg(long, default_value = "20")]
        bins: usize,

        /// Histogram bar width in characters
        #[arg(long, default_value = "60")]
        width: usize,

        /// Write the run report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Follow a single (w, n) pair step by step
    Trace {
        /// Starting trajectory value
        w: i64,

        /// Starting fiber value, in [0, prime_mod)
        n: i64,

        /// Number of steps to follow
        #[arg(long, default_value = "30")]
        steps: usize,

        /// Prime modulus
        #[arg(long, default_value = "1000000007")]
        prime_mod: i64,

        /// Odd-branch multiplier
        #[arg(long, default_value = "4")]
        k_factor: i64,
    },

    /// Print the inverse of 2 modulo a prime and verify it
    Inverse {
        /// Prime modulus
        #[arg(default_value = "1000000007")]
        prime: i64,
    },
}

fn main() {
    let cli = Cli::parse();
    commands::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            prime_mod,
            k_factor,
            batch_size,
            burn_in,
            test_cycles,
            seed,
            threads,
            battery,
            bins,
            width,
            output,
        } => commands::run::run(commands::run::RunCommandConfig {
            config_path: config.as_deref(),
            overrides: commands::ConfigOverrides {
                prime_mod,
                k_factor,
                batch_size,
                burn_in_steps: burn_in,
                test_cycles,
                seed,
                threads,
            },
            battery,
            bins,
            width,
            output_path: output.as_deref(),
        }),
        Commands::Trace {
            w,
            n,
            steps,
            prime_mod,
            k_factor,
        } => commands::trace::run(w, n, steps, prime_mod, k_factor),
        Commands::Inverse { prime } => commands::inverse::run(prime),
    };

    if let Err(e) = result {
        commands::fail(e);
    }
}
