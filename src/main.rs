use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use std::io::{stdin, stdout, BufRead, Write};

use connect4_solver::{
    batch,
    driver::Driver,
    session::{Session, Status},
    solver::Solver,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays and analyses Connect 4 perfectly", long_about = None)]
struct Args {
    /// Only compute win/draw/loss instead of exact scores
    #[arg(short, long)]
    weak: bool,

    /// Opening book file
    #[arg(short, long, default_value = "7x6.book")]
    book: String,

    /// Score one position per input line instead of playing
    #[arg(long)]
    batch: bool,

    /// Seed for choosing between equally good moves
    #[arg(long)]
    seed: Option<u64>,

    /// Print the board without colours
    #[arg(long)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    // unknown or malformed flags are skipped rather than rejected
    fn parse_lenient() -> Self {
        let matches = Args::command().ignore_errors(true).get_matches();
        Args::from_arg_matches(&matches).unwrap_or_else(|_| Args {
            weak: false,
            book: "7x6.book".to_string(),
            batch: false,
            seed: None,
            no_color: false,
            debug: false,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse_lenient();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
    .init();

    debug!("{:?}", args);
    // there is no book format to read yet, the path is only reported
    debug!("opening book {} is not loaded", args.book);

    let stdin = stdin();
    let stdout = stdout();

    if args.batch {
        let solved = batch::evaluate(stdin.lock(), &mut stdout.lock(), &mut Solver::new(), args.weak)?;
        info!("solved {} positions", solved);
        return Ok(());
    }

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    info!("Welcome to Connect 4, tie-break seed {}", seed);

    let driver = Driver::new(
        Solver::new(),
        Xoshiro256PlusPlus::seed_from_u64(seed),
        args.weak,
    );
    let mut session = Session::new(driver, !args.no_color);

    // game loop
    for line in stdin.lock().lines() {
        let status = session.process_line(&line?, &mut stdout.lock())?;
        if status.is_finished() {
            info!("game over ({:?}) after {}", status, session.moves());
            break;
        }
        if status == Status::Rejected {
            debug!("keeping moves {}", session.moves());
        }
    }
    Ok(())
}
