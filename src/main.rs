//! Horse Derby - headless race runner
//!
//! Runs one race to completion and prints the standings and payouts as JSON.
//!
//! See `horse-derby --help` for the options.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;
    use std::path::PathBuf;

    use clap::{Parser, ValueEnum};
    use horse_derby::consts::{MAX_SUBSTEPS, SIM_DT_MS};
    use horse_derby::sim::{RaceEngine, RacePhase, TickInput};
    use horse_derby::{Entrant, FixedPayout, MapDefinition, PayoutEngine, PayoutMode, RaceConfig};
    use serde::Serialize;

    /// Give up on races that never finish (e.g. every AI horse wedged)
    const MAX_RACE_MS: f32 = 10.0 * 60.0 * 1000.0;

    #[derive(Parser, Debug)]
    #[command(name = "horse-derby")]
    #[command(about = "Run one deterministic horse race and print standings and payouts as JSON")]
    struct Cli {
        /// Map definition (JSON); the built-in demo map when omitted
        #[arg(long)]
        map: Option<PathBuf>,
        /// Race config (JSON); defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Number of entrants; one per spawn point when omitted
        #[arg(long)]
        horses: Option<usize>,
        #[arg(long, value_enum, default_value_t = CliPayout::Winner)]
        payout: CliPayout,
        #[arg(long, default_value_t = 1000)]
        pool: u64,
        /// Simulated render frame length fed to the fixed-step accumulator
        #[arg(long, default_value_t = SIM_DT_MS)]
        frame_ms: f32,
    }

    #[derive(Clone, Copy, Debug, ValueEnum)]
    enum CliPayout {
        Winner,
        Survival,
    }

    impl From<CliPayout> for PayoutMode {
        fn from(value: CliPayout) -> Self {
            match value {
                CliPayout::Winner => PayoutMode::WinnerTakesMost,
                CliPayout::Survival => PayoutMode::PositionScaledSurvival,
            }
        }
    }

    #[derive(Serialize)]
    struct Report<'a> {
        map: &'a str,
        seed: u64,
        elapsed_ms: f32,
        ticks: u64,
        complete: bool,
        standings: Vec<horse_derby::sim::Standing>,
        payouts: Vec<horse_derby::Payout>,
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let args = Cli::parse();

        let config = match &args.config {
            Some(path) => RaceConfig::load(path)?,
            None => RaceConfig::default(),
        };
        let map = match &args.map {
            Some(path) => MapDefinition::load(path)?,
            None => MapDefinition::demo(),
        };
        let horses = args.horses.unwrap_or(map.spawn_points.len());
        let entrants = Entrant::roster(horses);
        let map_name = map.name.clone();

        let mut engine = RaceEngine::new(config);
        engine.load(map, &entrants, args.seed)?;
        engine.start()?;

        // Fixed-step accumulator, fed with simulated render frames
        let input = TickInput::default();
        let frame_ms = args.frame_ms.max(1.0);
        let mut accumulator = 0.0;
        let mut elapsed = 0.0;
        while engine.phase() == Some(RacePhase::Running) && elapsed < MAX_RACE_MS {
            accumulator += frame_ms;
            elapsed += frame_ms;

            let mut substeps = 0;
            while accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
                engine.tick(&input, SIM_DT_MS)?;
                accumulator -= SIM_DT_MS;
                substeps += 1;
            }
            if substeps == MAX_SUBSTEPS {
                accumulator = accumulator.min(SIM_DT_MS);
            }
        }

        let Some(state) = engine.state() else {
            return Err("race vanished".into());
        };
        let complete = state.phase == RacePhase::Complete;
        if !complete {
            log::warn!("Race stopped unfinished after {:.0} ms", state.elapsed_ms);
        }

        let standings = state.results();
        let payouts = FixedPayout::new(args.payout.into()).payouts(&standings, args.pool);
        let report = Report {
            map: &map_name,
            seed: args.seed,
            elapsed_ms: state.elapsed_ms,
            ticks: state.tick_count,
            complete,
            standings,
            payouts,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Horse Derby (native) starting...");

    if let Err(e) = native::run() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library only on the web; the runner is native
}
