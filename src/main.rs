use std::process::ExitCode;

use clap::Parser;
use cgsr::contact_plan::from_file::load_contact_plan;
use cgsr::scheduler::{AssignOnly, FullCgs, PickupAndDeliveryValidated, PickupOnly, ResourceAwareNoDefine};
use cgsr::sim::generators::{mean_request_inter_arrival_time, RequestGenerator};
use cgsr::sim::Engine;
use cgsr::sim_input::load_sim_input;
use cgsr::types::Date;
use tracing_subscriber::EnvFilter;

/// Which of the five scheduling profiles (§9 "Dynamic dispatch") a run
/// exercises, selected once at startup rather than carried as runtime state.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Profile {
    Full,
    PickupOnly,
    PickupAndDeliveryValidated,
    AssignOnly,
    ResourceAwareNoDefine,
}

/// Replays a deterministic contact plan against a simulated request stream
/// and reports the resulting acquisition/delivery analytics.
#[derive(Parser, Debug)]
#[command(name = "cgsr", version, about)]
struct Cli {
    /// Path to a text contact plan (§2 file format).
    contact_plan: String,

    /// Path to a JSON simulation-input document (§6).
    sim_input: String,

    /// Simulation horizon to run to, overriding the input document's
    /// `simulation.duration` if given.
    #[arg(long)]
    until: Option<Date>,

    /// Scheduling profile to exercise.
    #[arg(long, value_enum, default_value_t = Profile::Full)]
    profile: Profile,

    /// RNG seed for id allocation and request generation.
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let plan = match load_contact_plan(&cli.contact_plan) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let input = match load_sim_input(&cli.sim_input) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let until = cli.until.unwrap_or(input.simulation.date_start + input.simulation.duration);
    let targets: Vec<_> = input.targets.iter().map(|t| t.uid).collect();
    let destination = input
        .gateways
        .first()
        .map(|g| g.eid.unwrap_or(g.uid))
        .unwrap_or(input.traffic.priority as u32);

    let satellite_uids: std::collections::HashSet<_> = input.satellites.iter().map(|s| s.uid).collect();
    let gateway_uids: std::collections::HashSet<_> = input.gateways.iter().map(|g| g.uid).collect();
    let download_capacity: Date = plan
        .contacts()
        .iter()
        .filter(|c| satellite_uids.contains(&c.frm) && gateway_uids.contains(&c.to))
        .map(|c| c.rate * (c.end - c.start))
        .sum();

    let mean_inter_arrival = mean_request_inter_arrival_time(
        input.simulation.duration,
        input.traffic.size,
        download_capacity,
        input.traffic.congestion,
    );
    let mut generator = RequestGenerator::new(
        cli.seed,
        mean_inter_arrival,
        targets,
        destination,
        input.traffic.size,
        input.traffic.priority,
        input.traffic.max_time_to_acquire,
        input.traffic.max_time_to_deliver,
    );

    macro_rules! run_with_profile {
        ($profile:ty) => {{
            let mut engine: Engine<$profile> = Engine::bootstrap(&input, plan, cli.seed);
            let mut ids = cgsr::utils::IdAllocator::new(cli.seed.wrapping_add(1));
            let mut t = input.simulation.date_start;
            while t < until {
                t += generator.next_arrival_delay();
                if t >= until {
                    break;
                }
                engine.submit_request(generator.generate(t, &mut ids));
            }
            engine.run_until(until);
            engine.summary()
        }};
    }

    let summary = match cli.profile {
        Profile::Full => run_with_profile!(FullCgs),
        Profile::PickupOnly => run_with_profile!(PickupOnly),
        Profile::PickupAndDeliveryValidated => run_with_profile!(PickupAndDeliveryValidated),
        Profile::AssignOnly => run_with_profile!(AssignOnly),
        Profile::ResourceAwareNoDefine => run_with_profile!(ResourceAwareNoDefine),
    };

    println!("{summary:#?}");
    ExitCode::SUCCESS
}
