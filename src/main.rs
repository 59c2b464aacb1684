use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use eonsim::optical_network::ops::{CutEnd, ExpandDirection, ReducePriority, RsaConfig};
use eonsim::optical_network::sim::Simulation;
use eonsim::optical_network::spectrum::DEFAULT_SLOTS_PER_LINK;
use eonsim::optical_network::topology::Topology;

#[derive(Parser)]
#[command(about = "elastic optical network RSA simulator over a closed request trace")]
struct Args {
    /// topology file, one `source destination capacity weight` per line
    topology: PathBuf,
    /// request trace, one `source destination capacity` per line
    trace: PathBuf,
    /// frequency slots per fibre
    #[arg(long, default_value_t = DEFAULT_SLOTS_PER_LINK)]
    slots: usize,
    /// statistics report interval in requests, 0 disables
    #[arg(long, default_value_t = 10)]
    report_every: usize,
    #[arg(long, value_enum, default_value = "up")]
    expand_direction: ExpandDirection,
    #[arg(long, value_enum, default_value = "path-weight-slot")]
    reduce_priority: ReducePriority,
    #[arg(long, value_enum, default_value = "high")]
    cut_end: CutEnd,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let topology_file = File::open(&args.topology)
        .map_err(|err| format!("cannot open topology {:?}: {err}", args.topology))?;
    let topology = Topology::from_reader(BufReader::new(topology_file))?;
    log::info!(
        "topology loaded: {} nodes, {} links",
        topology.nodes_len(),
        topology.links_len()
    );
    for id in 0..topology.links_len() {
        let (a, b) = topology.link_ends(id);
        log::debug!(
            "link {id}: {}-{} capacity {} weight {}",
            topology.node_name(a),
            topology.node_name(b),
            topology.link_capacity(id),
            topology.link_weight(id)
        );
    }

    let trace_file = File::open(&args.trace)
        .map_err(|err| format!("cannot open trace {:?}: {err}", args.trace))?;

    let config = RsaConfig {
        expand_direction: args.expand_direction,
        reduce_priority: args.reduce_priority,
        cut_end: args.cut_end,
    };
    let mut sim = Simulation::new(&topology, args.slots, config);

    let started = Instant::now();
    let stats = sim.run_trace(BufReader::new(trace_file), args.report_every)?;
    let elapsed = started.elapsed().as_secs_f64();

    println!("processed {} requests in {elapsed:.3}s", stats.requests);
    println!(
        "add {} / expand {} / reduce {} / delete {}",
        stats.add_times, stats.expand_times, stats.reduce_times, stats.delete_times
    );
    println!(
        "blocked {} (rate {:.4}), undefined {}",
        stats.blocks,
        stats.block_rate(),
        stats.undefined
    );
    println!(
        "active connections {}, mean fragmentation {:.4}",
        sim.connections().active_count(),
        eonsim::optical_network::fragmentation::mean_fragmentation(sim.slots())
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("eonsim: {err}");
        std::process::exit(1);
    }
}
