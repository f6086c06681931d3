use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "pitwall",
    about = "A real-time race strategy simulator with remote strategy agents"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing
    #[clap(short, long)]
    pub debug: bool,

    /// Disable strategy agents - all teams race without instructions
    #[clap(long)]
    pub no_agents: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the simulation parameter file (OPTIONAL: if not set, uses the built-in grid)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set real-time factor (2.0 runs the race at double speed)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set scheduler tick rate in Hz, should be in the range [1.0, 120.0]
    #[clap(short, long, default_value = "20.0")]
    pub tick_rate: f64,
}
