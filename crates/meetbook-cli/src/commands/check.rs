use clap::Args;
use meetbook_core::AvailabilityQuery;

use super::{block_on, emit, graph_service, CmdResult};

#[derive(Args)]
pub struct CheckArgs {
    /// Day (YYYY-MM-DD)
    pub date: String,
    /// Start time (HH:MM, 24-hour)
    pub time: String,
    /// Meeting length in minutes
    #[arg(short, long)]
    pub duration: Option<i64>,
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CheckArgs) -> CmdResult {
    let service = graph_service()?;
    let query = AvailabilityQuery {
        date: args.date,
        start_time: args.time,
        duration_min: args.duration,
    };

    let report = block_on(service.check_specific_time_availability(&query))?;
    emit(&report, args.json)?;
    if report.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
