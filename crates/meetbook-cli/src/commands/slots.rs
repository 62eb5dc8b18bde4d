use clap::Args;
use meetbook_core::SlotQuery;

use super::{block_on, emit, graph_service, CmdResult};

#[derive(Args)]
pub struct SlotsArgs {
    /// Day to search (YYYY-MM-DD)
    pub date: String,
    /// Meeting length in minutes (clamped to the configured bounds)
    #[arg(short, long)]
    pub duration: Option<i64>,
    /// Working day start hour (0-23)
    #[arg(long)]
    pub start: Option<i32>,
    /// Working day end hour (1-23)
    #[arg(long)]
    pub end: Option<i32>,
    /// List every start time in each gap instead of the earliest one
    #[arg(long)]
    pub all: bool,
    /// Minutes between start times with --all
    #[arg(long, requires = "all", default_value_t = 15)]
    pub step: i64,
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SlotsArgs) -> CmdResult {
    let service = graph_service()?;
    let query = SlotQuery {
        date: args.date,
        duration_min: args.duration,
        working_start: args.start,
        working_end: args.end,
        step_min: args.all.then_some(args.step),
    };

    let listing = block_on(service.list_available_slots(&query))?;
    emit(&listing, args.json)?;
    if listing.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
