use chrono::{Local, NaiveDate};
use clap::Args;
use meetbook_core::next_business_days;

use super::CmdResult;

#[derive(Args)]
pub struct DaysArgs {
    /// How many days to list
    #[arg(short, long, default_value_t = 7, value_parser = clap::value_parser!(u16).range(1..=366))]
    pub count: u16,
    /// Count from this day instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: DaysArgs) -> CmdResult {
    let from = args.from.unwrap_or_else(|| Local::now().date_naive());
    let days = next_business_days(from, usize::from(args.count));

    if args.json {
        let dates: Vec<String> = days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
        println!("{}", serde_json::to_string_pretty(&dates)?);
    } else {
        for day in days {
            println!("{}", day.format("%Y-%m-%d %a"));
        }
    }
    Ok(())
}
