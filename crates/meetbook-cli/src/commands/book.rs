use clap::Args;
use meetbook_core::BookingRequest;

use super::{block_on, emit, graph_service, CmdResult};

#[derive(Args)]
pub struct BookArgs {
    /// Attendee's full name
    #[arg(long)]
    pub name: String,
    /// Attendee's email address
    #[arg(long)]
    pub email: String,
    /// Meeting title; the attendee name is appended
    #[arg(long)]
    pub title: String,
    /// Day (YYYY-MM-DD)
    pub date: String,
    /// Start time (HH:MM, 24-hour)
    pub time: String,
    /// Meeting length in minutes
    #[arg(short, long)]
    pub duration: Option<i64>,
    /// Agenda or notes added to the invitation
    #[arg(long, default_value = "")]
    pub notes: String,
    /// Idempotency key; reuse it when retrying the same booking
    #[arg(long)]
    pub key: Option<String>,
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: BookArgs) -> CmdResult {
    let service = graph_service()?;
    let request = BookingRequest {
        customer_name: args.name,
        customer_email: args.email,
        meeting_title: args.title,
        date: args.date,
        start_time: args.time,
        duration_min: args.duration,
        notes: args.notes,
        idempotency_key: args.key,
    };

    let outcome = block_on(service.book_meeting_slot(&request))?;
    emit(&outcome, args.json)?;
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
