//! Line protocol: one request per line in, one or more reply lines out.

use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::debug;

use crate::command::{command_label, parse_command, Command};
use crate::engine::{Engine, EngineError};
use crate::limits::MAX_LINE_LEN;
use crate::model::*;
use crate::observability::*;

/// Terminates multi-line replies.
pub const END: &str = "END";

/// Serve one client until it sends `QUIT` or disconnects.
pub async fn process_connection<S>(
    stream: S,
    engine: Arc<Engine>,
    currency: Arc<str>,
) -> Result<(), LinesCodecError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));

    let mut after_decode_error = false;
    loop {
        let line = match framed.next().await {
            Some(Ok(line)) => line,
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                framed.send("ERROR request line too long").await?;
                after_decode_error = true;
                continue;
            }
            Some(Err(e)) => return Err(e),
            // Framed yields a single None after a decode error, then resumes.
            None if after_decode_error => {
                after_decode_error = false;
                continue;
            }
            None => break,
        };
        after_decode_error = false;
        if line.trim().is_empty() {
            continue;
        }

        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                framed.send(format!("ERROR {e}")).await?;
                continue;
            }
        };
        let label = command_label(&cmd);
        metrics::counter!(REQUESTS_TOTAL, "command" => label).increment(1);

        if cmd == Command::Quit {
            framed.send("BYE").await?;
            break;
        }

        let started = Instant::now();
        let reply = execute_command(&engine, &currency, cmd).await;
        metrics::histogram!(REQUEST_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());

        for l in reply {
            framed.feed(l).await?;
        }
        SinkExt::<String>::flush(&mut framed).await?;
    }
    Ok(())
}

/// Run a parsed command and render its reply lines.
pub async fn execute_command(engine: &Engine, currency: &str, cmd: Command) -> Vec<String> {
    match cmd {
        Command::Book {
            facility,
            date,
            start,
            end,
        } => {
            let result = engine.book(&facility, &date, &start, &end).await;
            metrics::counter!(BOOKINGS_TOTAL, "outcome" => outcome_label(&result)).increment(1);
            vec![match result {
                Ok(booking) => format!("Booked, {currency} {}", booking.cost),
                Err(e) => {
                    debug!("booking {facility} on {date} {start}-{end} failed: {e}");
                    booking_failure(&e)
                }
            }]
        }
        Command::Quote {
            facility,
            start,
            end,
        } => match engine.quote(&facility, &start, &end) {
            Ok(quote) => render_quote(&quote, currency),
            Err(e) => vec![format!("ERROR {e}")],
        },
        Command::Bookings { facility, date } => match engine.bookings(&facility, &date).await {
            Ok(bookings) => bookings
                .iter()
                .map(|b| format!("{} {currency} {} {}", b.interval, b.cost, b.id))
                .chain(std::iter::once(END.to_string()))
                .collect(),
            Err(e) => vec![format!("ERROR {e}")],
        },
        Command::Facilities => engine
            .facilities()
            .iter()
            .map(describe_facility)
            .chain(std::iter::once(END.to_string()))
            .collect(),
        Command::Quit => vec!["BYE".to_string()],
    }
}

/// Reply line for a rejected booking.
pub fn booking_failure(e: &EngineError) -> String {
    match e {
        EngineError::Conflict(_) => "Booking Failed, Already Booked".to_string(),
        EngineError::UnknownFacility(_) => "Booking Failed, Unknown Facility".to_string(),
        EngineError::InvalidTimeFormat(s) => format!("Booking Failed, Invalid Time Format: {s}"),
        EngineError::InvalidInterval { .. } => "Booking Failed, Invalid Time Range".to_string(),
        EngineError::LimitExceeded(msg) => format!("Booking Failed, {msg}"),
        EngineError::WalError(_) => "Booking Failed, Storage Error".to_string(),
    }
}

fn render_quote(quote: &Quote, currency: &str) -> Vec<String> {
    let mut lines = Vec::with_capacity(quote.segments.len() + 2);
    lines.push(format!("Quote, {currency} {}", quote.total));
    for seg in &quote.segments {
        lines.push(format!("{} @ {} = {}", seg.interval, seg.rate_per_hour, seg.cost));
    }
    lines.push(END.to_string());
    lines
}

fn describe_facility(facility: &Facility) -> String {
    match &facility.pricing {
        PricingPolicy::Flat { rate_per_hour } => {
            format!("{}: flat {rate_per_hour}/hr", facility.name)
        }
        PricingPolicy::Tiered { tiers } => {
            format!("{}: tiered {} tiers", facility.name, tiers.len())
        }
    }
}
