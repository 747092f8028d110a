use std::path::Path;

use quotedesk_core::advisor::QuoteRequest;
use quotedesk_core::domain::order::OrderForm;

use crate::commands::{read_text, with_session, CommandFailure, CommandResult, Reply, Session};

const COMMAND: &str = "quote-request";

/// Builds the reasoning-service request for an order form stored as JSON.
pub fn run(order_path: &Path) -> CommandResult {
    let order_path = order_path.to_path_buf();
    with_session(COMMAND, |session| async move {
        let outcome = build(&session, &order_path);
        (session, outcome)
    })
}

fn build(session: &Session, order_path: &Path) -> Result<Reply, CommandFailure> {
    let raw = read_text(order_path)?;
    let order: OrderForm = serde_json::from_str(&raw).map_err(|error| {
        CommandFailure::usage(format!("`{}` is not an order form: {error}", order_path.display()))
    })?;

    let request = QuoteRequest::build(&order, &session.resolved.working())?;
    Ok(Reply::with_data(
        format!(
            "{} line items, {} attachments",
            request.line_items.len(),
            request.attachments.len()
        ),
        request,
    ))
}
