use crate::commands::{with_session, CommandFailure, CommandResult, Reply};

const COMMAND: &str = "reset";

/// Clears every device override and stored document. Refuses to run without
/// explicit confirmation.
pub fn run(confirmed: bool) -> CommandResult {
    if !confirmed {
        return CommandResult::failure(
            COMMAND,
            "confirmation_required",
            "reset deletes the custom catalog, rule text and uploaded documents; re-run with --yes",
            2,
        );
    }

    with_session(COMMAND, |session| async move {
        let outcome = match session.resolver.reset_to_defaults().await {
            Ok(_reload) => {
                let working = session.resolver.resolve().await.working();
                Ok(Reply::message(format!(
                    "device configuration reset; {} catalog items, {} documents",
                    working.catalog.len(),
                    working.documents.len()
                )))
            }
            Err(error) => Err(CommandFailure::from(error)),
        };
        (session, outcome)
    })
}
