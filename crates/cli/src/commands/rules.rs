use std::path::PathBuf;

use clap::Subcommand;

use crate::commands::{read_text, with_session, CommandFailure, CommandResult, Reply, Session};

const COMMAND: &str = "rules";

#[derive(Debug, Clone, Subcommand)]
pub enum RulesCommand {
    #[command(about = "Print the resolved rule text")]
    Show,
    #[command(about = "Replace the rule text from an argument or a file")]
    Set {
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

pub fn run(command: RulesCommand) -> CommandResult {
    with_session(COMMAND, |mut session| async move {
        let outcome = execute(&mut session, command).await;
        (session, outcome)
    })
}

async fn execute(session: &mut Session, command: RulesCommand) -> Result<Reply, CommandFailure> {
    let rules = &mut session.resolved.rules;
    match command {
        RulesCommand::Show => {
            Ok(Reply::with_data(format!("{} characters", rules.get().len()), rules.get()))
        }
        RulesCommand::Set { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => read_text(&path)?,
                (None, None) => {
                    return Err(CommandFailure::usage("rule text or --file is required"))
                }
            };
            rules.set(text).await?;
            Ok(Reply::message("rule text replaced"))
        }
    }
}
