use clap::Subcommand;

use quotedesk_core::domain::catalog::{parse_models, CatalogItemId};
use quotedesk_core::domain::plan::{ContractLength, ProductCategory};

use crate::commands::{with_session, CommandFailure, CommandResult, Reply, Session};

const COMMAND: &str = "catalog";

#[derive(Debug, Clone, Subcommand)]
pub enum CatalogCommand {
    #[command(about = "List the resolved catalog")]
    List,
    #[command(about = "Append a placeholder item and print its id")]
    Add,
    #[command(about = "Remove an item by id")]
    Remove { id: String },
    #[command(about = "Rename an item")]
    Rename { id: String, name: String },
    #[command(about = "Replace an item's models from a comma-separated list")]
    Models { id: String, models: String },
    #[command(about = "Move an item to another category (resets name, first model and plans)")]
    Category { id: String, category: String },
    #[command(about = "Set an item's contract lengths, e.g. `60 84`")]
    Plans {
        id: String,
        #[arg(required = true)]
        plans: Vec<String>,
        #[arg(long, help = "Write the list without checking it against the plan table")]
        unchecked: bool,
    },
}

pub fn run(command: CatalogCommand) -> CommandResult {
    with_session(COMMAND, |mut session| async move {
        let outcome = execute(&mut session, command).await;
        (session, outcome)
    })
}

async fn execute(session: &mut Session, command: CatalogCommand) -> Result<Reply, CommandFailure> {
    let catalog = &mut session.resolved.catalog;
    match command {
        CatalogCommand::List => {
            let items = catalog.list();
            Ok(Reply::with_data(format!("{} catalog items", items.len()), items))
        }
        CatalogCommand::Add => {
            let id = catalog.add_item().await?;
            Ok(Reply::with_data(format!("added item {}", id.0), serde_json::json!({ "id": id })))
        }
        CatalogCommand::Remove { id } => {
            catalog.remove_item(&CatalogItemId(id.clone())).await?;
            Ok(Reply::message(format!("removed item {id}")))
        }
        CatalogCommand::Rename { id, name } => {
            catalog.rename_item(&CatalogItemId(id.clone()), &name).await?;
            Ok(Reply::message(format!("renamed item {id}")))
        }
        CatalogCommand::Models { id, models } => {
            let models = parse_models(&models);
            let count = models.len();
            catalog.set_models(&CatalogItemId(id.clone()), models).await?;
            Ok(Reply::message(format!("item {id} now lists {count} models")))
        }
        CatalogCommand::Category { id, category } => {
            let category = category.parse::<ProductCategory>()?;
            let id = CatalogItemId(id);
            catalog.change_category(&id, category).await?;
            let item = catalog.find(&id);
            Ok(Reply::with_data(format!("item {} moved to {category}", id.0), item))
        }
        CatalogCommand::Plans { id, plans, unchecked } => {
            let plans = plans
                .iter()
                .map(|plan| plan.parse::<ContractLength>())
                .collect::<Result<Vec<_>, _>>()?;
            let id = CatalogItemId(id);
            if unchecked {
                catalog.set_plans_unchecked(&id, plans).await?;
            } else {
                catalog.set_plans(&id, plans).await?;
            }
            let item = catalog.find(&id);
            Ok(Reply::with_data(format!("plans updated for item {}", id.0), item))
        }
    }
}
