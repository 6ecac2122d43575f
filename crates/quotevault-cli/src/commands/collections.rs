use quotevault_core::collections::{add_quote_to_collection, create_collection, CollectionStore};
use quotevault_core::{AddToCollectionOutcome, CollectionId};

use crate::cli::CollectionCommands;
use crate::commands::common::{format_summary_line, open_signed_in_app, parse_quote_id, print_json};
use crate::error::CliError;

pub async fn run_collections(
    command: CollectionCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let app = open_signed_in_app(global_profile).await?;
    let (client, user) = app.user_client()?;

    match command {
        CollectionCommands::List { json } => {
            let collections = client.list_collections(&user).await?;
            if json {
                return print_json(&collections);
            }
            if collections.is_empty() {
                println!("No collections yet.");
            }
            for collection in &collections {
                let noun = if collection.count == 1 { "quote" } else { "quotes" };
                println!(
                    "{}  {} ({} {noun})",
                    collection.id, collection.name, collection.count
                );
            }
        }
        CollectionCommands::Create { name } => {
            let collection = create_collection(&client, &user, &name.join(" ")).await?;
            println!("Created collection '{}' ({})", collection.name, collection.id);
        }
        CollectionCommands::Show { id, json } => {
            let quotes = client.collection_quotes(&parse_collection_id(&id)?).await?;
            if json {
                return print_json(&quotes);
            }
            if quotes.is_empty() {
                println!("Collection is empty.");
            }
            for quote in &quotes {
                println!("{}", format_summary_line(quote));
            }
        }
        CollectionCommands::Add { collection, quote } => {
            let collection = parse_collection_id(&collection)?;
            let quote = parse_quote_id(&quote)?;
            match add_quote_to_collection(&client, &collection, &quote).await? {
                AddToCollectionOutcome::Added => println!("Added {quote} to {collection}"),
                AddToCollectionOutcome::AlreadyPresent => {
                    println!("{quote} is already in {collection}");
                }
            }
        }
    }
    Ok(())
}

fn parse_collection_id(raw: &str) -> Result<CollectionId, CliError> {
    CollectionId::new(raw)
        .map_err(|_| CliError::InvalidInput("Collection ID cannot be empty".to_string()))
}
