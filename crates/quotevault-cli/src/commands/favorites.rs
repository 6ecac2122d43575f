use quotevault_core::favorites::{FavoriteStore, LikedQuotes};

use crate::commands::common::{format_summary_line, open_signed_in_app, parse_quote_id, print_json};
use crate::error::CliError;

pub async fn run_like(global_profile: Option<&str>, id: &str) -> Result<(), CliError> {
    let quote = parse_quote_id(id)?;
    let app = open_signed_in_app(global_profile).await?;
    let (client, user) = app.user_client()?;

    let mut liked = LikedQuotes::load(&client, &user).await?;
    let state = liked.toggle_optimistic(&client, &user, &quote).await?;

    if state.is_liked() {
        println!("Liked {quote} ({} liked)", liked.len());
    } else {
        println!("Unliked {quote} ({} liked)", liked.len());
    }
    Ok(())
}

pub async fn run_likes(global_profile: Option<&str>, json: bool) -> Result<(), CliError> {
    let app = open_signed_in_app(global_profile).await?;
    let (client, user) = app.user_client()?;
    let favorites = client.list_favorites(&user).await?;

    if json {
        return print_json(&favorites);
    }
    if favorites.is_empty() {
        println!("No liked quotes yet.");
        return Ok(());
    }
    for favorite in &favorites {
        println!("{}", format_summary_line(&favorite.quote));
    }
    Ok(())
}
