use quotevault_core::favorites::LikedQuotes;
use quotevault_core::feed::{QuoteFeed, QuoteFeedStore};
use quotevault_core::{AppContext, Quote, QuoteCategory};

use crate::cli::CategoryArg;
use crate::commands::common::{format_quote_line, open_app, open_signed_in_app, parse_quote_id, print_json};
use crate::error::CliError;

pub async fn run_daily(global_profile: Option<&str>, json: bool) -> Result<(), CliError> {
    let app = open_signed_in_app(global_profile).await?;
    let quote = app.daily_quote().await?;

    if json {
        print_json(&quote)?;
    } else {
        println!("Quote of the day ({})\n", quote.category);
        println!("{}", quote.share_text());
    }
    Ok(())
}

pub async fn run_feed(
    global_profile: Option<&str>,
    pages: usize,
    categories: &[CategoryArg],
    json: bool,
) -> Result<(), CliError> {
    let app = open_app(global_profile).await?;
    let categories = categories
        .iter()
        .copied()
        .map(QuoteCategory::from)
        .collect::<Vec<_>>();
    let mut feed = QuoteFeed::with_categories(categories);

    if let Ok((client, user)) = app.user_client() {
        feed.refresh(&client).await?;
        load_pages(&mut feed, &client, pages).await?;
        let liked = LikedQuotes::load(&client, &user).await?;
        print_feed(feed.quotes(), &liked, json)
    } else {
        let client = app.anonymous_client();
        feed.refresh(client).await?;
        load_pages(&mut feed, client, pages).await?;
        print_feed(feed.quotes(), &LikedQuotes::default(), json)
    }
}

async fn load_pages<S>(feed: &mut QuoteFeed, store: &S, pages: usize) -> Result<(), CliError>
where
    S: QuoteFeedStore + ?Sized,
{
    for _ in 1..pages {
        if feed.is_exhausted() {
            break;
        }
        feed.load_more(store).await?;
    }
    Ok(())
}

fn print_feed(quotes: &[Quote], liked: &LikedQuotes, json: bool) -> Result<(), CliError> {
    if json {
        return print_json(quotes);
    }
    if quotes.is_empty() {
        println!("No quotes found.");
        return Ok(());
    }
    for quote in quotes {
        println!("{}", format_quote_line(quote, liked.is_liked(&quote.id)));
    }
    Ok(())
}

pub async fn run_show(global_profile: Option<&str>, id: &str, json: bool) -> Result<(), CliError> {
    let app = open_app(global_profile).await?;
    let quote = fetch_quote(&app, id).await?;

    if json {
        print_json(&quote)?;
    } else {
        println!("{}", quote.share_text());
        println!("\n{} \u{00B7} {}", quote.category, quote.id);
    }
    Ok(())
}

pub async fn run_share(global_profile: Option<&str>, id: Option<&str>) -> Result<(), CliError> {
    let quote = match id {
        Some(id) => fetch_quote(&open_app(global_profile).await?, id).await?,
        None => open_signed_in_app(global_profile).await?.daily_quote().await?,
    };
    println!("{}", quote.share_text());
    Ok(())
}

/// Fetch by id as the signed-in user when possible, anonymously otherwise.
pub async fn fetch_quote(app: &AppContext, id: &str) -> Result<Quote, CliError> {
    let id = parse_quote_id(id)?;
    let found = match app.user_client() {
        Ok((client, _)) => client.get_quote(&id).await?,
        Err(_) => app.anonymous_client().get_quote(&id).await?,
    };
    found.ok_or_else(|| CliError::QuoteNotFound(id.to_string()))
}
