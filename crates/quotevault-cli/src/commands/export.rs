use std::path::{Path, PathBuf};

use quotevault_core::export::{layout_quote, save_to_media_dir, ExportBackground};
use quotevault_core::util::is_http_url;
use quotevault_core::{AppContext, StorageClient};

use crate::commands::common::{open_app, open_signed_in_app, print_json};
use crate::commands::quotes::fetch_quote;
use crate::error::CliError;

pub struct ExportOptions<'a> {
    pub id: Option<&'a str>,
    pub backdrop: Option<&'a str>,
    pub background: Option<&'a str>,
    pub output_dir: Option<&'a Path>,
    pub json: bool,
}

pub async fn run_export(
    global_profile: Option<&str>,
    options: ExportOptions<'_>,
) -> Result<(), CliError> {
    let app = match options.id {
        Some(_) => open_app(global_profile).await?,
        None => open_signed_in_app(global_profile).await?,
    };
    let quote = match options.id {
        Some(id) => fetch_quote(&app, id).await?,
        None => app.daily_quote().await?,
    };

    let background = resolve_background(&app, options.backdrop, options.background).await?;
    let pictures_dir = resolve_pictures_dir(options.output_dir)?;
    let path = save_to_media_dir(&quote, &background, &pictures_dir)?;

    if options.json {
        print_json(&layout_quote(&quote.text, &quote.author))?;
    }
    println!("{}", path.display());
    Ok(())
}

async fn resolve_background(
    app: &AppContext,
    backdrop: Option<&str>,
    background: Option<&str>,
) -> Result<ExportBackground, CliError> {
    let storage = app.storage();
    if let Some(name) = backdrop {
        return download_background(storage, &storage.public_url(name.trim())).await;
    }
    match background.map(str::trim) {
        Some(url) if is_http_url(url) => download_background(storage, url).await,
        Some(path) => Ok(ExportBackground::from_path(Path::new(path))?),
        None => Ok(ExportBackground::Solid(app.theme().palette().background)),
    }
}

async fn download_background(
    storage: &StorageClient,
    url: &str,
) -> Result<ExportBackground, CliError> {
    let bytes = storage.download(url).await?;
    Ok(ExportBackground::from_bytes(&bytes)?)
}

pub fn resolve_pictures_dir(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .ok_or_else(|| {
            CliError::Config(
                "Failed to resolve a pictures directory; pass --output-dir".to_string(),
            )
        })
}

pub async fn run_backdrops(global_profile: Option<&str>, json: bool) -> Result<(), CliError> {
    let app = open_app(global_profile).await?;
    let backdrops = app.storage().list_backdrops().await?;

    if json {
        let rows = backdrops
            .iter()
            .map(|backdrop| {
                serde_json::json!({ "name": backdrop.name, "public_url": backdrop.public_url })
            })
            .collect::<Vec<_>>();
        return print_json(&rows);
    }
    if backdrops.is_empty() {
        println!("No backdrops in bucket '{}'.", app.storage().bucket());
    }
    for backdrop in &backdrops {
        println!("{}  {}", backdrop.name, backdrop.public_url);
    }
    Ok(())
}
