use std::env;

use quotevault_core::ClientConfig;

use crate::cli::ConfigCommands;
use crate::config_profiles::{
    normalize_text_option, CliProfile, CliProfilesConfig, SUPABASE_ANON_KEY_ENV, SUPABASE_URL_ENV,
};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            backdrop_bucket,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            supabase_url,
            supabase_anon_key,
            backdrop_bucket,
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    backdrop_bucket: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(
        existing,
        supabase_url.or_else(|| env::var(SUPABASE_URL_ENV).ok()),
        supabase_anon_key.or_else(|| env::var(SUPABASE_ANON_KEY_ENV).ok()),
        backdrop_bucket,
    )?;
    *config.profile_mut_or_default(&profile_name) = merged.clone();

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let mut missing_fields = Vec::new();
    if merged.supabase_url.is_none() {
        missing_fields.push("supabase_url");
    }
    if merged.supabase_anon_key.is_none() {
        missing_fields.push("supabase_anon_key");
    }
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `quotevault auth login --email <email> --password <password>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }
    Ok(())
}

/// Overlay explicit values on an existing profile and validate the result.
pub fn merge_profile(
    existing: CliProfile,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    backdrop_bucket: Option<String>,
) -> Result<CliProfile, CliError> {
    let merged = CliProfile {
        supabase_url: normalize_text_option(supabase_url).or(existing.supabase_url),
        supabase_anon_key: normalize_text_option(supabase_anon_key).or(existing.supabase_anon_key),
        backdrop_bucket: normalize_text_option(backdrop_bucket).or(existing.backdrop_bucket),
        theme: existing.theme,
    };

    if let (Some(url), Some(key)) = (&merged.supabase_url, &merged.supabase_anon_key) {
        ClientConfig::new(url.as_str(), key.as_str())
            .map_err(|error| CliError::Config(error.to_string()))?;
    } else if let Some(url) = &merged.supabase_url {
        if !quotevault_core::util::is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(merged)
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let Some(profile) = config.profile(&profile_name) else {
        println!("Profile '{profile_name}' is not configured.");
        return Ok(());
    };

    println!("Profile: {profile_name}");
    println!(
        "Supabase URL: {}",
        profile.supabase_url.as_deref().unwrap_or("(unset)")
    );
    println!(
        "Anon key: {}",
        if profile.supabase_anon_key.is_some() {
            "(set)"
        } else {
            "(unset)"
        }
    );
    println!(
        "Backdrop bucket: {}",
        profile
            .backdrop_bucket
            .as_deref()
            .unwrap_or(quotevault_core::config::DEFAULT_BACKDROP_BUCKET)
    );
    println!("Theme: {}", profile.theme());
    Ok(())
}
