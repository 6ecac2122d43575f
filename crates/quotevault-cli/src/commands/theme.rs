use quotevault_core::{Palette, ThemeHandle};

use crate::cli::ThemeArg;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_theme(global_profile: Option<&str>, mode: Option<ThemeArg>) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let theme = ThemeHandle::new(
        config
            .profile(&profile_name)
            .map(|profile| profile.theme())
            .unwrap_or_default(),
    );

    if let Some(mode) = mode {
        if theme.set_mode(mode.apply(theme.mode())) {
            config.profile_mut_or_default(&profile_name).theme = Some(theme.mode());
            config.save().map_err(CliError::Config)?;
        }
    }

    println!("Theme for profile '{profile_name}': {}", theme.mode());
    println!("{}", describe_palette(&theme.palette()));
    Ok(())
}

pub fn describe_palette(palette: &Palette) -> String {
    format!(
        "background {}  text {}  primary {}  card {}",
        palette.background.to_hex(),
        palette.text.to_hex(),
        palette.primary.to_hex(),
        palette.card.to_hex()
    )
}
