use quotevault_core::SignUpOutcome;

use crate::auth::{clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::commands::common::ProfileContext;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            let context = ProfileContext::load(global_profile)?;
            let session = context.auth_service()?.sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{}' as {email_label}", context.name);
            Ok(())
        }
        AuthCommands::Signup { email, password } => {
            let context = ProfileContext::load(global_profile)?;
            match context.auth_service()?.sign_up(&email, &password).await? {
                SignUpOutcome::SignedIn(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!("Created account and signed in as {email_label}");
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!("Account created. Check {email} for a confirmation link, then run `quotevault auth login`.");
                }
            }
            Ok(())
        }
        AuthCommands::ResetPassword { email } => {
            let context = ProfileContext::load(global_profile)?;
            context.auth_service()?.reset_password(&email).await?;
            println!("If an account exists for {email}, a reset link is on its way.");
            Ok(())
        }
        AuthCommands::Status => {
            let context = ProfileContext::load(global_profile)?;
            if let Some(session) = context.restore_session().await? {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (expires_at={})",
                    context.name, email_label, session.expires_at
                );
            } else {
                println!("Profile '{}' is not signed in.", context.name);
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = profiles.resolve_profile_name(global_profile);
            let stored_session = load_stored_session(&profile_name)?;

            match (ProfileContext::load(global_profile), stored_session) {
                (Ok(context), Some(session)) => {
                    context.auth_service()?.sign_out(&session.access_token).await?;
                }
                _ => clear_stored_session(&profile_name)?,
            }

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
