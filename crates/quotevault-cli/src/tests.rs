use chrono::{TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use quotevault_core::{Palette, Quote, QuoteCategory, QuoteId, QuoteSummary, ThemeMode};

use crate::cli::{CategoryArg, Cli, CollectionCommands, Commands, CompletionShell, ThemeArg};
use crate::commands::common::{format_quote_line, format_summary_line, parse_quote_id, preview};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::merge_profile;
use crate::commands::export::resolve_pictures_dir;
use crate::commands::theme::describe_palette;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

fn quote() -> Quote {
    Quote {
        id: QuoteId::new("q1").unwrap(),
        text: "The obstacle is the way.".to_string(),
        author: "Marcus Aurelius".to_string(),
        category: QuoteCategory::Wisdom,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[test]
fn no_subcommand_parses_to_daily_default() {
    let cli = Cli::try_parse_from(["quotevault"]).unwrap();
    assert!(cli.command.is_none());
    assert!(cli.profile.is_none());
}

#[test]
fn feed_accepts_repeated_categories_and_global_profile() {
    let cli = Cli::try_parse_from([
        "quotevault",
        "feed",
        "--category",
        "love",
        "-c",
        "humor",
        "--pages",
        "3",
        "--profile",
        "work",
    ])
    .unwrap();

    assert_eq!(cli.profile.as_deref(), Some("work"));
    match cli.command {
        Some(Commands::Feed {
            pages,
            category,
            json,
        }) => {
            assert_eq!(pages, 3);
            assert_eq!(category, vec![CategoryArg::Love, CategoryArg::Humor]);
            assert!(!json);
        }
        _ => panic!("expected feed command"),
    }
}

#[test]
fn unknown_category_is_rejected() {
    assert!(Cli::try_parse_from(["quotevault", "feed", "--category", "poetry"]).is_err());
}

#[test]
fn export_backdrop_conflicts_with_background() {
    let result = Cli::try_parse_from([
        "quotevault",
        "export",
        "--backdrop",
        "dawn.jpg",
        "--background",
        "./local.png",
    ]);
    assert!(result.is_err());
}

#[test]
fn collections_create_joins_name_words() {
    let cli = Cli::try_parse_from(["quotevault", "collections", "create", "Morning", "Fuel"]).unwrap();
    match cli.command {
        Some(Commands::Collections {
            command: CollectionCommands::Create { name },
        }) => assert_eq!(name.join(" "), "Morning Fuel"),
        _ => panic!("expected collections create"),
    }
}

#[test]
fn category_arg_maps_to_core_category() {
    assert_eq!(QuoteCategory::from(CategoryArg::Motivation), QuoteCategory::Motivation);
    assert_eq!(QuoteCategory::from(CategoryArg::Humor), QuoteCategory::Humor);
}

#[test]
fn theme_arg_applies_relative_to_current() {
    assert_eq!(ThemeArg::Toggle.apply(ThemeMode::Light), ThemeMode::Dark);
    assert_eq!(ThemeArg::Toggle.apply(ThemeMode::Dark), ThemeMode::Light);
    assert_eq!(ThemeArg::Light.apply(ThemeMode::Dark), ThemeMode::Light);
}

#[test]
fn describe_palette_lists_hex_colors() {
    assert_eq!(
        describe_palette(&Palette::DARK),
        "background #0F172A  text #F8FAFC  primary #818CF8  card #1E293B"
    );
}

#[test]
fn preview_collapses_whitespace_and_truncates() {
    assert_eq!(preview("  one\n two  ", 20), "one two");
    assert_eq!(preview("abcdefghij", 6), "abc...");
    assert_eq!(preview("žluťoučký kůň", 8), "žluťo...");
}

#[test]
fn quote_lines_show_like_marker_and_category() {
    let line = format_quote_line(&quote(), true);
    assert!(line.starts_with('\u{2665}'));
    assert!(line.contains("q1"));
    assert!(line.contains("\u{2014} Marcus Aurelius [Wisdom]"));

    let summary = QuoteSummary {
        id: QuoteId::new("q2").unwrap(),
        text: "Less is more.".to_string(),
        author: "Mies".to_string(),
    };
    assert_eq!(format_summary_line(&summary), "q2  \"Less is more.\" \u{2014} Mies");
}

#[test]
fn parse_quote_id_rejects_blank() {
    assert!(matches!(parse_quote_id("  "), Err(CliError::InvalidInput(_))));
    assert_eq!(parse_quote_id(" q9 ").unwrap().as_str(), "q9");
}

#[test]
fn merge_profile_keeps_existing_values_and_validates_url() {
    let existing = CliProfile {
        supabase_url: Some("https://old.supabase.co".to_string()),
        supabase_anon_key: Some("old-key".to_string()),
        backdrop_bucket: None,
        theme: Some(ThemeMode::Dark),
    };

    let merged = merge_profile(
        existing.clone(),
        None,
        Some(" new-key ".to_string()),
        Some("wallpapers".to_string()),
    )
    .unwrap();
    assert_eq!(merged.supabase_url.as_deref(), Some("https://old.supabase.co"));
    assert_eq!(merged.supabase_anon_key.as_deref(), Some("new-key"));
    assert_eq!(merged.backdrop_bucket.as_deref(), Some("wallpapers"));
    assert_eq!(merged.theme, Some(ThemeMode::Dark));

    let error = merge_profile(existing, Some("old.supabase.co".to_string()), None, None);
    assert!(matches!(error, Err(CliError::Config(_))));

    let partial = merge_profile(
        CliProfile::default(),
        Some("ftp://host".to_string()),
        None,
        None,
    );
    assert!(partial.is_err());
}

#[test]
fn explicit_output_dir_wins() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(resolve_pictures_dir(Some(dir.path())).unwrap(), dir.path());
}

#[test]
fn completions_are_generated_for_binary_name() {
    let bash = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(bash.contains("quotevault"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotevault.fish");
    run_completions(CompletionShell::Fish, Some(&path)).unwrap();
    assert!(std::fs::read_to_string(path).unwrap().contains("quotevault"));
}
