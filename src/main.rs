use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use folio_theme::a11y::{self, EnvMotion};
use folio_theme::apply::MemoryRoot;
use folio_theme::config::load_app_config;
use folio_theme::ssr::{prepaint_script, RootAttributes};
use folio_theme::storage::FileStore;
use folio_theme::system::{EnvColorScheme, StaticColorScheme};
use folio_theme::ui::resolve_color_tokens;
use folio_theme::{logging, AppError, ResolvedTheme, ThemeEnvironment, ThemePreference};

#[derive(Debug, Parser)]
#[command(name = "folio-theme", version, about = "Inspect and change the folio site theme")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the stored preference and the theme it resolves to
    Get,
    /// Store a preference: light, dark or system
    Set { preference: String },
    /// Resolve the stored preference against a system signal
    Resolve {
        /// Override the detected system signal (light or dark)
        #[arg(long)]
        system: Option<String>,
    },
    /// WCAG contrast ratio between two #RRGGBB colors
    Contrast {
        foreground: String,
        background: String,
        /// Use large-text thresholds
        #[arg(long)]
        large: bool,
    },
    /// Check a theme palette (with configured overrides) against WCAG AA
    Validate {
        #[arg(default_value = "dark")]
        theme: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the inline pre-paint script for the configured storage key
    Script,
    /// Print root element attributes for the current theme
    Attrs,
}

fn environment(system: Option<ResolvedTheme>) -> ThemeEnvironment {
    let mut environment = ThemeEnvironment::headless()
        .with_motion(EnvMotion)
        .with_root(MemoryRoot::new());
    environment = match system {
        Some(signal) => environment.with_color_scheme(StaticColorScheme(signal)),
        None => environment.with_color_scheme(EnvColorScheme),
    };
    match FileStore::with_default_path() {
        Ok(store) => environment.with_store(store),
        Err(err) => {
            tracing::warn!(%err, "no preference file location; running without storage");
            environment
        }
    }
}

fn parse_theme(raw: &str) -> Result<ResolvedTheme, AppError> {
    Ok(raw.parse::<ResolvedTheme>()?)
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Get => {
            let controller = folio_theme::start(environment(None));
            let state = controller.state();
            println!("preference: {}", state.preference);
            println!("resolved:   {}", state.resolved);
            if let Some(kind) = state.last_error {
                println!("last error: {kind}");
            }
        }
        Command::Set { preference } => {
            let preference: ThemePreference = preference
                .parse()
                .map_err(AppError::from)
                .context("refusing to store preference")?;
            let controller = folio_theme::start(environment(None));
            let resolved = controller.set_preference(preference);
            println!("{preference} -> {resolved}");
        }
        Command::Resolve { system } => {
            let signal = system.as_deref().map(parse_theme).transpose()?;
            let controller = folio_theme::start(environment(signal));
            println!("{}", controller.resolved());
        }
        Command::Contrast {
            foreground,
            background,
            large,
        } => {
            let ratio = a11y::contrast_ratio(&foreground, &background).map_err(AppError::from)?;
            println!("ratio: {ratio:.2}:1");
            println!("AA:    {}", a11y::ratio_meets_aa(ratio, large));
            println!("AAA:   {}", a11y::ratio_meets_aaa(ratio, large));
        }
        Command::Validate { theme, json } => {
            let theme = parse_theme(&theme)?;
            let config = load_app_config();
            let tokens = resolve_color_tokens(theme, config.colors.as_ref());
            let report = a11y::validate_palette(&tokens);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (pair, ratio) in &report.ratios {
                    println!("{pair:<28} {ratio:>6.2}");
                }
            }
            if !report.is_valid {
                bail!(
                    "{theme} palette has {} pair(s) below WCAG AA",
                    report.violations.len()
                );
            }
        }
        Command::Script => {
            let settings = load_app_config().settings();
            println!("{}", prepaint_script(&settings.storage_key));
        }
        Command::Attrs => {
            let controller = folio_theme::start(environment(None));
            println!("{}", RootAttributes::for_theme(controller.resolved()).to_html());
        }
    }

    Ok(())
}
