mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use cozeats_api::HttpBackend;
use cozeats_core::{
    AppContext, FileStore, MealType, MealUpdate, MemoryStore, SharedStore, ThemeOption,
    config::{self, CozeatsConfig},
};
use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::commands::parse_day;

#[derive(Parser)]
#[command(name = "cozeats")]
#[command(about = "Plan meals and share a grocery list with your household")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Storage file path (overrides config)
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Backend base URL (overrides config and COZEATS_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Signup {
        name: String,
        email: String,
        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in to an existing account
    Login {
        email: String,
        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the selected group
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Profile management
    Profile {
        #[command(subcommand)]
        cmd: ProfileCommands,
    },
    /// Household groups
    Group {
        #[command(subcommand)]
        cmd: GroupCommands,
    },
    /// Meal calendar of the selected group
    Meal {
        #[command(subcommand)]
        cmd: MealCommands,
    },
    /// Shared grocery list of the selected group
    Grocery {
        #[command(subcommand)]
        cmd: GroceryCommands,
    },
    /// Theme preference
    Theme {
        #[command(subcommand)]
        cmd: ThemeCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Show meals and groceries, following group switches until Ctrl-C
    Watch {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        /// Also refetch every N seconds to pick up edits by other members
        #[arg(long)]
        refresh: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Change your display name
    Rename { name: String },
    /// Change your password (prompts for current and new)
    Password,
}

#[derive(Subcommand)]
enum GroupCommands {
    /// List your groups
    List,
    /// Make another group the selected one
    Switch { group: String },
    /// Create a group with you as admin
    Create { name: String },
    /// Join a group with an invite code
    Join { code: String },
    /// Show members of the selected group
    Info,
    /// Create an invite code for the selected group
    Invite,
}

#[derive(Args)]
struct DayArg {
    /// Day (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<String>,
}

#[derive(Subcommand)]
enum MealCommands {
    /// List a day's meals
    List {
        #[command(flatten)]
        day: DayArg,
    },
    /// Plan a meal
    Add {
        name: String,
        /// breakfast, lunch or dinner
        #[arg(long = "type", short = 't')]
        meal_type: MealType,
        #[command(flatten)]
        day: DayArg,
    },
    /// Change a planned meal
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type", short = 't')]
        meal_type: Option<MealType>,
        /// Move the meal to another day
        #[arg(long)]
        move_to: Option<String>,
        #[command(flatten)]
        day: DayArg,
    },
    /// Delete a planned meal
    Delete {
        id: String,
        #[command(flatten)]
        day: DayArg,
    },
}

#[derive(Subcommand)]
enum GroceryCommands {
    /// Show the list
    List,
    /// Add an item
    Add { item: String },
    /// Check an item off
    Done { id: String },
    /// Remove an item
    Remove { id: String },
    /// Remove every item
    Clear,
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// Show the current preference
    Show,
    /// Set the preference: light, dark or system
    Set { option: ThemeOption },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Save current configuration to file
    Save {
        /// Path to save configuration
        #[arg(default_value = "cozeats.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("cozeats_core=debug,cozeats_api=debug,cozeats_cli=debug,warn")
        } else {
            EnvFilter::new("cozeats_core=info,cozeats_api=info,cozeats_cli=info,warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        info!("Loading config from standard locations");
        config::load_config_from_standard_locations().await?
    };

    // Environment first, then flags
    config.apply_env();
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = &cli.storage {
        config.storage.path = Some(path.clone());
    }
    tracing::debug!("Using config: {:?}", config);

    if let Commands::Config { cmd } = &cli.command {
        return match cmd {
            ConfigCommands::Show => commands::config::show(&config).await,
            ConfigCommands::Save { path } => commands::config::save(&config, path).await,
        };
    }

    let ctx = build_context(&config, cli.ephemeral).await?;

    match cli.command {
        Commands::Signup {
            name,
            email,
            password,
        } => commands::auth::signup(&ctx, &name, &email, password).await?,
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, password).await?
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Profile { cmd } => match cmd {
            ProfileCommands::Rename { name } => commands::auth::rename(&ctx, &name).await?,
            ProfileCommands::Password => commands::auth::change_password(&ctx).await?,
        },
        Commands::Group { cmd } => match cmd {
            GroupCommands::List => commands::group::list(&ctx).await?,
            GroupCommands::Switch { group } => commands::group::switch(&ctx, &group).await?,
            GroupCommands::Create { name } => commands::group::create(&ctx, &name).await?,
            GroupCommands::Join { code } => commands::group::join(&ctx, &code).await?,
            GroupCommands::Info => commands::group::info(&ctx).await?,
            GroupCommands::Invite => commands::group::invite(&ctx).await?,
        },
        Commands::Meal { cmd } => match cmd {
            MealCommands::List { day } => {
                commands::meal::list(&ctx, parse_day(day.date.as_deref())?).await?
            }
            MealCommands::Add {
                name,
                meal_type,
                day,
            } => {
                let date = parse_day(day.date.as_deref())?;
                commands::meal::add(&ctx, &name, meal_type, date).await?
            }
            MealCommands::Edit {
                id,
                name,
                meal_type,
                move_to,
                day,
            } => {
                let update = MealUpdate {
                    name,
                    meal_type,
                    date: move_to.as_deref().map(|d| parse_day(Some(d))).transpose()?,
                };
                let date = parse_day(day.date.as_deref())?;
                commands::meal::edit(&ctx, &id, date, update).await?
            }
            MealCommands::Delete { id, day } => {
                commands::meal::delete(&ctx, &id, parse_day(day.date.as_deref())?).await?
            }
        },
        Commands::Grocery { cmd } => match cmd {
            GroceryCommands::List => commands::grocery::list(&ctx).await?,
            GroceryCommands::Add { item } => commands::grocery::add(&ctx, &item).await?,
            GroceryCommands::Done { id } => commands::grocery::done(&ctx, &id).await?,
            GroceryCommands::Remove { id } => commands::grocery::remove(&ctx, &id).await?,
            GroceryCommands::Clear => commands::grocery::clear(&ctx).await?,
        },
        Commands::Theme { cmd } => match cmd {
            ThemeCommands::Show => commands::theme::show(&ctx).await?,
            ThemeCommands::Set { option } => commands::theme::set(&ctx, option).await?,
        },
        Commands::Watch { date, refresh } => {
            let date = parse_day(date.as_deref())?;
            let refresh = refresh.filter(|s| *s > 0).map(Duration::from_secs);
            commands::watch::run(&ctx, date, refresh).await?
        }
        // Handled before the context is built
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn build_context(config: &CozeatsConfig, ephemeral: bool) -> Result<AppContext> {
    let store: SharedStore = if ephemeral {
        info!("Using in-memory storage");
        Arc::new(MemoryStore::new())
    } else {
        let path = config.storage.resolved_path();
        info!("Using storage file {}", path.display());
        Arc::new(FileStore::new(path))
    };

    let backend = HttpBackend::new(&config.api.base_url, config.api.timeout())?;
    info!("Using backend {}", backend.base_url());

    Ok(AppContext::init(store, Arc::new(backend), config).await?)
}
