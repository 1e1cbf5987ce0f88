//! Nutrilog CLI - diet tracking from the terminal
//!
//! A thin front-end over `nutrilog-api-client` with a file-backed
//! credential store, mainly used for backend smoke-testing and for logging
//! intake without reaching for the phone.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use nutrilog_api_client::endpoints::auth::Platform;
use nutrilog_api_client::endpoints::diet::{FoodEntry, RecordIntakeRequest, UnitType};
use nutrilog_api_client::{ClientConfig, NutrilogClient};
use nutrilog_core::credentials::{CredentialStore, FileCredentialStore, USER_INFO_KEY};
use nutrilog_core::token::UserProfile;
use owo_colors::OwoColorize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nutrilog")]
#[command(about = "Diet tracking from the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a Google ID token and persist the session
    Login {
        /// Google ID token obtained from the identity provider
        #[arg(long)]
        id_token: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the diet log for a day
    Log {
        /// Day to show (YYYY-MM-DD), defaults to today
        date: Option<String>,
    },

    /// Record one food intake
    Intake {
        /// Food name
        #[arg(long)]
        food: String,

        /// Quantity in the chosen unit
        #[arg(long)]
        quantity: f64,

        /// Unit: grams or servings
        #[arg(long, default_value = "grams")]
        unit: String,

        /// Day to log against (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Turn a free-text prompt into food proposals
    Prompt {
        /// What you ate, in plain words
        text: String,

        /// Day to log against (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Remove an intake entry by ID
    Remove {
        /// Intake entry ID
        id: i64,
    },

    /// Ingredient catalog operations
    #[command(subcommand)]
    Ingredient(IngredientCommands),

    /// Show which days of a month have intake recorded
    Calendar {
        /// Year (e.g. 2026)
        year: i32,
        /// Month (1-12)
        month: u32,
    },
}

#[derive(Subcommand)]
enum IngredientCommands {
    /// Search the catalog by name
    Search {
        /// Name to search for
        name: String,
        /// Result page
        #[arg(long, default_value = "1")]
        page: u32,
        /// Results per page
        #[arg(long, default_value = "10")]
        page_size: u32,
    },

    /// Show one ingredient
    Show {
        /// Ingredient ID
        id: i64,
    },

    /// List ingredients with similar names
    Similar {
        /// Name to compare against
        name: String,
    },

    /// Delete an ingredient
    Delete {
        /// Ingredient ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::open_default()?);
    let client = NutrilogClient::with_config(ClientConfig::from_env()?, Arc::clone(&store))
        .context("failed to build API client")?;

    match cli.command {
        Commands::Login { id_token } => run_login(&client, &id_token).await,
        Commands::Logout => run_logout(&client).await,
        Commands::Log { date } => run_log(&client, date).await,
        Commands::Intake {
            food,
            quantity,
            unit,
            date,
        } => run_intake(&client, food, quantity, &unit, date).await,
        Commands::Prompt { text, date } => run_prompt(&client, store.as_ref(), &text, date).await,
        Commands::Remove { id } => run_remove(&client, id).await,
        Commands::Ingredient(cmd) => run_ingredient(&client, cmd).await,
        Commands::Calendar { year, month } => run_calendar(&client, year, month).await,
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn parse_unit(unit: &str) -> Result<UnitType> {
    match unit.to_lowercase().as_str() {
        "grams" | "g" => Ok(UnitType::Grams),
        "servings" | "s" => Ok(UnitType::Servings),
        other => bail!("unknown unit '{other}', expected grams or servings"),
    }
}

async fn run_login(client: &NutrilogClient, id_token: &str) -> Result<()> {
    let response = client.auth().google_sign_in(id_token, Platform::Other).await?;
    println!(
        "{} signed in as {} <{}>",
        "ok:".green().bold(),
        response.name,
        response.email
    );
    Ok(())
}

async fn run_logout(client: &NutrilogClient) -> Result<()> {
    client.auth().sign_out().await;
    println!("{} session cleared", "ok:".green().bold());
    Ok(())
}

async fn run_log(client: &NutrilogClient, date: Option<String>) -> Result<()> {
    let date = date.unwrap_or_else(today);
    let log = client.diet().log(&date).await?;

    println!(
        "{} {} | intake {:.0} kcal / consumption {:.0} kcal",
        log.log_date.bold(),
        if log.intake <= log.consumption {
            "on target".green().to_string()
        } else {
            "over".red().to_string()
        },
        log.intake,
        log.consumption
    );
    for food in &log.intake_foods {
        println!(
            "  #{:<5} {:<30} {:>7.1} {:?} {:>7.0} kcal{}",
            food.id,
            food.name,
            food.quantity,
            food.unit_type,
            food.calories,
            if food.added_by_ai { "  (ai)" } else { "" }
        );
    }
    Ok(())
}

async fn run_intake(
    client: &NutrilogClient,
    food: String,
    quantity: f64,
    unit: &str,
    date: Option<String>,
) -> Result<()> {
    let request = RecordIntakeRequest::new(date.unwrap_or_else(today)).with_food(FoodEntry {
        brand: None,
        food_name: food,
        unit_type: parse_unit(unit)?,
        quantity,
    });

    let log = client.diet().record_intake(&request).await?;
    println!(
        "{} recorded; day now at {:.0} kcal",
        "ok:".green().bold(),
        log.intake
    );
    Ok(())
}

async fn run_prompt(
    client: &NutrilogClient,
    store: &dyn CredentialStore,
    text: &str,
    date: Option<String>,
) -> Result<()> {
    let profile: UserProfile = match store.get(USER_INFO_KEY).await? {
        Some(blob) => serde_json::from_str(&blob).context("stored profile is unreadable")?,
        None => bail!("not signed in; run `nutrilog login` first"),
    };

    let date = date.unwrap_or_else(today);
    let proposal = client
        .diet()
        .intake_from_prompt(&profile.google_id, text, Some(&date))
        .await?;

    println!("proposed foods (round {}):", proposal.unique_id);
    for food in &proposal.foods {
        println!(
            "  {:<30} {:>7} {:?}",
            food.food_name,
            food.quantity
                .as_f64()
                .map_or_else(|| "?".to_string(), |q| format!("{q:.1}")),
            food.unit_type
        );
    }
    println!("record with `nutrilog intake` once confirmed");
    Ok(())
}

async fn run_remove(client: &NutrilogClient, id: i64) -> Result<()> {
    client.diet().remove_intake(id).await?;
    println!("{} intake #{id} removed", "ok:".green().bold());
    Ok(())
}

async fn run_ingredient(client: &NutrilogClient, cmd: IngredientCommands) -> Result<()> {
    match cmd {
        IngredientCommands::Search {
            name,
            page,
            page_size,
        } => {
            let result = client.ingredient().list(&name, page, page_size).await?;
            println!(
                "page {}/{} ({} total)",
                result.current_page, result.total_pages, result.total_count
            );
            for ingredient in &result.ingredients {
                println!(
                    "  #{:<5} {:<30} {:>7.0} kcal  {}",
                    ingredient.id,
                    ingredient.name,
                    ingredient.calories,
                    ingredient.brand.dimmed()
                );
            }
        }
        IngredientCommands::Show { id } => {
            let ingredient = client.ingredient().get(id).await?;
            println!("{} ({})", ingredient.name.bold(), ingredient.brand);
            println!(
                "  per 100g: {:.0} kcal / {:.1}g protein / {:.1}g fat / {:.1}g carbs",
                ingredient.calories, ingredient.protein, ingredient.fat, ingredient.carbohydrates
            );
            println!(
                "  per serving ({:.0}g): {:.0} kcal",
                ingredient.serving_size_grams, ingredient.serving_calories
            );
        }
        IngredientCommands::Similar { name } => {
            for hit in client.ingredient().similar(&name).await? {
                println!("  #{:<5} {:<30} {:>7.0} kcal", hit.id, hit.name, hit.calories);
            }
        }
        IngredientCommands::Delete { id } => {
            client.ingredient().delete(id).await?;
            println!("{} ingredient #{id} deleted", "ok:".green().bold());
        }
    }
    Ok(())
}

async fn run_calendar(client: &NutrilogClient, year: i32, month: u32) -> Result<()> {
    let result = client.diet().dates_with_intake(year, month).await?;
    if result.dates.is_empty() {
        println!("no intake recorded in {year}-{month:02}");
    } else {
        for date in &result.dates {
            println!("  {date}");
        }
    }
    Ok(())
}
