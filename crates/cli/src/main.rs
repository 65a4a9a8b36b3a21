//! Shopfront CLI - browse the catalog, manage the cart, check out and view
//! orders against a storefront backend.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and export the printed session variables
//! eval "$(sf-cli login -e asha@example.com -p 'Sunflower#42')"
//!
//! # Browse
//! sf-cli products list --category bags --page 2
//! sf-cli products show 65f1c0ffee
//!
//! # Cart
//! sf-cli cart add 65f1c0ffee -q 2
//! sf-cli cart update 65f1c0ffee 3
//! sf-cli cart show
//!
//! # Checkout writes a page that posts to the payment gateway
//! sf-cli checkout --first-name Asha --last-name Rao --email asha@example.com \
//!     --phone 9876543210 --address "12 MG Road" --city Bengaluru \
//!     --state Karnataka --postal-code 560001
//!
//! # Orders
//! sf-cli order show 66a0b1
//! sf-cli order invoice 66a0b1 -o invoice.pdf
//! ```
//!
//! # Configuration
//!
//! `SHOPFRONT_API_BASE_URL` points at the backend. A session is supplied through
//! `SHOPFRONT_ACCESS_TOKEN`, `SHOPFRONT_EMAIL` and `SHOPFRONT_USER_ID`, as
//! printed by `login`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use shopfront_client::checkout::CheckoutForm;
use shopfront_client::session::{Credentials, SessionStore};
use shopfront_client::{AppState, ClientConfig};
use shopfront_core::{CategoryFilter, Email, UserId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;
use commands::cart::CartAction;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Shopfront storefront CLI")]
struct Cli {
    /// Access token from `login`
    #[arg(long, global = true, env = "SHOPFRONT_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Email of the signed-in account
    #[arg(long, global = true, env = "SHOPFRONT_EMAIL")]
    session_email: Option<String>,

    /// Backend user id of the signed-in account
    #[arg(long, global = true, env = "SHOPFRONT_USER_ID")]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and print the session variables
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Place an order for the cart and prepare payment
    Checkout(CheckoutArgs),
    /// View orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List a page of products
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Products per page
        #[arg(long, default_value_t = shopfront_client::api::PRODUCTS_PER_PAGE)]
        limit: u32,

        /// Category (`all`, `clothing`, `accessories`, `shoes`, `bags`)
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum CartCommand {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product id
        product_id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity; zero or less removes it
    Update {
        /// Product id
        product_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product
    Remove {
        /// Product id
        product_id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(clap::Args)]
struct CheckoutArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    /// Contact email
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    /// Street address
    #[arg(long)]
    address: String,
    /// Apartment, suite, etc.
    #[arg(long)]
    apartment: Option<String>,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    postal_code: String,
    /// Defaults to the configured country
    #[arg(long)]
    country: Option<String>,

    /// Where to write the payment redirect page
    #[arg(short, long, default_value = "payment_redirect.html")]
    output: PathBuf,
}

impl CheckoutArgs {
    fn form(&self) -> CheckoutForm {
        CheckoutForm {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            apartment: self.apartment.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

#[derive(Subcommand)]
enum OrderAction {
    /// Show an order
    Show {
        /// Order id
        id: String,
    },
    /// Download an order's invoice
    Invoice {
        /// Order id
        id: String,

        /// Output file (defaults to `invoice-<id>.pdf`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load .env before parsing so env-backed arguments see it
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Failed to load configuration: {e}");
            }
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_client=info,sf_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Session from the global arguments; signed out when no token is given.
fn session_from_args(cli: &Cli) -> Result<SessionStore, CommandError> {
    let Some(token) = &cli.token else {
        return Ok(SessionStore::new());
    };
    let (Some(email), Some(user_id)) = (&cli.session_email, &cli.user_id) else {
        return Err(CommandError::IncompleteSession);
    };

    Ok(SessionStore::with_credentials(Credentials {
        access_token: SecretString::from(token.clone()),
        user_id: UserId::new(user_id.clone()),
        email: Email::parse(email)?,
    }))
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CommandError> {
    let session = session_from_args(&cli)?;
    let state = AppState::with_session(config, session)?;

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => commands::auth::register(&state, &name, &email, &password).await?,
        Commands::Login { email, password } => {
            commands::auth::login(&state, &email, &password).await?;
        }
        Commands::Products { action } => match action {
            ProductAction::List {
                page,
                limit,
                category,
                search,
            } => commands::catalog::list(&state, page, limit, category, search).await?,
            ProductAction::Show { id } => commands::catalog::show(&state, &id).await?,
        },
        Commands::Cart { action } => {
            let action = match action {
                CartCommand::Show => CartAction::Show,
                CartCommand::Add {
                    product_id,
                    quantity,
                } => CartAction::Add {
                    product_id,
                    quantity,
                },
                CartCommand::Update {
                    product_id,
                    quantity,
                } => CartAction::Update {
                    product_id,
                    quantity,
                },
                CartCommand::Remove { product_id } => CartAction::Remove { product_id },
                CartCommand::Clear => CartAction::Clear,
            };
            commands::cart::run(&state, action).await?;
        }
        Commands::Checkout(args) => {
            commands::checkout::run(&state, &args.form(), &args.output).await?;
        }
        Commands::Order { action } => match action {
            OrderAction::Show { id } => commands::orders::show(&state, &id).await?,
            OrderAction::Invoice { id, output } => {
                commands::orders::invoice(&state, &id, output).await?;
            }
        },
    }
    Ok(())
}
