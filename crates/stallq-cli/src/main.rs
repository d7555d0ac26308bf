use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stallq")]
#[command(about = "Stall ordering operator CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> overlays). Defaults apply when omitted.
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlays)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Create users, stalls and products
    Seed {
        #[command(subcommand)]
        cmd: SeedCmd,
    },

    /// Act on orders as a customer or owner
    Order {
        #[command(subcommand)]
        cmd: OrderCmd,
    },

    /// Show queues with ETA
    Queue {
        #[command(subcommand)]
        cmd: QueueCmd,
    },

    /// Token counters
    Token {
        #[command(subcommand)]
        cmd: TokenCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations. Guardrail: refuses while orders are pending/accepted unless --yes is provided.
    Migrate {
        /// Acknowledge you are migrating a DB with orders in the prep line.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SeedCmd {
    /// Register an owner together with their stall and its first product
    Owner {
        #[arg(long)]
        username: String,
        #[arg(long)]
        stall: String,
        #[command(flatten)]
        product: commands::seed::ProductArgs,
    },

    /// Register a customer account
    Customer {
        #[arg(long)]
        username: String,
    },

    /// Add a product to an owner's stall
    Product {
        #[arg(long)]
        owner_id: i64,
        #[command(flatten)]
        product: commands::seed::ProductArgs,
    },
}

#[derive(Subcommand)]
enum OrderCmd {
    /// Place an order (customer)
    Place {
        #[arg(long)]
        customer_id: i64,
        #[arg(long)]
        product_id: i64,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
    },

    /// Cancel a pending order (customer)
    Cancel {
        #[arg(long)]
        customer_id: i64,
        #[arg(long)]
        order_id: i64,
    },

    /// Move an order to accepted | rejected | ready (owner)
    Status {
        #[arg(long)]
        owner_id: i64,
        #[arg(long)]
        order_id: i64,
        #[arg(long)]
        status: String,
    },
}

#[derive(Subcommand)]
enum QueueCmd {
    /// The owner's stall queue
    Owner {
        #[arg(long)]
        owner_id: i64,
        /// Print JSON instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// A customer's order history
    Customer {
        #[arg(long)]
        customer_id: i64,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TokenCmd {
    /// Highest token issued for a stall (0 when none)
    Current {
        #[arg(long)]
        stall_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let cfg = commands::CliConfig::load(&cli.config_paths)?;

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => commands::db::status(&cfg).await?,
            DbCmd::Migrate { yes } => commands::db::migrate(&cfg, yes).await?,
        },

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = stallq_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Seed { cmd } => match cmd {
            SeedCmd::Owner {
                username,
                stall,
                product,
            } => commands::seed::owner(&cfg, &username, &stall, product).await?,
            SeedCmd::Customer { username } => commands::seed::customer(&cfg, &username).await?,
            SeedCmd::Product { owner_id, product } => {
                commands::seed::product(&cfg, owner_id, product).await?
            }
        },

        Commands::Order { cmd } => match cmd {
            OrderCmd::Place {
                customer_id,
                product_id,
                quantity,
            } => commands::order::place(&cfg, customer_id, product_id, quantity).await?,
            OrderCmd::Cancel {
                customer_id,
                order_id,
            } => commands::order::cancel(&cfg, customer_id, order_id).await?,
            OrderCmd::Status {
                owner_id,
                order_id,
                status,
            } => commands::order::status(&cfg, owner_id, order_id, &status).await?,
        },

        Commands::Queue { cmd } => match cmd {
            QueueCmd::Owner { owner_id, json } => {
                commands::queue::owner(&cfg, owner_id, json).await?
            }
            QueueCmd::Customer { customer_id, json } => {
                commands::queue::customer(&cfg, customer_id, json).await?
            }
        },

        Commands::Token { cmd } => match cmd {
            TokenCmd::Current { stall_id } => commands::queue::current_token(&cfg, stall_id).await?,
        },
    }

    Ok(())
}

/// Diagnostics go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
