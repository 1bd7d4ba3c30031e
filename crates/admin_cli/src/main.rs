use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{Caller, Engine, Role};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "echo_shop_admin")]
#[command(about = "Operator utilities for ECHO SHOP (bootstrap, balance and status repair)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./echo_shop.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Applies pending migrations and exits.
    Migrate,
    Company(Company),
    User(User),
    /// Rebuilds every account balance of a company from its transactions.
    Recompute {
        #[arg(long)]
        company: Uuid,
    },
    /// Repairs an equipment status left behind by an interrupted operation.
    Reconcile {
        #[arg(long)]
        company: Uuid,
        #[arg(long)]
        equipment: Uuid,
    },
}

#[derive(Args, Debug)]
struct Company {
    #[command(subcommand)]
    command: CompanyCommand,
}

#[derive(Subcommand, Debug)]
enum CompanyCommand {
    Create(CompanyCreateArgs),
}

#[derive(Args, Debug)]
struct CompanyCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    tax_id: Option<String>,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Owner,
    Editor,
    Viewer,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Owner => Role::Owner,
            RoleArg::Editor => Role::Editor,
            RoleArg::Viewer => Role::Viewer,
        }
    }
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long, value_enum, default_value = "editor")]
    role: RoleArg,
    /// Company the user belongs to; repeat for several.
    #[arg(long = "company", required = true)]
    companies: Vec<Uuid>,
    /// Bearer token; a random one is generated when omitted.
    #[arg(long)]
    token: Option<String>,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Migrate => println!("database is up to date"),
        Command::Company(Company {
            command: CompanyCommand::Create(args),
        }) => {
            let company = engine
                .new_company(&args.name, args.tax_id.as_deref())
                .await?;
            println!("created company: {} ({})", company.name, company.id);
        }
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let token = args
                .token
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
            let user_id = engine
                .new_user(
                    &args.email,
                    &args.name,
                    &token,
                    args.role.into(),
                    &args.companies,
                )
                .await?;
            println!("created user: {} ({user_id})", args.email);
            println!("api token: {token}");
        }
        Command::Recompute { company } => {
            let corrections = engine
                .recompute(&Caller::operator(company), company)
                .await?;
            if corrections.is_empty() {
                println!("all balances match the transaction log");
            }
            for correction in corrections {
                println!(
                    "account {}: {} -> {}",
                    correction.account_id, correction.before, correction.after
                );
            }
        }
        Command::Reconcile { company, equipment } => {
            let outcome = engine
                .reconcile(&Caller::operator(company), equipment)
                .await?;
            if outcome.changed {
                println!(
                    "equipment {equipment}: {} -> {}",
                    outcome.previous.as_str(),
                    outcome.current.as_str()
                );
            } else {
                println!(
                    "equipment {equipment}: {} (unchanged)",
                    outcome.current.as_str()
                );
            }
        }
    }

    Ok(())
}
