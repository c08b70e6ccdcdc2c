mod cli;
mod config;

use std::process;

use catalog_domain::adapters::memory_repo::InMemoryProductRepo;
use catalog_domain::service::CatalogService;
use catalog_domain::{CoreError, Product, ProductId, ProductRepository};
use serde_json::json;
use sqlite_adapter::{create_database, SqliteProductRepo};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Command;

// Repo abstraction over the storage providers selectable by config.
enum AnyRepo {
    Memory(InMemoryProductRepo),
    Sqlite(SqliteProductRepo),
}

impl AnyRepo {
    fn from_config(cfg: &config::Config) -> Result<Self, CoreError> {
        match cfg.storage_provider {
            config::StorageProvider::Memory => Ok(Self::Memory(InMemoryProductRepo::new())),
            config::StorageProvider::Sqlite => {
                Ok(Self::Sqlite(SqliteProductRepo::new(cfg.sqlite.clone())?))
            }
        }
    }

    fn inner(&self) -> &dyn ProductRepository {
        match self {
            AnyRepo::Memory(r) => r,
            AnyRepo::Sqlite(r) => r,
        }
    }
}

impl ProductRepository for AnyRepo {
    fn add_product(&self, product: Product) -> Result<(), CoreError> {
        self.inner().add_product(product)
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, CoreError> {
        self.inner().get_product(id)
    }

    fn list_products(&self) -> Result<Vec<Product>, CoreError> {
        self.inner().list_products()
    }

    fn list_categories(&self) -> Result<Vec<String>, CoreError> {
        self.inner().list_categories()
    }

    fn list_by_category(&self, category: &str) -> Result<Vec<Product>, CoreError> {
        self.inner().list_by_category(category)
    }

    fn update_product(&self, product: &Product) -> Result<(), CoreError> {
        self.inner().update_product(product)
    }

    fn delete_product(&self, product: &Product) -> Result<(), CoreError> {
        self.inner().delete_product(product)
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout carries only command output.
    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

fn execute(cfg: &config::Config, command: Command) -> Result<serde_json::Value, String> {
    if command == Command::Init {
        create_database(&cfg.sqlite.path).map_err(|e| format!("init failed: {}", e))?;
        return Ok(json!({ "initialized": cfg.sqlite.path.display().to_string() }));
    }

    let repo = AnyRepo::from_config(cfg).map_err(|e| format!("failed to open store: {}", e))?;
    let svc = CatalogService::new(repo);
    run_command(&svc, command).map_err(|e| e.to_string())
}

fn run_command<R: ProductRepository>(
    svc: &CatalogService<R>,
    command: Command,
) -> Result<serde_json::Value, CoreError> {
    let value = match command {
        Command::Add(input) => json!(svc.create(input)?),
        Command::Get(id) => json!(svc.get(id)?.ok_or(CoreError::NotFound)?),
        Command::List => json!(svc.list()?),
        Command::Categories => json!(svc.categories()?),
        Command::Category(name) => json!(svc.by_category(&name)?),
        Command::Update(id, changes) => json!(svc.update(id, changes)?),
        Command::Delete(id) => json!(svc.remove(id)?),
        Command::Init | Command::Help => serde_json::Value::Null,
    };
    Ok(value)
}

fn main() {
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let command = match cli::parse_command(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            eprintln!("{}\n\n{}", catalog_domain::about(), cli::USAGE);
            return;
        }
        Ok(c) => c,
        Err(msg) => {
            eprintln!("error: {}\n\n{}", msg, cli::USAGE);
            process::exit(2);
        }
    };
    debug!(?command, "running command");

    match execute(&cfg, command) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                error!(error = %e, "failed to render output");
                process::exit(1);
            }
        },
        Err(msg) => {
            eprintln!("error: {}", msg);
            process::exit(1);
        }
    }
}
