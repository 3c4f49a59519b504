//! farm-records - paged, owner-scoped views over a farm's records.

mod cli;

use cli::{Cli, Command};
use farm_records::app::AppContext;
use farm_records::config::Config;
use farm_records::db;
use farm_records::error::{FarmError, Result};
use farm_records::logging;
use farm_records::registry::Route;
use farm_records::router::{Request, Response, RouterActor, RouterHandle};
use farm_records::session::Credentials;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}", failure_message(&e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let (route, page_number) = match &cli.command {
        Command::Routes => {
            for route in Route::ALL {
                println!("{route}");
            }
            return Ok(());
        }
        Command::List { route, page } => (*route, *page),
    };

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    if let Some(page_size) = cli.page_size {
        if page_size <= 0 {
            return Err(FarmError::InvalidPageSize(page_size));
        }
        config.app.page_size = page_size;
    }

    let credentials = credentials(&cli)?;
    let database = cli.resolve_database(&config)?;
    info!("Connection: {}", database.display_string());

    let client = db::connect(&database, config.app.query_timeout()).await?;
    let ctx = AppContext::new(Arc::from(client), config.app.clone());
    let (router, task) = RouterActor::spawn(ctx);

    let outcome = list_page(&router, credentials, route, page_number).await;

    router.shutdown().await?;
    if let Err(e) = task.await {
        error!("Router task failed: {e}");
    }

    let page = outcome?;
    let json = serde_json::to_string_pretty(&page)
        .map_err(|e| FarmError::internal(format!("Failed to serialize page: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Programmer and deployment mistakes are flagged so they are not read as bad input.
fn failure_message(e: &FarmError) -> String {
    if e.is_programmer_error() {
        format!("{}: {} (internal error)", e.category(), e)
    } else {
        format!("{}: {}", e.category(), e)
    }
}

fn credentials(cli: &Cli) -> Result<Credentials> {
    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => Ok(Credentials::new(email, password)),
        (None, _) => Err(FarmError::auth("--email is required to list records")),
        (_, None) => Err(FarmError::auth(
            "A password is required (set FARM_PASSWORD or pass --password)",
        )),
    }
}

async fn list_page(
    router: &RouterHandle,
    credentials: Credentials,
    route: Route,
    page_number: i64,
) -> Result<Response> {
    router.send(Request::SignIn(credentials)).await?;
    router.send(Request::Page { route, page_number }).await
}
