use std::path::Path;

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::Serialize;
use switchyard::{
    config::{
        RouterConfig, RouterConfigValidator,
        loader::{load_config, load_config_unchecked},
    },
    core::{MatchedRoute, Params, RouterBuilder, router::parse_method},
    tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate a route configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
    },
    /// Write a starter route configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
    },
    /// Resolve a method and path against a configuration
    Resolve {
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
        /// Request method, e.g. GET
        #[clap(short, long, default_value = "GET")]
        method: String,
        /// Request path, e.g. /users/42
        path: String,
    },
    /// List every registered route
    Routes {
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
    },
}

#[derive(Serialize)]
struct Resolution {
    route: MatchedRoute,
    params: Params,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    switchyard::metrics::init_metrics()?;

    let args = Args::parse();

    match args.command {
        Commands::Validate { config } => validate_config_command(&config).await,
        Commands::Init { config } => init_config_command(&config).await,
        Commands::Resolve {
            config,
            method,
            path,
        } => resolve_command(&config, &method, &path).await,
        Commands::Routes { config } => routes_command(&config).await,
    }
}

async fn load_checked(config_path: &str) -> Result<RouterConfig> {
    let config = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    tracing_setup::init_from_config(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    Ok(config)
}

/// Resolve one request line and print the match as JSON
async fn resolve_command(config_path: &str, method: &str, path: &str) -> Result<()> {
    let config = load_checked(config_path).await?;
    let (builder, _) = RouterBuilder::from_config(&config)?;
    let router = builder.build();

    let method = parse_method(method)?;
    let found = router.resolve(&method, path)?;
    let resolution = Resolution {
        route: found.route().describe(),
        params: found.params().clone(),
    };

    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

/// Print every registered route as JSON, ordered by method then template
async fn routes_command(config_path: &str) -> Result<()> {
    let config = load_checked(config_path).await?;
    let (builder, _) = RouterBuilder::from_config(&config)?;
    let table = builder.build().table();

    let mut routes: Vec<MatchedRoute> = table.routes().map(|route| route.describe()).collect();
    routes.sort_by(|a, b| (&a.method, &a.template).cmp(&(&b.method, &b.template)));

    println!("{}", serde_json::to_string_pretty(&routes)?);
    Ok(())
}

/// Validate configuration file
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config_unchecked(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = RouterConfigValidator::validate(&config) {
        eprintln!("❌ Configuration validation failed:");
        eprintln!("{e}");
        println!();
        println!("💡 Common fixes:");
        println!("   • Declare every group before routes reference it");
        println!("   • Use 'Service' or 'Service::operation' for handlers");
        println!("   • Close every '{{' in a route path with '}}'");
        std::process::exit(1);
    }
    println!("✅ Configuration validation: OK");

    // The builder applies the same rules; a failure here means they disagree.
    let (builder, global) = RouterBuilder::from_config(&config)
        .wrap_err("Router construction failed after validation")?;
    let routes = builder.route_count();

    println!();
    println!("📋 Configuration Summary:");
    println!("   • Mode: {:?}", config.mode);
    println!("   • Wildcard method: {}", config.wildcard_method);
    println!("   • Groups: {}", config.groups.len());
    println!("   • Routes (after group expansion): {routes}");
    println!("   • Global middleware: {}", global.len());
    println!();
    println!("🎉 Configuration is valid and ready to use!");
    Ok(())
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Switchyard route configuration
mode: persistent
wildcard_method: ANY

# Global middleware keys, resolved through the service locator
middleware:
  - RequestTiming
priority_middleware: []

groups:
  - name: api
    prefix: /api/v1
    priority_middleware:
      - Auth

routes:
  - method: GET
    path: /users/{id:int}
    handler: Users::show
    groups: [api]
  - method: POST
    path: /users
    handler: Users::create
    groups: [api]
  - method: ANY
    path: /health
    handler: Health

logging:
  level: info
  json: false
"#;

    tokio::fs::write(path, default_config)
        .await
        .with_context(|| format!("Failed to write {config_path}"))?;

    println!("✅ Created configuration file: {config_path}");
    println!("💡 Edit the routes, then run: switchyard validate --config {config_path}");
    Ok(())
}
