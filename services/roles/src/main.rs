use anyhow::{Result, bail};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{ApiClient, ApiConfig, AuthProvider};
use roles::registry::permissions_by_category;
use roles::{PermissionCategory, RoleRepository, RolesStore};

/// Inspect Clover Books roles and their permissions
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Print the permission matrix of this role
    #[arg(long)]
    role: Option<i64>,
    /// Limit the matrix to one category, e.g. `bills`
    #[arg(long, requires = "role")]
    category: Option<PermissionCategory>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig::from_env()?;
    info!("Using Clover Books API at {}", config.base_url);
    let client = ApiClient::new(&config)?;

    let auth = AuthProvider::init(client.clone()).await;
    match auth.current().user {
        Some(user) => info!("Signed in as {}", user.email),
        None => warn!("Not signed in; the server may refuse role requests"),
    }

    let store = RolesStore::new(RoleRepository::new(client));
    store.refresh_roles().await;

    match args.role {
        None => {
            for role in store.roles().await {
                let kind = if role.is_builtin { "built-in" } else { "custom" };
                println!("{:>5}  {:<24} {:<32} {}", role.id, role.key, role.label, kind);
            }
        }
        Some(id) => {
            store.load_role(id).await;
            if let Some(role) = store.active_role().await {
                println!("{} ({})", role.label(), role.key());

                let categories = match args.category {
                    Some(category) => vec![category],
                    None => PermissionCategory::ALL.to_vec(),
                };
                for category in categories {
                    println!("\n[{}]", category.label());
                    for spec in permissions_by_category(category) {
                        let entry = role.entry(spec.action);
                        let marker = if spec.sensitive { "*" } else { " " };
                        println!(
                            "{} {:<28} {:<8} {}",
                            marker,
                            spec.action,
                            entry.level.as_str(),
                            entry.scope.scope_type.as_str()
                        );
                    }
                }
            }
        }
    }

    if let Some(message) = store.error().await {
        error!("{}", message);
        bail!(message);
    }

    Ok(())
}
