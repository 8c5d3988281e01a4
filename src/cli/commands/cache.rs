//! Cache command - inspect and populate the package cache

use crate::cache::{CacheStore, CachedPackage, PackageCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::OnpmResult;
use crate::orchestration::create_cache_store;
use crate::package::{PackageRef, VersionSpec};
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> OnpmResult<()> {
    let store = create_cache_store(config);

    match args.action {
        CacheAction::List { format } => list_cache(&store, format),
        CacheAction::Path => {
            println!("{}", store.cache_root()?.display());
            Ok(())
        }
        CacheAction::Store { name, from } => store_package(&store, &name, from.as_deref()),
    }
}

/// List all cached packages
fn list_cache(store: &CacheStore, format: OutputFormat) -> OnpmResult<()> {
    let packages = store.list()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&packages)?),
        _ if packages.is_empty() => println!("No cached packages."),
        OutputFormat::Table => print_cache_table(&packages),
        OutputFormat::Plain => print_cache_plain(&packages),
    }

    Ok(())
}

fn print_cache_table(packages: &[CachedPackage]) {
    println!("{:<40} {:<10} {}", "PACKAGE", "LATEST", "VERSIONS");
    println!("{}", "-".repeat(70));

    for package in packages {
        let latest = package.versions.first().map(String::as_str).unwrap_or("-");
        println!(
            "{:<40} {:<10} {}",
            package.name,
            latest,
            package.versions.join(", ")
        );
    }

    println!();
    println!("Total: {} package(s)", packages.len());
}

fn print_cache_plain(packages: &[CachedPackage]) {
    for package in packages {
        for version in &package.versions {
            println!("{}@{}", package.name, version);
        }
    }
}

/// Store an installed package in the cache
fn store_package(store: &CacheStore, name: &str, from: Option<&Path>) -> OnpmResult<()> {
    let ctx = UiContext::detect();
    PackageRef::new(name, VersionSpec::Latest)?;

    let entry = store.store_into_cache(name, from)?;
    ui::step_ok_detail(
        &ctx,
        &format!("Stored {} in cache", name),
        &entry.display().to_string(),
    );
    Ok(())
}
