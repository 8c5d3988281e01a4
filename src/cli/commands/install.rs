//! Install command - cache-first package installs

use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::{OnpmError, OnpmResult};
use crate::orchestration::{create_orchestrator, BatchEntry, InstallSource, Outcome};
use crate::package::{InstallOptions, SaveMode};
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> OnpmResult<()> {
    let ctx = UiContext::detect();
    let orchestrator = create_orchestrator(config);
    let options = install_options(&args);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Installing {}", args.packages.join(", ")));
    let entries = orchestrator.install_many(args.packages.as_slice(), &options).await;
    spinner.clear();

    for entry in &entries {
        report_entry(&ctx, entry);
    }

    let failed = entries.iter().filter(|e| !e.outcome.installed()).count();
    if failed > 0 {
        return Err(OnpmError::User(format!(
            "{} of {} package(s) failed to install",
            failed,
            entries.len()
        )));
    }

    let from_cache = count_from_cache(&entries);
    ui::outro_success(
        &ctx,
        &format!(
            "Installed {} package(s), {} from cache",
            entries.len(),
            from_cache
        ),
    );
    Ok(())
}

/// Build install options from command flags
fn install_options(args: &InstallArgs) -> InstallOptions {
    let save = if args.save {
        Some(SaveMode::Runtime)
    } else if args.save_dev {
        Some(SaveMode::Dev)
    } else {
        None
    };

    InstallOptions {
        save,
        target_dir: args.prefix.clone(),
    }
}

/// Entries served out of the cache
fn count_from_cache(entries: &[BatchEntry]) -> usize {
    entries
        .iter()
        .filter(|e| e.outcome.source() == Some(InstallSource::Cache))
        .count()
}

fn report_entry(ctx: &UiContext, entry: &BatchEntry) {
    match &entry.outcome {
        Outcome::FromCache { version } => ui::step_ok_detail(
            ctx,
            &format!("{} installed from cache", entry.spec),
            version,
        ),
        Outcome::InstalledAndCached { cache_path } => ui::step_ok_detail(
            ctx,
            &format!("{} installed and cached", entry.spec),
            &cache_path.display().to_string(),
        ),
        Outcome::InstalledNotCached { reason } => ui::step_warn_hint(
            ctx,
            &format!("{} installed but not cached", entry.spec),
            reason,
        ),
        Outcome::Failed { reason } => {
            ui::step_error_detail(ctx, &format!("{} failed", entry.spec), reason)
        }
    }
}
