//! Upgrade command - reinstall onpm globally

use crate::config::Config;
use crate::error::OnpmResult;
use crate::orchestration::create_orchestrator;
use crate::ui::{TaskSpinner, UiContext};

/// Execute the upgrade command
pub async fn execute(config: &Config) -> OnpmResult<()> {
    let ctx = UiContext::detect();
    let orchestrator = create_orchestrator(config);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Upgrading onpm...");
    match orchestrator.upgrade_self().await {
        Ok(()) => {
            spinner.stop("onpm upgraded");
            Ok(())
        }
        Err(e) => {
            spinner.stop_error("Could not upgrade onpm");
            Err(e)
        }
    }
}
