use std::process::ExitCode;

use campus_engine::run_app_with_metrics;
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        world,
        shell,
        assets,
        metrics,
    } = app;
    if let Err(err) = run_app_with_metrics(config, world, shell, assets, metrics) {
        error!(error = %err, "app_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
