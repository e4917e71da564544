//! Deploy command implementation.
//!
//! The single synchronous entry point frontends call to run a deployment
//! session and obtain the resolved report (outcome + exit code).

use crate::config::RolloutConfig;
use crate::context::AppContext;
use crate::session::{SessionEngine, SessionReport, SessionServices};
use crate::types::{DeploymentMode, DeploymentType};

/// Options for one deployment run.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// What to do to the package.
    pub deployment_type: DeploymentType,
    /// Mode override; falls back to the configured default, then Interactive.
    pub mode: Option<DeploymentMode>,
    /// Package identity override for deferral accounting.
    pub package: Option<String>,
}

impl DeployOptions {
    pub fn new(deployment_type: DeploymentType) -> Self {
        Self {
            deployment_type,
            mode: None,
            package: None,
        }
    }

    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }
}

pub struct DeployCommand;

impl DeployCommand {
    /// Run one deployment session with the host's capabilities.
    ///
    /// Infallible at this boundary: session-internal failures are already
    /// resolved into the report's outcome and exit code.
    pub fn execute(
        ctx: &AppContext,
        config: &RolloutConfig,
        services: &mut SessionServices<'_>,
        options: DeployOptions,
    ) -> SessionReport {
        let mode = options
            .mode
            .or(config.deployment.mode)
            .unwrap_or(DeploymentMode::Interactive);
        let package = options
            .package
            .unwrap_or_else(|| config.deployment.package.clone());

        let ledger = ctx.deferral_ledger(&package);
        let mut engine = SessionEngine::new(config, ledger, options.deployment_type, mode);
        engine.run(services)
    }
}
