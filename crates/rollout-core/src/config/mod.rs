//! Deployment configuration: schema, parsing, and the file store.
//!
//! All mode/style branching in the engine consults these typed values at
//! well-defined decision points, keeping the state machine's transition
//! table auditable.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_rollout_toml, parse_rollout_toml_str};
pub use schema::{
    ActionConfig, CountdownConfig, DeferralConfig, DeploymentConfig, RebootConfig, RolloutConfig,
    SilentConfig,
};
pub use store::{CONFIG_FILE_NAME, ConfigStore};
