pub mod config;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod tasks;

pub use config::{DappConfig, DeployConstants, WalletEndpoint, validate_url};
pub use error::MintError;
pub use notifications::{Alert, AlertKind, AlertLog, AlertSink};
pub use tasks::{PeriodicTask, TaskSet, TaskStatus};
