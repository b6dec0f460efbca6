//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → TransferConfig (validated, immutable)
//!     → LoopSettings + RpcSettings for the run
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The private key is never part of the file, only the env var name

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    ConfirmationConfig, CredentialConfig, FailurePolicy, LogFormat, NetworkConfig,
    ObservabilityConfig, RetryConfig, TransferConfig, TransferParams,
};
pub use validation::{validate_config, ValidationError};
