//! The Printed Bay HTTP service
//!
//! One handler per business operation, each calling the vendor
//! integrations held in [`AppState`]. Vendors that are not configured run
//! as mocks so the storefront works end to end without credentials.
//!
//! ```text
//! printbay-server/src/
//! ├── api/           # routes and handlers
//! ├── integrations/  # database, storage, payments, email, shipping
//! ├── config.rs      # environment configuration
//! ├── error.rs       # integration errors
//! ├── logger.rs      # tracing setup
//! └── state.rs       # shared state
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod integrations;
pub mod logger;
pub mod state;

pub use api::build_app;
pub use config::Config;
pub use error::IntegrationError;
pub use state::AppState;
