// Application layer - the sales ledger and its use cases.
// Clients (the CLI, tests) go through `SalesLedger`; it owns the loaded view
// and is the only thing that talks to a `SalesStore`.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
