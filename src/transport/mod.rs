/// Postgres transport
///
/// Connection configuration, the driver seam handlers open sessions through,
/// and JSON value conversion for parameters and rows.

// Credentials + options -> configured database handle
pub mod configure;

// Connector/PgSession traits and the tokio-postgres driver
pub mod session;

// Parameter binding and row decoding
pub mod values;

pub use configure::{configure_postgres, ConfigureOptions, ConnectionTarget, Database, TypeOptions};
pub use session::{Connector, PgSession, TokioPostgresConnector};
