//! Arena backend client and the payload adapter.

mod error;
mod source;
mod stats_client;
mod types;

pub use error::{ClientError, ErrorKind};
pub use source::StatsSource;
pub use stats_client::StatsClient;
pub use types::*;
