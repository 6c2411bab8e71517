pub mod client;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod driver;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod headers;
pub mod pool;
pub mod server;
pub mod socket;

pub use config::DriverConfig;
pub use driver::Driver;
pub use endpoint::{AddressFamily, Endpoint};
pub use error::{ProtocolError, Result};
pub use events::{ConnectionFailureReason, DriverEvent};
