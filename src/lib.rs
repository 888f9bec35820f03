mod connection;
mod connection_options;
pub mod driver;
pub mod error;
pub mod migrate;
mod result;

pub use connection::Connection;
pub use connection_options::ConnectionOptions;
pub use error::Error;
pub use result::{AsyncResult, Result};
