pub mod command;
pub mod daemon;
pub mod error;
pub mod io;
pub mod paths;
pub mod process;
pub mod store;
pub mod types;

pub use error::{DswError, ErrorKind, Result};
pub use types::{Action, ApiResponse};
