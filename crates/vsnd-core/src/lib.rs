pub mod caps;
pub mod device;
pub mod driver;
mod error;

pub use self::error::{Error, Result};
