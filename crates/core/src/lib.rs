pub mod config;
pub mod error;
pub mod kind;

pub use config::{load_dotenv, BenchConfig};
pub use error::*;
pub use kind::*;
