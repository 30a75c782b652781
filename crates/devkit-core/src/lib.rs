pub mod bootstrap;
pub mod ci;
pub mod compose;
pub mod config;
pub mod error;
pub mod guard;
pub mod hook;
pub mod io;
pub mod lock;
pub mod paths;
pub mod probe;
pub mod runner;
pub mod state;

pub use error::{DevkitError, Result};
