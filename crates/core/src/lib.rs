pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod flatten;
pub mod ports;
pub mod review;
pub mod utils;

pub use error::{Result, ReviewError};
