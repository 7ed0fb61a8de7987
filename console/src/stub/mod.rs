pub mod service;

pub use service::{routes, serve};
