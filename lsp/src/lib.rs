pub mod analyzer;
mod server;

pub use server::run;
