//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::RunArgs;
pub use types::HttpMethod;

pub(crate) use parsers::parse_header;
