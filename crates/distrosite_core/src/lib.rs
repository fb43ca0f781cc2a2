pub mod assets;
pub mod catalogue;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod imaging;
pub mod metadata;
pub mod pipeline;
pub mod related;
pub mod render;
pub mod runtime;
pub mod screenshots;
pub mod sitemap;
pub mod snapshot;
pub mod urls;

#[cfg(test)]
mod test_support;
