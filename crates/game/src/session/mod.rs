mod authority;
mod config;
mod tick;

pub use authority::Authority;
pub use config::SessionConfig;
pub use tick::FixedTimestep;
