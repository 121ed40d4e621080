pub mod clock;
pub mod config;
pub mod eip1193;

pub use clock::SystemClockAdapter;
pub use config::{ConfigError, MessageDelivery, RuntimeProfile, WalletAdapterConfig};
pub use eip1193::Eip1193Adapter;
