pub mod builder;
pub mod network;
pub mod record;
pub mod schedule;

pub use builder::NetworkBuilder;
pub use network::Network;
pub use record::NetworkRecord;
pub use schedule::build_waves;
