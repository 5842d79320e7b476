pub mod connection;
pub mod decompress;
pub mod proxy;
pub mod transport;

pub use connection::{Heartbeat, HeartbeatMessage, StreamClient};
pub use decompress::{Compression, Deflate, Gzip, Identity};
pub use proxy::{ProxyConfig, ProxyKind};
