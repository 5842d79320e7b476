pub mod events;
pub mod subscription;
pub mod traits;

pub use events::{ConnectionState, Envelope, MessageKind};
pub use subscription::Subscription;
pub use traits::{
    Decompressor, DepthListener, FrameParser, TickerListener, TradeListener,
};
