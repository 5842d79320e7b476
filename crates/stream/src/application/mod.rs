pub mod builder;
pub mod dispatcher;
pub mod journal;
pub mod listeners;
pub mod reconnect;

pub use builder::StreamBuilder;
pub use dispatcher::{Dispatch, DispatchStats, FrameDispatcher};
pub use journal::SubscriptionJournal;
pub use listeners::{ListenerRegistry, Listeners};
pub use reconnect::ReconnectPolicy;
