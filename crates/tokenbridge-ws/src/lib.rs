//! tokenbridge-ws: the connector event feed.
//!
//! # Features
//! - One long-lived websocket per connector endpoint
//! - `listen` / `listenreplies` handshake on every (re)connect
//! - Ping keepalive with a pong deadline; a missed pong terminates the socket
//! - Fixed-delay reconnect after any unsolicited disconnect
//! - Explicit `ack`: the only thing that advances the connector's cursor
//! - Batches and replies delivered over channels rather than callbacks

pub mod socket;
pub mod timer;
pub mod transport;

pub use socket::{
    ConnectionState, EventBatch, EventStreamSocket, FeedMessage, FeedReceivers, SocketConfig,
};
pub use timer::Timer;
pub use transport::{FeedConnection, FeedFrame, FeedTransport, WsFeedTransport};
