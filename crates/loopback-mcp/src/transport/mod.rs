//! Transport layer — the in-memory carrier, the client channel that
//! correlates responses, and the server endpoint that feeds the dispatcher.

pub mod channel;
pub mod duplex;
pub mod framing;
pub mod server;

pub use channel::{Channel, LinkState, NotificationHandler};
pub use duplex::{duplex, DuplexPort, PortReceiver, PortSender};
pub use server::{Server, ServerHandle};
