pub mod channel_id;
pub mod error;
pub mod message;
pub mod segment;
pub mod varint;

pub use channel_id::ChannelId;
pub use error::{Error, ErrorKind, Result};
pub use message::Message;
pub use segment::ChannelSegment;
