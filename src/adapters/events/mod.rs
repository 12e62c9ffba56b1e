//! Event bus adapters.
//!
//! - `ChannelEventBus`: per-subscriber queues and workers, used at runtime
//! - `InMemoryEventBus`: inline delivery with capture, used in tests
//! - `RedisEventPublisher` / `RedisEventRelay`: cross-process transport
//! - `FanoutPublisher`: local bus plus Redis

mod channel_bus;
mod fanout;
mod in_memory;
mod redis;

pub use channel_bus::{ChannelEventBus, DEFAULT_QUEUE_CAPACITY};
pub use fanout::FanoutPublisher;
pub use in_memory::InMemoryEventBus;
pub use self::redis::{RedisEventPublisher, RedisEventRelay};
