//! Ingestion pipeline: batching, session log persistence and the in-memory
//! session store, tied together by the batch consumer task.

pub mod chunk;
pub mod consumer;
pub mod sink;
pub mod store;

pub use chunk::chunked;
pub use consumer::{spawn_consumer, ConsumerReport};
pub use sink::{SessionLogWriter, LOG_HEADER};
pub use store::SessionStore;
