//! InMemory Store 実装
//!
//! HashMap をインメモリ DB として使用します。

mod identity;
mod message;

pub use identity::InMemoryIdentityStore;
pub use message::InMemoryMessageStore;
