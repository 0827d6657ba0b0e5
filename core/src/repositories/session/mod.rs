//! Session store module.

mod r#trait;
pub use r#trait::SessionStore;

mod memory;
pub use memory::InMemorySessionStore;
