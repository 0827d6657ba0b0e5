//! Account validator module.

mod r#trait;
pub use r#trait::AccountValidator;

mod accept_all;
pub use accept_all::AcceptAllAccounts;

mod memory;
pub use memory::InMemoryAccountValidator;
