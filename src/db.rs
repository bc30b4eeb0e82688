pub mod store;
pub use store::{
    Embed, InsertQuery, Order, RemoteError, RemoteStore, Scope, SelectQuery, Table, UpdateQuery,
};
pub mod pg_store;
pub use pg_store::PgStore;
pub mod memory_store;
pub use memory_store::MemoryStore;
