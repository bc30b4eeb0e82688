pub mod key;
pub use key::QueryKey;
pub mod query_client;
pub use query_client::{CacheEvent, QueryClient, QueryFn, QueryOptions, QuerySnapshot};
pub mod mutation;
pub use mutation::Mutation;
