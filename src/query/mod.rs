//! Async query cache for data fetching.
//!
//! Inspired by TanStack Query: a `QueryClient` caches results per `QueryKey`,
//! dedupes concurrent fetches, serves stale data while revalidating, retries
//! failures with a `RetryPolicy`, and drops entries no view has observed for
//! a while. Views hold a `Query<T>` and read its `state()` on every tick.
//!
//! # Example
//!
//! ```ignore
//! let client = QueryClient::new(QueryOptions::default());
//! let catalog = catalog.clone();
//! let query = Query::new(&client, QueryKey::albums(), move || {
//!     let catalog = catalog.clone();
//!     async move { catalog.albums().await }
//! });
//!
//! // In event loop tick
//! let state = query.state();
//!
//! // In render
//! match (state.status, state.data()) {
//!     (_, Some(albums)) => render_albums(albums),
//!     (QueryStatus::Error, None) => render_error(state.error()),
//!     _ => render_spinner(),
//! }
//! ```

mod client;
mod key;
mod observer;
mod retry;
mod state;

pub use client::{into_loader, QueryClient, QueryOptions};
pub use key::QueryKey;
pub use observer::Query;
pub use retry::RetryPolicy;
pub use state::{QueryState, QueryStatus};
