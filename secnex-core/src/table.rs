//! Concurrency-safe holder of the active route snapshot (§4.2).
//!
//! Publication is a single atomic pointer swap via [`arc_swap::ArcSwap`]:
//! readers never block writers and never observe a torn snapshot, mirroring
//! the hot-swap discipline the teacher's router uses for its compiled trie.

use crate::route::Route;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable, atomically-published set of routes keyed by route path.
#[derive(Default)]
struct Snapshot {
    by_path: HashMap<String, Route>,
}

impl Snapshot {
    fn from_routes(routes: Vec<Route>) -> Self {
        let by_path = routes.into_iter().map(|r| (r.path.clone(), r)).collect();
        Self { by_path }
    }
}

pub struct RouteTable {
    inner: ArcSwap<Snapshot>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(Snapshot::default())),
        }
    }

    pub fn with_routes(routes: Vec<Route>) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(Snapshot::from_routes(routes))),
        }
    }

    /// Look up a route by its key. Holds a local reference to one
    /// consistent snapshot for the duration of the call.
    pub fn get(&self, path: &str) -> Option<Route> {
        self.inner.load().by_path.get(path).cloned()
    }

    /// Replace the current snapshot atomically. Never blocks readers.
    pub fn set(&self, routes: Vec<Route>) {
        self.inner.store(Arc::new(Snapshot::from_routes(routes)));
    }

    /// Route keys registered in the current snapshot (used by HTTP Dispatch
    /// at bind time, §4.7).
    pub fn keys(&self) -> Vec<String> {
        self.inner.load().by_path.keys().cloned().collect()
    }

    /// All routes in the current snapshot.
    pub fn all(&self) -> Vec<Route> {
        self.inner.load().by_path.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.load().by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str) -> Route {
        Route {
            path: path.to_string(),
            url: "http://upstream".to_string(),
            allowed_methods: Default::default(),
            allowed_ips: Default::default(),
            blocked_ips: Default::default(),
            allowed_user_agents: Default::default(),
            rejected_user_agents: Default::default(),
            default_allowed: true,
            required_auth: false,
            forward_sub_path: false,
        }
    }

    #[test]
    fn get_returns_none_for_unknown_path() {
        let table = RouteTable::new();
        assert!(table.get("webhook").is_none());
    }

    #[test]
    fn set_publishes_a_lookable_snapshot() {
        let table = RouteTable::new();
        table.set(vec![route("webhook")]);
        assert!(table.get("webhook").is_some());
        assert_eq!(table.keys(), vec!["webhook".to_string()]);
    }

    #[test]
    fn a_later_set_fully_replaces_the_earlier_snapshot() {
        let table = RouteTable::with_routes(vec![route("a")]);
        assert!(table.get("a").is_some());
        table.set(vec![route("b")]);
        assert!(table.get("a").is_none());
        assert!(table.get("b").is_some());
    }

    #[test]
    fn a_reader_holding_an_old_snapshot_is_unaffected_by_a_concurrent_swap() {
        let table = Arc::new(RouteTable::with_routes(vec![route("a")]));
        let held = table.get("a").expect("route present before swap");
        table.set(vec![route("b")]);
        // The value we already read stays whatever it was; the table itself
        // now serves the new snapshot.
        assert_eq!(held.path, "a");
        assert!(table.get("a").is_none());
    }
}
