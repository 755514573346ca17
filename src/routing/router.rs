//! Priority-ordered route matching.

use crate::config::schema::{MatchType, Route};

/// Ordered collection of routes, matched first-hit in ascending priority.
///
/// Ties keep insertion order, so iteration order equals match-attempt order.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a config's route list.
    pub fn from_routes(routes: &[Route]) -> Self {
        let mut table = Self::new();
        for route in routes {
            table.add(route.clone());
        }
        table
    }

    /// Append a route, keeping the table stably sorted by priority.
    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
        self.routes.sort_by_key(|r| r.priority);
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// First route matching `path`, in priority order.
    pub fn match_route(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| Self::is_match(path, route))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn is_match(path: &str, route: &Route) -> bool {
        match route.match_type {
            MatchType::Exact => path == route.path_pattern,
            MatchType::Prefix => path.starts_with(&route.path_pattern),
        }
    }
}
