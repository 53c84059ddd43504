//! Request classification and the strategy table.
//!
//! Adding a resource kind means adding a variant and a row in [`ROUTES`].

use serde::{Deserialize, Serialize};
use swcache_core::{Destination, Request};

use super::context::NamespaceKind;

/// What an intercepted request is for, as far as routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Script,
    Style,
    Document,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

/// Where and how a request kind is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub strategy: Strategy,
    pub namespace: NamespaceKind,
}

pub const ROUTES: &[(ResourceKind, Route)] = &[
    (ResourceKind::Image, Route { strategy: Strategy::CacheFirst, namespace: NamespaceKind::Image }),
    (ResourceKind::Script, Route { strategy: Strategy::CacheFirst, namespace: NamespaceKind::Static }),
    (ResourceKind::Style, Route { strategy: Strategy::CacheFirst, namespace: NamespaceKind::Static }),
    (ResourceKind::Document, Route { strategy: Strategy::NetworkFirst, namespace: NamespaceKind::Dynamic }),
    (ResourceKind::Other, Route { strategy: Strategy::CacheFirst, namespace: NamespaceKind::Static }),
];

const FALLBACK_ROUTE: Route = Route { strategy: Strategy::CacheFirst, namespace: NamespaceKind::Static };

/// Classify a request by its destination.
pub fn classify(request: &Request) -> ResourceKind {
    match request.destination {
        Destination::Image => ResourceKind::Image,
        Destination::Script => ResourceKind::Script,
        Destination::Style => ResourceKind::Style,
        Destination::Document => ResourceKind::Document,
        Destination::Font | Destination::Manifest | Destination::Empty | Destination::Other => ResourceKind::Other,
    }
}

pub fn route_for(kind: ResourceKind) -> Route {
    ROUTES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, route)| *route)
        .unwrap_or(FALLBACK_ROUTE)
}
