use crate::router::matcher::RequestMatcher;
use crate::router::route::{Route, RouteError};
use crate::router::route_config::RoutingConfig;
use log::debug;
use std::sync::Arc;

/// Routes of one routing config bound to a single matcher, in file order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn build(
        config: &RoutingConfig,
        request_matcher: Arc<dyn RequestMatcher>,
    ) -> Result<Self, RouteError> {
        let routes = config
            .routes()
            .iter()
            .map(|route| route.build(request_matcher.clone()).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RouteTable { routes })
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|route| route.name() == name)
    }

    /// The first route whose requirements hold.
    pub fn find_match(&self) -> Option<Arc<Route>> {
        for route in &self.routes {
            if route.matches_request() {
                debug!("Route `{}` matches", route.name());
                return Some(route.clone());
            }
        }
        None
    }
}
