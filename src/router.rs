pub mod dispatch;
pub mod matcher;
pub mod path;
pub mod route;
pub mod route_config;
#[allow(clippy::module_inception)]
pub mod router;
pub mod table;

pub use dispatch::Dispatch;
pub use matcher::{HostPatterns, HttpRequestMatcher, RequestMatcher};
pub use path::PathVariables;
pub use route::{ControllerRef, ControllerSpec, Defaults, Requirements, Route, RouteError};
pub use route_config::{read_routing_config, RouteConfig, RoutingConfig, RoutingConfigError};
pub use router::Router;
pub use table::RouteTable;
