use crate::router::path::{bind_values, PathVariables};
use crate::router::route::{Defaults, Route};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything a dispatcher needs to invoke the matched controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub route: String,
    pub controller: String,
    pub action: String,
    pub dependencies: Vec<String>,
    pub view: String,
    /// Template variables by segment index.
    pub variables: PathVariables,
    /// Variable name to the request segment it matched.
    pub path_values: BTreeMap<String, String>,
    pub defaults: Defaults,
}

impl Dispatch {
    pub fn from_route(route: &Route, request_path: &str) -> Self {
        let variables = route.path_variables();
        let path_values = bind_values(&variables, request_path);

        Dispatch {
            route: route.name().to_string(),
            controller: route.controller().to_string(),
            action: route.action().to_string(),
            dependencies: route.dependencies().to_vec(),
            view: route.view().to_string(),
            variables,
            path_values,
            defaults: route.defaults().clone(),
        }
    }

    /// Defaults overlaid with the values taken from the request path.
    ///
    /// A default keyed by a segment index fills the variable at that index
    /// and is reported under the variable's name only.
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = self.defaults.clone();

        for (index, name) in &self.variables {
            if let Some(value) = params.remove(&index.to_string()) {
                params.entry(name.clone()).or_insert(value);
            }
        }

        params.extend(
            self.path_values
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        params
    }
}
