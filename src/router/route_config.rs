use crate::router::matcher::{HostPatterns, RequestMatcher, HOST, PATH};
use crate::router::route::{
    require_non_empty, ControllerRef, ControllerSpec, Defaults, Requirements, Route, RouteError,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingConfigError {
    #[error("Failed to read routing config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse routing config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid route: {0}")]
    Route(#[from] RouteError),

    #[error("Duplicate route name `{0}`")]
    DuplicateRoute(String),

    #[error("route `{route}`: invalid host pattern `{pattern}`: {source}")]
    InvalidHostPattern {
        route: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RouteConfig {
    name: String,
    path: String,
    view: String,
    controller: ControllerSpec,
    #[serde(default)]
    requirements: Requirements,
    #[serde(default)]
    defaults: Defaults,
}

impl RouteConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared requirements plus the route path, unless a `path`
    /// requirement is already declared.
    pub fn effective_requirements(&self) -> Requirements {
        let mut requirements = self.requirements.clone();
        requirements
            .entry(PATH.to_string())
            .or_insert_with(|| self.path.clone());
        requirements
    }

    /// Binds this definition to a matcher.
    pub fn build(&self, request_matcher: Arc<dyn RequestMatcher>) -> Result<Route, RouteError> {
        Route::new(
            self.name.clone(),
            self.path.clone(),
            self.effective_requirements(),
            self.view.clone(),
            self.controller.clone(),
            request_matcher,
            self.defaults.clone(),
        )
    }

    fn validate(&self) -> Result<(), RoutingConfigError> {
        require_non_empty(&self.name, "name", &self.name)?;
        require_non_empty(&self.name, "path", &self.path)?;
        require_non_empty(&self.name, "view", &self.view)?;
        ControllerRef::from_spec(&self.name, self.controller.clone())?;
        Ok(())
    }

    fn compile_host_pattern(&self, patterns: &mut HostPatterns) -> Result<(), RoutingConfigError> {
        if let Some(pattern) = self.requirements.get(HOST) {
            patterns
                .insert(pattern)
                .map_err(|source| RoutingConfigError::InvalidHostPattern {
                    route: self.name.clone(),
                    pattern: pattern.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RoutingConfig {
    #[serde(default)]
    routes: Vec<RouteConfig>,
    #[serde(skip)]
    host_patterns: Arc<HostPatterns>,
}

impl RoutingConfig {
    pub fn routes(&self) -> &Vec<RouteConfig> {
        &self.routes
    }

    /// Host patterns of all routes, compiled when the config was loaded.
    pub fn host_patterns(&self) -> Arc<HostPatterns> {
        self.host_patterns.clone()
    }

    /// Parses and validates a YAML routing document.
    pub fn from_yaml(yaml: &str) -> Result<Self, RoutingConfigError> {
        let mut config: RoutingConfig = serde_yaml::from_str(yaml)?;
        config.check_routes()?;
        config.host_patterns = Arc::new(config.compile_host_patterns()?);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RoutingConfigError> {
        self.check_routes()?;
        self.compile_host_patterns()?;
        Ok(())
    }

    fn check_routes(&self) -> Result<(), RoutingConfigError> {
        let mut names = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !names.insert(route.name.as_str()) {
                return Err(RoutingConfigError::DuplicateRoute(route.name.clone()));
            }
        }
        Ok(())
    }

    fn compile_host_patterns(&self) -> Result<HostPatterns, RoutingConfigError> {
        let mut patterns = HostPatterns::default();
        for route in &self.routes {
            route.compile_host_pattern(&mut patterns)?;
        }
        Ok(patterns)
    }
}

pub fn read_routing_config(file_path: &Path) -> Result<RoutingConfig, RoutingConfigError> {
    let yaml_content = fs::read_to_string(file_path)?;
    RoutingConfig::from_yaml(&yaml_content)
}
