use crate::router::matcher::RequestMatcher;
use crate::router::path::{self, PathVariables};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Constraints handed to the request matcher, opaque to the route.
pub type Requirements = BTreeMap<String, String>;

/// Fallback values keyed by variable name or positional index.
pub type Defaults = BTreeMap<String, String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("route `{route}`: controller is missing the `{key}` key")]
    MissingControllerKey { route: String, key: &'static str },

    #[error("route `{route}`: `{attribute}` must not be empty")]
    EmptyAttribute {
        route: String,
        attribute: &'static str,
    },
}

impl RouteError {
    /// Every route error is a caller mistake in the route definition.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            RouteError::MissingControllerKey { .. } | RouteError::EmptyAttribute { .. }
        )
    }
}

/// Controller section as written in configuration, not yet validated.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ControllerSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
}

impl ControllerSpec {
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            action: Some(action.into()),
            dependencies: None,
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }
}

/// Controller a route dispatches to. `name` and `action` are always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerRef {
    name: String,
    action: String,
    dependencies: Option<Vec<String>>,
}

impl ControllerRef {
    pub fn from_spec(route: &str, spec: ControllerSpec) -> Result<Self, RouteError> {
        let name = spec.name.ok_or_else(|| RouteError::MissingControllerKey {
            route: route.to_string(),
            key: "name",
        })?;
        let action = spec.action.ok_or_else(|| RouteError::MissingControllerKey {
            route: route.to_string(),
            key: "action",
        })?;

        Ok(Self {
            name,
            action,
            dependencies: spec.dependencies,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn dependencies(&self) -> &[String] {
        self.dependencies.as_deref().unwrap_or(&[])
    }
}

pub(crate) fn require_non_empty(
    route: &str,
    attribute: &'static str,
    value: &str,
) -> Result<(), RouteError> {
    if value.is_empty() {
        return Err(RouteError::EmptyAttribute {
            route: route.to_string(),
            attribute,
        });
    }
    Ok(())
}

/// A single named endpoint.
///
/// Routes are immutable once built. Whether a route applies to the current
/// request is decided entirely by the injected [`RequestMatcher`].
#[derive(Clone)]
pub struct Route {
    name: String,
    path: String,
    requirements: Requirements,
    view: String,
    controller: ControllerRef,
    request_matcher: Arc<dyn RequestMatcher>,
    defaults: Defaults,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        requirements: Requirements,
        view: impl Into<String>,
        controller: ControllerSpec,
        request_matcher: Arc<dyn RequestMatcher>,
        defaults: Defaults,
    ) -> Result<Self, RouteError> {
        let name = name.into();
        let path = path.into();
        let view = view.into();

        require_non_empty(&name, "name", &name)?;
        require_non_empty(&name, "path", &path)?;
        require_non_empty(&name, "view", &view)?;
        let controller = ControllerRef::from_spec(&name, controller)?;

        Ok(Route {
            name,
            path,
            requirements,
            view,
            controller,
            request_matcher,
            defaults,
        })
    }

    /// Asks the matcher whether this route's requirements hold.
    pub fn matches_request(&self) -> bool {
        self.request_matcher.does_match(&self.requirements)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    pub fn controller(&self) -> &str {
        self.controller.name()
    }

    pub fn action(&self) -> &str {
        self.controller.action()
    }

    /// Empty when the controller declares no dependencies.
    pub fn dependencies(&self) -> &[String] {
        self.controller.dependencies()
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    /// Named variables of the path template, keyed by segment index.
    pub fn path_variables(&self) -> PathVariables {
        path::path_variables(&self.path)
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("requirements", &self.requirements)
            .field("view", &self.view)
            .field("controller", &self.controller)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers with a fixed verdict and remembers what it was asked.
    #[derive(Debug)]
    struct RecordingMatcher {
        verdict: bool,
        seen: Mutex<Vec<Requirements>>,
    }

    impl RecordingMatcher {
        fn new(verdict: bool) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl RequestMatcher for RecordingMatcher {
        fn does_match(&self, requirements: &Requirements) -> bool {
            self.seen.lock().unwrap().push(requirements.clone());
            self.verdict
        }
    }

    fn route_with(path: &str, controller: ControllerSpec) -> Result<Route, RouteError> {
        Route::new(
            "test",
            path,
            Requirements::new(),
            "test/view",
            controller,
            RecordingMatcher::new(true),
            Defaults::new(),
        )
    }

    #[test]
    fn test_accessors_return_constructor_values() {
        let requirements = Requirements::from([("method".to_string(), "GET".to_string())]);
        let defaults = Defaults::from([("id".to_string(), "1".to_string())]);
        let route = Route::new(
            "user_detail",
            "/users/:id",
            requirements.clone(),
            "user/detail",
            ControllerSpec::new("UserController", "show"),
            RecordingMatcher::new(true),
            defaults.clone(),
        )
        .unwrap();

        assert_eq!(route.name(), "user_detail");
        assert_eq!(route.path(), "/users/:id");
        assert_eq!(route.requirements(), &requirements);
        assert_eq!(route.view(), "user/detail");
        assert_eq!(route.controller(), "UserController");
        assert_eq!(route.action(), "show");
        assert_eq!(route.defaults(), &defaults);
    }

    #[test]
    fn test_missing_controller_name() {
        let spec = ControllerSpec {
            action: Some("show".to_string()),
            ..Default::default()
        };
        let err = route_with("/", spec).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(
            err,
            RouteError::MissingControllerKey {
                route: "test".to_string(),
                key: "name",
            }
        );
        assert_eq!(
            err.to_string(),
            "route `test`: controller is missing the `name` key"
        );
    }

    #[test]
    fn test_missing_controller_action() {
        let spec = ControllerSpec {
            name: Some("Home".to_string()),
            ..Default::default()
        };
        let err = route_with("/", spec).unwrap_err();
        assert!(matches!(
            err,
            RouteError::MissingControllerKey { key: "action", .. }
        ));
    }

    #[test]
    fn test_empty_attributes_rejected() {
        let err = Route::new(
            "home",
            "/",
            Requirements::new(),
            "",
            ControllerSpec::new("Home", "index"),
            RecordingMatcher::new(true),
            Defaults::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RouteError::EmptyAttribute {
                route: "home".to_string(),
                attribute: "view",
            }
        );

        let err = route_with("", ControllerSpec::new("Home", "index")).unwrap_err();
        assert!(matches!(
            err,
            RouteError::EmptyAttribute {
                attribute: "path",
                ..
            }
        ));
    }

    #[test]
    fn test_dependencies_default_to_empty() {
        let route = route_with("/", ControllerSpec::new("Home", "index")).unwrap();
        assert!(route.dependencies().is_empty());
    }

    #[test]
    fn test_dependencies_returned_in_order() {
        let spec = ControllerSpec::new("X", "y").with_dependencies(["db", "logger"]);
        let route = route_with("/", spec).unwrap();
        assert_eq!(route.dependencies(), ["db", "logger"]);
    }

    #[test]
    fn test_matches_request_forwards_verdict_and_requirements() {
        let requirements = Requirements::from([
            ("method".to_string(), "POST".to_string()),
            ("host".to_string(), "example\\.com".to_string()),
        ]);

        for verdict in [true, false] {
            let matcher = RecordingMatcher::new(verdict);
            let route = Route::new(
                "submit",
                "/submit",
                requirements.clone(),
                "form/submit",
                ControllerSpec::new("Form", "submit"),
                matcher.clone(),
                Defaults::new(),
            )
            .unwrap();

            assert_eq!(route.matches_request(), verdict);
            assert_eq!(*matcher.seen.lock().unwrap(), vec![requirements.clone()]);
        }
    }

    #[test]
    fn test_path_variables_are_stable() {
        let route = route_with("/:a/static/:b", ControllerSpec::new("X", "y")).unwrap();
        let first = route.path_variables();
        assert_eq!(first, route.path_variables());
        assert_eq!(
            first,
            PathVariables::from([(0, "a".to_string()), (2, "b".to_string())])
        );
    }

    #[test]
    fn test_route_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Route>();
    }
}
