//! Route declarations and the immutable route table.

use std::collections::{BTreeSet, HashMap};

use http::Method;

use crate::error::{RouteError, RouteNotFound};
use crate::params::Params;
use crate::pattern::PathPattern;

/// A single route declaration.
///
/// # Example
///
/// ```rust
/// use cirrus_router::Route;
/// use http::Method;
///
/// let route = Route::new(Method::DELETE, "/users/:id", "deleteUser")
///     .require_roles(["admin"]);
/// assert!(route.requires_roles());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// HTTP method
    pub method: Method,
    /// Path pattern as declared
    pub pattern: String,
    /// Name of the controller handler serving the route
    pub handler_name: String,
    /// Roles allowed to call the route; `None` means unrestricted
    pub required_roles: Option<BTreeSet<String>>,
}

impl Route {
    /// Declares an unrestricted route.
    pub fn new(method: Method, pattern: impl Into<String>, handler_name: impl Into<String>) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler_name: handler_name.into(),
            required_roles: None,
        }
    }

    /// Restricts the route to callers holding at least one of `roles`.
    #[must_use]
    pub fn require_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true when ACL enforcement applies to this route.
    #[must_use]
    pub fn requires_roles(&self) -> bool {
        self.required_roles.as_ref().is_some_and(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    route: Route,
    matcher: PathPattern,
}

/// A matched route with its extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Route,
    /// Extracted path parameters
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Name of the handler serving the matched route.
    #[must_use]
    pub fn handler_name(&self) -> &'a str {
        &self.route.handler_name
    }
}

/// Immutable, per-method ordered list of routes.
///
/// Lookup walks the routes of the request method in declaration order and
/// returns the first whose pattern matches. Patterns are not ranked by
/// specificity, so `/users/:id` declared before `/users/new` captures
/// `/users/new`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<Entry>,
    by_method: HashMap<Method, Vec<usize>>,
}

impl RouteTable {
    /// Starts building a table.
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Resolves `method` and `path` to the first matching route.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, RouteNotFound> {
        let not_found = || RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        };

        let indices = self.by_method.get(method).ok_or_else(not_found)?;
        indices
            .iter()
            .map(|&i| &self.entries[i])
            .find_map(|entry| {
                entry.matcher.match_path(path).map(|params| RouteMatch {
                    route: &entry.route,
                    params,
                })
            })
            .ok_or_else(not_found)
    }

    /// Iterates over all routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.iter().map(|e| &e.route)
    }

    /// Number of declared routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no routes are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Free-function form of [`RouteTable::resolve`].
pub fn resolve<'a>(
    table: &'a RouteTable,
    method: &Method,
    path: &str,
) -> Result<RouteMatch<'a>, RouteNotFound> {
    table.resolve(method, path)
}

/// Builder for [`RouteTable`].
///
/// # Example
///
/// ```rust
/// use cirrus_router::{Route, RouteTable};
/// use http::Method;
///
/// let table = RouteTable::builder()
///     .route(Route::new(Method::GET, "/users", "listUsers"))
///     .route(Route::new(Method::GET, "/users/:id", "getUser"))
///     .build()
///     .unwrap();
///
/// let m = table.resolve(&Method::GET, "/users/42").unwrap();
/// assert_eq!(m.handler_name(), "getUser");
/// assert_eq!(m.params.get("id"), Some("42"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    /// Appends a route.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Appends an unrestricted route.
    #[must_use]
    pub fn add(
        self,
        method: Method,
        pattern: impl Into<String>,
        handler_name: impl Into<String>,
    ) -> Self {
        self.route(Route::new(method, pattern, handler_name))
    }

    /// Compiles every pattern and freezes the table.
    ///
    /// Fails on the first invalid pattern, or on a pattern whose shape
    /// repeats an earlier one for the same method (parameter names aside).
    pub fn build(self) -> Result<RouteTable, RouteError> {
        let mut table = RouteTable::default();

        for route in self.routes {
            let matcher = PathPattern::parse(&route.pattern)?;
            let indices = table.by_method.entry(route.method.clone()).or_default();

            if indices
                .iter()
                .any(|&i| table.entries[i].matcher.same_shape(&matcher))
            {
                return Err(RouteError::DuplicateRoute {
                    method: route.method,
                    pattern: route.pattern,
                });
            }

            indices.push(table.entries.len());
            table.entries.push(Entry { route, matcher });
        }

        Ok(table)
    }
}
