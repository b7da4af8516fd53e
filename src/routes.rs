//! Client-side route table.
//!
//! A static, declarative mapping from history-mode URL paths to views. No
//! guards, no lazy loading, no data resolution. Views are rendered by
//! whoever consumes [`RouteTable::resolve`].
//!
//! ```text
//! /        → redirect /roles
//! /roles   → Roles
//! /chat    → Chat
//! ```

use std::fmt;

/// A view the route table can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Roles,
    Chat,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Roles => "Roles",
            View::Chat => "Chat",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a route does when matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Redirect(&'static str),
    Render(View),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub target: RouteTarget,
}

/// The application's routes.
pub const ROUTES: &[Route] = &[
    Route { path: "/", target: RouteTarget::Redirect("/roles") },
    Route { path: "/roles", target: RouteTarget::Render(View::Roles) },
    Route { path: "/chat", target: RouteTarget::Render(View::Chat) },
];

/// Outcome of resolving a URL: the path the browser ends up on and the view
/// rendered there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub path: &'static str,
    pub view: View,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: &'static [Route],
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(ROUTES)
    }
}

impl RouteTable {
    pub fn new(routes: &'static [Route]) -> Self {
        Self { routes }
    }

    /// The route whose path matches `url` exactly, after normalisation.
    pub fn matching(&self, url: &str) -> Option<&'static Route> {
        let path = normalize(url);
        self.routes.iter().find(|r| r.path == path)
    }

    /// Follow redirects until a view is reached.
    ///
    /// Returns `None` for unknown paths and for redirect chains that never
    /// land on a view (a chain longer than the table must be a cycle).
    pub fn resolve(&self, url: &str) -> Option<Resolved> {
        let mut route = self.matching(url)?;
        for _ in 0..=self.routes.len() {
            match route.target {
                RouteTarget::Render(view) => return Some(Resolved { path: route.path, view }),
                RouteTarget::Redirect(to) => route = self.matching(to)?,
            }
        }
        None
    }
}

/// Strip query and fragment, then one trailing slash (except on `/`).
fn normalize(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    if path.is_empty() {
        return "/";
    }
    match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    }
}
