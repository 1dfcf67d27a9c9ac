use std::{
    fmt::{self, Formatter},
    sync::Arc,
};

use crate::{controller::Action, handler::Handler, http::request::Request};

use super::{
    filter::{self, Filter, MethodFilter, PathFilter},
    PathState,
};

/// A node of the rule table.
///
/// A node matches when all its filters pass; it then tries its children in
/// order and falls back to its own handler once the path is fully consumed.
/// `binds` are route variables attached to the node (e.g. `action`), merged
/// into the request's route variables on a match without overriding values
/// taken from the path.
pub struct Router {
    pub(crate) routers: Vec<Router>,
    pub(crate) filters: Vec<Box<dyn Filter>>,
    pub(crate) binds: Vec<(String, String)>,
    pub(crate) handler: Option<Arc<dyn Handler>>,
}

pub struct DetectMatched {
    pub handler: Arc<dyn Handler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! method_server {
    ($($name: ident),*) => {
        $(
            pub fn $name<H: Handler>(self, handler: H) -> Self {
                self.push(Router::with_filter(filter::$name()).handle(handler))
            }
        )*
    };
}

impl Router {
    pub fn new() -> Self {
        Self {
            routers: Vec::new(),
            filters: Vec::new(),
            binds: Vec::new(),
            handler: None,
        }
    }

    pub fn routers(&self) -> &Vec<Router> {
        &self.routers
    }
    pub fn routers_mut(&mut self) -> &mut Vec<Router> {
        &mut self.routers
    }

    pub fn filters(&self) -> &Vec<Box<dyn Filter>> {
        &self.filters
    }
    pub fn filters_mut(&mut self) -> &mut Vec<Box<dyn Filter>> {
        &mut self.filters
    }

    pub fn detect(&self, req: &mut Request, path_state: &mut PathState) -> Option<DetectMatched> {
        for filter in &self.filters {
            if !filter.filter(req, path_state) {
                return None;
            }
        }

        let mut matched = None;
        if !self.routers.is_empty() {
            let original_cursor = path_state.cursor;
            let original_params = path_state.params.clone();
            for child in &self.routers {
                if let Some(dm) = child.detect(req, path_state) {
                    matched = Some(dm);
                    break;
                } else {
                    path_state.cursor = original_cursor;
                    path_state.params = original_params.clone();
                }
            }
        }
        if matched.is_none() && path_state.ended() {
            if let Some(handler) = &self.handler {
                matched = Some(DetectMatched {
                    handler: Arc::clone(handler),
                });
            }
        }

        if matched.is_some() {
            for (key, value) in &self.binds {
                path_state
                    .params
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        matched
    }

    pub fn push(mut self, router: Router) -> Self {
        self.routers.push(router);
        self
    }
    pub fn append(mut self, others: Vec<Router>) -> Self {
        let mut others = others;
        self.routers.append(&mut others);
        self
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Router::with_filter(PathFilter::new(path))
    }
    pub fn path(self, path: impl Into<String>) -> Self {
        self.filter(PathFilter::new(path))
    }

    pub fn with_filter(filter: impl Filter + Sized) -> Self {
        Router::new().filter(filter)
    }
    pub fn filter(mut self, filter: impl Filter + Sized) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
    /// Binds a route variable on this node.
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.binds.push((key.into(), value.into()));
        self
    }
    /// Shorthand for `bind("action", ...)`.
    pub fn action(self, action: impl Into<Action>) -> Self {
        let action = action.into();
        self.bind("action", action.as_str())
    }

    pub fn handle<H: Handler>(self, handler: H) -> Self {
        self.handle_shared(Arc::new(handler))
    }
    pub fn handle_shared(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }
    pub fn then<F>(self, func: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        func(self)
    }
    method_server!(get, post, put, delete, patch, head, options);

    /// The conventional resource routes for `collection`, all bound to one handler:
    ///
    /// | method | path                  | action |
    /// |--------|-----------------------|--------|
    /// | GET    | `collection`          | index  |
    /// | POST   | `collection`          | create |
    /// | GET    | `collection/new`      | new    |
    /// | GET    | `collection/<id>`     | show   |
    /// | PUT    | `collection/<id>`     | update |
    /// | DELETE | `collection/<id>`     | delete |
    /// | GET    | `collection/<id>/edit`| edit   |
    pub fn resource<H: Handler>(collection: impl Into<String>, handler: H) -> Self {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        let route = |method: MethodFilter, action: Action| {
            Router::with_filter(method)
                .action(action)
                .handle_shared(Arc::clone(&handler))
        };
        Router::with_path(collection)
            .push(Router::with_path("new").push(route(filter::get(), Action::New)))
            .push(
                Router::with_path("<id>")
                    .push(Router::with_path("edit").push(route(filter::get(), Action::Edit)))
                    .push(route(filter::get(), Action::Show))
                    .push(route(filter::put(), Action::Update))
                    .push(route(filter::delete(), Action::Delete)),
            )
            .push(route(filter::get(), Action::Index))
            .push(route(filter::post(), Action::Create))
    }
}

const SYMBOL_DOWN: &str = "│";
const SYMBOL_TEE: &str = "├";
const SYMBOL_ELL: &str = "└";
const SYMBOL_RIGHT: &str = "─";

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        fn print(f: &mut Formatter, prefix: &str, last: bool, router: &Router) -> fmt::Result {
            let mut path = "".to_owned();
            let mut others = Vec::with_capacity(router.filters.len());
            if router.filters.is_empty() {
                path = "!NULL!".to_owned();
            } else {
                for filter in &router.filters {
                    let info = format!("{:?}", filter);
                    match info.split_once(':') {
                        Some(("path", value)) => path = value.to_owned(),
                        Some((_, value)) => others.push(value.to_owned()),
                        None => others.push(info),
                    }
                }
            }
            for (key, value) in &router.binds {
                others.push(format!("{}={}", key, value));
            }
            let cp = if last {
                format!("{}{}{}{}", prefix, SYMBOL_ELL, SYMBOL_RIGHT, SYMBOL_RIGHT)
            } else {
                format!("{}{}{}{}", prefix, SYMBOL_TEE, SYMBOL_RIGHT, SYMBOL_RIGHT)
            };
            let hd = if let Some(handler) = &router.handler {
                format!(" -> {}", handler.type_name())
            } else {
                "".into()
            };
            if !others.is_empty() {
                writeln!(f, "{}{}[{}]{}", cp, path, others.join(","), hd)?;
            } else {
                writeln!(f, "{}{}{}", cp, path, hd)?;
            }
            let routers = router.routers();
            if !routers.is_empty() {
                let np = if last {
                    format!("{}    ", prefix)
                } else {
                    format!("{}{}   ", prefix, SYMBOL_DOWN)
                };
                for (i, router) in routers.iter().enumerate() {
                    print(f, &np, i == routers.len() - 1, router)?;
                }
            }
            Ok(())
        }
        print(f, "", true, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FnHandler;
    use crate::http::{Method, Response, StatusCode};

    fn fake() -> FnHandler<fn(&Request) -> Response> {
        FnHandler(|_req: &Request| Response::with_status_code(StatusCode::OK))
    }

    fn detect(router: &Router, method: Method, path: &str) -> Option<PathState> {
        let mut req = Request::new();
        *req.method_mut() = method;
        let mut state = PathState::new(path);
        router.detect(&mut req, &mut state).map(|_| state)
    }

    #[test]
    fn test_nested_paths() {
        let router = Router::default().push(
            Router::with_path("users")
                .push(Router::with_path("<id>").push(Router::with_path("emails").get(fake()))),
        );
        let state = detect(&router, Method::GET, "/users/12/emails").unwrap();
        assert_eq!(state.params["id"], "12");
        assert!(detect(&router, Method::GET, "/users/12").is_none());
        assert!(detect(&router, Method::POST, "/users/12/emails").is_none());
    }

    #[test]
    fn test_failed_branch_does_not_leak_params() {
        let router = Router::new()
            .push(Router::with_path("<a>/x").get(fake()))
            .push(Router::with_path("nodes").get(fake()));
        let state = detect(&router, Method::GET, "/nodes").unwrap();
        assert!(!state.params.contains_key("a"));
    }

    #[test]
    fn test_binds_do_not_override_path_params() {
        let router = Router::new()
            .bind("action", "index")
            .push(Router::with_path("<action>").get(fake()));
        let state = detect(&router, Method::GET, "/show").unwrap();
        assert_eq!(state.params["action"], "show");
    }

    #[test]
    fn test_resource_routes() {
        let router = Router::new().push(Router::resource("nodes", fake()));
        let cases = [
            (Method::GET, "/nodes", "index", None),
            (Method::POST, "/nodes", "create", None),
            (Method::GET, "/nodes/new", "new", None),
            (Method::GET, "/nodes/2B4C", "show", Some("2B4C")),
            (Method::PUT, "/nodes/2B4C", "update", Some("2B4C")),
            (Method::DELETE, "/nodes/2B4C", "delete", Some("2B4C")),
            (Method::GET, "/nodes/2B4C/edit", "edit", Some("2B4C")),
        ];
        for (method, path, action, id) in cases {
            let state = detect(&router, method.clone(), path)
                .unwrap_or_else(|| panic!("{} {} did not match", method, path));
            assert_eq!(state.params["action"], action, "{} {}", method, path);
            assert_eq!(state.params.get("id").map(String::as_str), id, "{} {}", method, path);
        }
        assert!(detect(&router, Method::PATCH, "/nodes/2B4C").is_none());
        assert!(detect(&router, Method::GET, "/nodes/2B4C/edit/more").is_none());
    }

    #[test]
    fn test_debug_tree() {
        let router = Router::new().push(Router::with_path("nodes").action("index").get(fake()));
        let tree = format!("{:?}", router);
        assert!(tree.contains("nodes[action=index]"));
        assert!(tree.contains("[GET]"));
    }
}
