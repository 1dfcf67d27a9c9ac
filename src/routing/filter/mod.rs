//! Rule predicates: HTTP method and path pattern.

mod path;

use std::fmt;

use crate::http::{Method, Request};
use crate::routing::PathState;

pub use path::*;

/// A predicate a [`Router`](super::Router) node checks before descending.
///
/// A filter that matches may consume path segments from `path`; one that
/// does not match leaves it as it was.
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    fn filter(&self, req: &mut Request, path: &mut PathState) -> bool;
}

/// Matches requests by method and consumes nothing.
#[derive(Clone, PartialEq, Eq)]
pub struct MethodFilter(pub Method);

impl Filter for MethodFilter {
    fn filter(&self, req: &mut Request, _path: &mut PathState) -> bool {
        req.method() == self.0
    }
}
impl fmt::Debug for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method:{}", self.0)
    }
}

macro_rules! method_filters {
    ($($name:ident => $method:ident),+) => {
        $(
            pub fn $name() -> MethodFilter {
                MethodFilter(Method::$method)
            }
        )+
    };
}
method_filters!(
    get => GET,
    head => HEAD,
    options => OPTIONS,
    post => POST,
    patch => PATCH,
    put => PUT,
    delete => DELETE
);
