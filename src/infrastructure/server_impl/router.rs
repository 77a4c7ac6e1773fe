use crate::infrastructure::server_impl::headers::HeaderMap;
use crate::infrastructure::server_impl::request::RequestView;
use crate::infrastructure::server_impl::response::{Response, StatusCode};
use crate::AnyResult;
use compact_str::CompactString;
use fnv::FnvHashMap;
use std::fmt;
use strum::{EnumString, IntoStaticStr};

#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
pub enum Method {
    CONNECT,
    DELETE,
    GET,
    HEAD,
    OPTIONS,
    PATCH,
    POST,
    PUT,
    TRACE,
}

/// Handler signature for a registered route: the service itself, the request,
/// the URI relative to the service mount point and the inbound headers.
pub type Handler<S> = fn(&S, &RequestView<'_, '_>, &str, &HeaderMap) -> AnyResult<Response>;

/// Registration primitive services use to announce their routes.
pub trait RouteRegistry<S> {
    fn register(&mut self, method: Method, path: &str, handler: Handler<S>);
}

/// Something a gateway can hand requests to.
pub trait Service {
    fn name(&self) -> &str;

    fn handle(
        &self,
        request: &RequestView<'_, '_>,
        uri: &str,
        headers: &HeaderMap,
    ) -> AnyResult<Response>;
}

/// Exact-match `(method, path)` table. No patterns, no prefixes.
pub struct RouteTable<S> {
    routes: FnvHashMap<(Method, CompactString), Handler<S>>,
}

impl<S> Default for RouteTable<S> {
    fn default() -> Self {
        Self {
            routes: Default::default(),
        }
    }
}

impl<S> fmt::Debug for RouteTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.keys()).finish()
    }
}

impl<S> RouteRegistry<S> for RouteTable<S> {
    fn register(&mut self, method: Method, path: &str, handler: Handler<S>) {
        if self.routes.insert((method, path.into()), handler).is_some() {
            tracing::warn!(?method, path, "route registered twice, keeping the latest");
        }
    }
}

impl<S> RouteTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, method: Method, path: &str) -> Option<Handler<S>> {
        self.routes.get(&(method, CompactString::from(path))).copied()
    }

    /// Looks the route up and runs it. Unknown paths answer 404, known paths
    /// under another verb answer 405.
    pub fn dispatch(
        &self,
        service: &S,
        request: &RequestView<'_, '_>,
        uri: &str,
        headers: &HeaderMap,
    ) -> AnyResult<Response> {
        let Ok(method) = request.method().parse::<Method>() else {
            return Ok(Response::from_status_code(
                StatusCode::MethodNotAllowed,
                "method not allowed",
            ));
        };

        if let Some(handler) = self.get(method, uri) {
            return handler(service, request, uri, headers);
        }

        let path_known = self.routes.keys().any(|(_, path)| path.as_str() == uri);
        let response = if path_known {
            Response::from_status_code(StatusCode::MethodNotAllowed, "method not allowed")
        } else {
            Response::from_status_code(StatusCode::NotFound, "route not found")
        };

        tracing::debug!(?method, uri, status = response.status(), "no route matched");
        Ok(response)
    }
}
