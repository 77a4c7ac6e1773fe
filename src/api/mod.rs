//! Session administration API.
//!
//! Four verbs on `/` beneath the admin base URI:
//!
//! | verb   | header                    | success                          | failure |
//! |--------|---------------------------|----------------------------------|---------|
//! | POST   | `X-Session-ID` (optional) | 201, `X-Session-ID`, `Location`  | -       |
//! | DELETE | `X-Session-ID`            | 204                              | 404     |
//! | PUT    | `X-Session-ID`            | 205                              | 404     |
//! | GET    | `X-Session-ID`            | -                                | 500     |

use crate::domain::errors::SessionError;
use crate::domain::session::{SessionId, SessionManager};
use crate::infrastructure::server_impl::headers::HeaderMap;
use crate::infrastructure::server_impl::request::RequestView;
use crate::infrastructure::server_impl::response::{Response, StatusCode};
use crate::infrastructure::server_impl::router::{Method, RouteRegistry, RouteTable, Service};
use crate::infrastructure::server_impl::server::normalize_base_uri;
use crate::AnyResult;
use compact_str::{format_compact, CompactString};
use tracing::Span;

pub const SESSION_ID_HEADER: &str = "x-session-id";
pub const LOCATION_HEADER: &str = "location";

#[derive(Debug)]
pub struct AdminService<M> {
    manager: M,
    base_uri: CompactString,
    routes: RouteTable<Self>,
    span: Span,
}

impl<M: SessionManager> AdminService<M> {
    pub fn new(manager: M, base_uri: &str) -> Self {
        let base = normalize_base_uri(base_uri);
        let span = tracing::debug_span!("admin", base_uri = base);
        Self::with_span(manager, base_uri, span)
    }

    /// Like [AdminService::new], logging every handler inside `span`.
    pub fn with_span(manager: M, base_uri: &str, span: Span) -> Self {
        let mut routes = RouteTable::<Self>::new();
        routes.register(Method::DELETE, "/", Self::remove_session);
        routes.register(Method::POST, "/", Self::create_session);
        routes.register(Method::PUT, "/", Self::reset_session);
        routes.register(Method::GET, "/", Self::get_session_info);

        Self {
            manager,
            base_uri: normalize_base_uri(base_uri).into(),
            routes,
            span,
        }
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn routes(&self) -> &RouteTable<Self> {
        &self.routes
    }

    pub fn helper_get_session_id(&self, headers: &HeaderMap) -> Option<SessionId> {
        let session_id = headers.get(SESSION_ID_HEADER).map(SessionId::from);
        if session_id.is_none() {
            tracing::debug!("x-session-id not in headers");
        }

        tracing::debug!(?session_id, "found session id");
        session_id
    }

    /// Session resource URL, `{base_uri}/{session_id}/`.
    pub fn helper_get_uri(&self, session_id: &str) -> CompactString {
        tracing::debug!(base_uri = %self.base_uri, session_id, "building session uri");
        format_compact!("{}/{}/", self.base_uri, session_id)
    }

    pub fn create_session(
        &self,
        _request: &RequestView<'_, '_>,
        _uri: &str,
        headers: &HeaderMap,
    ) -> AnyResult<Response> {
        let _entered = self.span.enter();

        let requested = self.helper_get_session_id(headers);
        tracing::debug!(?requested, "requested session id");

        let session_id = self.manager.create_session(requested.as_ref().map(|c| c.as_str()));
        tracing::info!(%session_id, "created session");

        let mut outbound = headers.clone();
        outbound.insert(SESSION_ID_HEADER, session_id.as_str());
        outbound.insert(LOCATION_HEADER, self.helper_get_uri(&session_id));

        Ok(Response::from_status_code(StatusCode::Created, "").with_headers(outbound))
    }

    pub fn remove_session(
        &self,
        _request: &RequestView<'_, '_>,
        _uri: &str,
        headers: &HeaderMap,
    ) -> AnyResult<Response> {
        let _entered = self.span.enter();

        let session_id = self.helper_get_session_id(headers);
        let result = self.manager.remove_session(session_id.as_ref().map(|c| c.as_str()));
        self.respond(result, StatusCode::NoContent, headers, "removed session")
    }

    pub fn reset_session(
        &self,
        _request: &RequestView<'_, '_>,
        _uri: &str,
        headers: &HeaderMap,
    ) -> AnyResult<Response> {
        let _entered = self.span.enter();

        let session_id = self.helper_get_session_id(headers);
        let result = self.manager.reset_session(session_id.as_ref().map(|c| c.as_str()));
        self.respond(result, StatusCode::ResetContent, headers, "reset session")
    }

    /// Placeholder: answers 500 whatever the input.
    pub fn get_session_info(
        &self,
        _request: &RequestView<'_, '_>,
        _uri: &str,
        headers: &HeaderMap,
    ) -> AnyResult<Response> {
        let _entered = self.span.enter();

        tracing::debug!(session_id = headers.get(SESSION_ID_HEADER), "session info requested");
        Ok(
            Response::from_status_code(StatusCode::InternalServerError, "Not Implemented")
                .with_headers(headers.clone()),
        )
    }

    fn respond(
        &self,
        result: Result<(), SessionError>,
        success: StatusCode,
        headers: &HeaderMap,
        action: &str,
    ) -> AnyResult<Response> {
        let (status, body) = match result {
            Ok(()) => {
                tracing::info!(session_id = headers.get(SESSION_ID_HEADER), "{action}");
                (success, String::new())
            }
            Err(err @ SessionError::InvalidSessionId(_)) => {
                tracing::debug!(%err, "rejecting session request");
                (StatusCode::NotFound, err.to_string())
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Response::from_status_code(status, body).with_headers(headers.clone()))
    }
}

impl<M: SessionManager> Service for AdminService<M> {
    fn name(&self) -> &str {
        "admin"
    }

    fn handle(
        &self,
        request: &RequestView<'_, '_>,
        uri: &str,
        headers: &HeaderMap,
    ) -> AnyResult<Response> {
        self.routes.dispatch(self, request, uri, headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::LocalSessionManager;
    use crate::infrastructure::server_impl::environ::{keys, Environ};
    use std::sync::Arc;

    fn service() -> (Arc<LocalSessionManager>, AdminService<Arc<LocalSessionManager>>) {
        let manager = Arc::new(LocalSessionManager::new());
        let admin = AdminService::new(manager.clone(), "/admin/");
        (manager, admin)
    }

    fn call<M: SessionManager>(
        admin: &AdminService<M>,
        method: &str,
        headers: &[(&str, &str)],
    ) -> Response {
        let environ = Environ::new(b"")
            .with(keys::REQUEST_METHOD, method)
            .with(keys::PATH_INFO, "/admin/");
        let request = RequestView::new(&environ);
        let headers: HeaderMap = headers.iter().copied().collect();
        admin.handle(&request, "/", &headers).unwrap()
    }

    #[test]
    fn registers_four_verbs_on_root() {
        let (_, admin) = service();
        let routes = admin.routes();

        assert_eq!(routes.len(), 4);
        for method in [Method::DELETE, Method::POST, Method::PUT, Method::GET] {
            assert!(routes.get(method, "/").is_some(), "{method:?} missing");
        }
        assert!(routes.get(Method::PATCH, "/").is_none());
    }

    #[test]
    fn base_uri_is_normalized() {
        let manager = LocalSessionManager::new();
        for base in ["/admin/", "admin", "admin/", "/admin"] {
            let admin = AdminService::new(&manager, base);
            assert_eq!(admin.base_uri(), "admin");
            assert_eq!(admin.helper_get_uri("123"), "admin/123/");
        }
    }

    #[test]
    fn session_id_header_is_case_insensitive() {
        let (_, admin) = service();
        let headers: HeaderMap = [("X-Session-ID", "abc")].into_iter().collect();

        assert_eq!(
            admin.helper_get_session_id(&headers),
            Some(SessionId::from("abc"))
        );
        assert_eq!(admin.helper_get_session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn create_session_without_id() {
        let (manager, admin) = service();
        let response = call(&admin, "POST", &[]);

        assert_eq!(response.status(), 201);
        assert_eq!(response.body, "");

        let session_id = response.headers.get("X-Session-ID").unwrap();
        assert!(manager.contains(session_id));
        assert_eq!(
            response.headers.get("Location"),
            Some(format!("admin/{session_id}/").as_str())
        );
    }

    #[test]
    fn create_session_with_requested_id() {
        let (manager, admin) = service();
        let response = call(&admin, "POST", &[("X-Session-ID", "happy-days"), ("Accept", "*/*")]);

        assert_eq!(response.status(), 201);
        assert_eq!(response.headers.get("x-session-id"), Some("happy-days"));
        assert_eq!(response.headers.get("location"), Some("admin/happy-days/"));
        // inbound headers are echoed back
        assert_eq!(response.headers.get("accept"), Some("*/*"));
        assert!(manager.contains("happy-days"));
    }

    #[test]
    fn remove_session() {
        let (manager, admin) = service();
        manager.create_session(Some("abc"));

        let response = call(&admin, "DELETE", &[("x-session-id", "abc")]);
        assert_eq!(response.status(), 204);
        assert_eq!(response.body, "");
        assert!(!manager.contains("abc"));
    }

    #[test]
    fn remove_unknown_session() {
        let (_, admin) = service();

        let response = call(&admin, "DELETE", &[("X-Session-ID", "nope")]);
        assert_eq!(response.status(), 404);
        assert_eq!(response.body, SessionError::invalid(Some("nope")).to_string());

        let response = call(&admin, "DELETE", &[]);
        assert_eq!(response.status(), 404);
        assert_eq!(response.body, SessionError::invalid(None).to_string());
    }

    #[test]
    fn reset_session() {
        let (manager, admin) = service();
        manager.create_session(Some("abc"));

        let response = call(&admin, "PUT", &[("X-Session-ID", "abc")]);
        assert_eq!(response.status(), 205);
        assert_eq!(response.body, "");
        assert!(manager.contains("abc"));
        assert_eq!(manager.session("abc").unwrap().resets, 1);

        let response = call(&admin, "DELETE", &[("X-Session-ID", "abc")]);
        assert_eq!(response.status(), 204);
    }

    #[test]
    fn reset_unknown_session() {
        let (_, admin) = service();

        let response = call(&admin, "PUT", &[("X-Session-ID", "nope")]);
        assert_eq!(response.status(), 404);
        assert_eq!(response.body, "Invalid Session ID: nope");
    }

    #[test]
    fn get_session_info_is_not_implemented() {
        let (manager, admin) = service();
        manager.create_session(Some("abc"));

        for headers in [&[][..], &[("X-Session-ID", "abc")][..]] {
            let response = call(&admin, "GET", headers);
            assert_eq!(response.status(), 500);
            assert_eq!(response.body, "Not Implemented");
        }
    }

    #[derive(Debug)]
    struct Broken;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct DiskOnFire;

    impl SessionManager for Broken {
        fn create_session(&self, _: Option<&str>) -> SessionId {
            SessionId::from("broken")
        }

        fn remove_session(&self, _: Option<&str>) -> Result<(), SessionError> {
            Err(SessionError::Backend(Box::new(DiskOnFire)))
        }

        fn reset_session(&self, _: Option<&str>) -> Result<(), SessionError> {
            Err(SessionError::Backend(Box::new(DiskOnFire)))
        }
    }

    #[test]
    fn other_manager_errors_propagate() {
        let admin = AdminService::new(Broken, "admin");
        let environ = Environ::new(b"").with(keys::REQUEST_METHOD, "DELETE");
        let request = RequestView::new(&environ);
        let headers: HeaderMap = [("X-Session-ID", "abc")].into_iter().collect();

        let err = admin.handle(&request, "/", &headers).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::Backend(_))
        ));

        let environ = Environ::new(b"").with(keys::REQUEST_METHOD, "PUT");
        let request = RequestView::new(&environ);
        assert!(admin.handle(&request, "/", &headers).is_err());
    }
}
