//! Tenant isolation guard.
//!
//! On tenant-isolated routes the caller may only touch its own tenant's
//! data. The target tenant can be named in the path, the query string, or a
//! JSON body; a mismatch by a non-privileged caller is the one event in
//! this gateway that is always CRITICAL.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::client_ip::ClientIp;
use crate::http::error::GateError;
use crate::http::middleware::authn::Identity;
use crate::http::server::AppState;
use crate::routing::RouteClass;
use crate::security::events::{EventKind, SecurityEvent};

/// Caller's tenant, attached for downstream handlers on isolated routes.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: String,
}

/// JSON bodies larger than this contribute no named tenant.
const MAX_INSPECTED_BODY: usize = 1024 * 1024;

pub async fn tenant_guard_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let class = state.classifier.classify(req.method(), req.uri().path());
    if class != RouteClass::TenantIsolated {
        return next.run(req).await;
    }

    let ip = req.extensions().get::<ClientIp>().map(|c| c.0);
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Defensive: authn runs first and attaches identity on every
    // non-public route, so this should be unreachable.
    let Some(identity) = req.extensions().get::<Identity>().cloned() else {
        state.detector.record(
            SecurityEvent::new(EventKind::CompanyIsolationFailure)
                .maybe_ip(ip)
                .method(&method)
                .path(&path),
        );
        return GateError::TenantMissing.into_response();
    };

    req.extensions_mut().insert(TenantContext {
        tenant_id: identity.tenant_id.clone(),
    });

    // The privileged role may operate across tenants.
    if identity.role == state.config.auth.privileged_role {
        return next.run(req).await;
    }

    let (req, named) = named_tenant(req).await;
    let Some(named) = named else {
        return next.run(req).await;
    };

    if named != identity.tenant_id {
        tracing::error!(
            user_id = %identity.user_id,
            caller_tenant = %identity.tenant_id,
            named_tenant = %named,
            %path,
            "cross-tenant access attempt"
        );
        state.detector.record(
            SecurityEvent::new(EventKind::CompanyViolation)
                .maybe_ip(ip)
                .method(&method)
                .path(&path)
                .user_id(identity.user_id.clone())
                .tenant_id(identity.tenant_id.clone())
                .extra(serde_json::json!({ "named_tenant": named })),
        );
        return GateError::TenantMismatch.into_response();
    }

    state.detector.record(
        SecurityEvent::new(EventKind::CompanyAccessGranted)
            .maybe_ip(ip)
            .method(&method)
            .path(&path)
            .user_id(identity.user_id.clone())
            .tenant_id(identity.tenant_id.clone()),
    );
    next.run(req).await
}

/// Find an explicitly named target tenant: path segment after
/// `/companies/`, then a `company_id` query parameter, then a JSON body
/// field. Body inspection buffers and reinstates the body.
async fn named_tenant(req: Request<Body>) -> (Request<Body>, Option<String>) {
    if let Some(id) = path_company_id(req.uri().path()) {
        return (req, Some(id));
    }
    if let Some(id) = query_company_id(req.uri().query()) {
        return (req, Some(id));
    }

    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return (req, None);
    }

    let (parts, body) = req.into_parts();
    match axum::body::to_bytes(body, MAX_INSPECTED_BODY).await {
        Ok(bytes) => {
            let named = serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .and_then(|v| {
                    v.get("companyId")
                        .or_else(|| v.get("company_id"))
                        .and_then(|x| x.as_str())
                        .map(String::from)
                });
            (Request::from_parts(parts, Body::from(bytes)), named)
        }
        // Oversized or unreadable body: no named tenant, empty body onward.
        Err(_) => (Request::from_parts(parts, Body::empty()), None),
    }
}

fn path_company_id(path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "companies" {
            return segments.next().map(String::from);
        }
    }
    None
}

fn query_company_id(query: Option<&str>) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == "company_id" || k == "companyId").then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_id_from_path() {
        assert_eq!(
            path_company_id("/api/companies/company-a/orders"),
            Some("company-a".into())
        );
        assert_eq!(path_company_id("/api/companies"), None);
        assert_eq!(path_company_id("/api/orders"), None);
    }

    #[test]
    fn company_id_from_query() {
        assert_eq!(
            query_company_id(Some("page=1&company_id=company-b")),
            Some("company-b".into())
        );
        assert_eq!(
            query_company_id(Some("companyId=company-c")),
            Some("company-c".into())
        );
        assert_eq!(query_company_id(Some("page=1")), None);
        assert_eq!(query_company_id(None), None);
    }

    #[tokio::test]
    async fn company_id_from_json_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/orders")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"companyId":"company-d","total":10}"#))
            .unwrap();
        let (req, named) = named_tenant(req).await;
        assert_eq!(named, Some("company-d".into()));

        // Body is reinstated for the downstream handler.
        let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_untouched() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/orders")
            .body(Body::from("plain text"))
            .unwrap();
        let (_, named) = named_tenant(req).await;
        assert_eq!(named, None);
    }
}
