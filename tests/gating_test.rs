//! End-to-end tests of the gating chain: route classification, credential
//! verification, tenant isolation, and IP escalation.

use axum::body::Body;
use axum::http::StatusCode;

use gatekeeper::config::Mode;
use gatekeeper::security::{EventKind, Severity};

mod common;
use common::{config, gate, get, request, send, token, token_with_exp};

#[tokio::test]
async fn public_route_admits_without_credential() {
    // Scenario D.
    let g = gate(config(Mode::Production));
    let (status, body) = get(&g.router, "/health", "198.51.100.1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let report = g.state.detector.report();
    assert_eq!(report.events_by_type[&EventKind::PublicRouteAccess], 1);
    assert!(!report.events_by_type.contains_key(&EventKind::FailedAuth));
    assert!(!report.events_by_type.contains_key(&EventKind::AuthFailure));
}

#[tokio::test]
async fn missing_credential_is_401_never_403() {
    let g = gate(config(Mode::Production));
    let (status, body) = get(&g.router, "/api/profile", "198.51.100.2", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "AUTHENTICATION_REQUIRED");

    let report = g.state.detector.report();
    assert_eq!(report.events_by_type[&EventKind::FailedAuth], 1);
    // The audit stage independently records the 401 outcome.
    assert_eq!(report.events_by_type[&EventKind::AuthFailure], 1);
}

#[tokio::test]
async fn garbage_token_is_401_invalid_token() {
    let g = gate(config(Mode::Production));
    let (status, body) =
        get(&g.router, "/api/profile", "198.51.100.3", Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
    assert_eq!(
        g.state.detector.report().events_by_type[&EventKind::TokenInvalid],
        1
    );
}

#[tokio::test]
async fn expired_token_is_distinct_event_same_response() {
    let g = gate(config(Mode::Production));
    let expired = token_with_exp(
        "user-1",
        "company-a",
        "member",
        chrono::Utc::now().timestamp() - 3600,
    );
    let (status, body) = get(&g.router, "/api/profile", "198.51.100.4", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");

    let report = g.state.detector.report();
    assert_eq!(report.events_by_type[&EventKind::TokenExpired], 1);
    assert!(!report.events_by_type.contains_key(&EventKind::TokenInvalid));
}

#[tokio::test]
async fn valid_token_reaches_handler_with_identity() {
    let g = gate(config(Mode::Production));
    let t = token("user-1", "company-a", "member");
    let (status, body) = get(&g.router, "/api/profile", "198.51.100.5", Some(&t)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "user-1");
    assert_eq!(body["company_id"], "company-a");
    assert_eq!(
        g.state.detector.report().events_by_type[&EventKind::SuccessfulAuth],
        1
    );
}

#[tokio::test]
async fn admin_route_requires_privileged_role() {
    let g = gate(config(Mode::Production));
    let member = token("user-1", "company-a", "member");
    let (status, body) = get(
        &g.router,
        "/admin/security/report",
        "198.51.100.6",
        Some(&member),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ADMIN_ACCESS_REQUIRED");
    assert_eq!(
        g.state.detector.report().events_by_type[&EventKind::UnauthorizedAdminAccess],
        1
    );

    let admin = token("root", "company-ops", "admin");
    let (status, body) = get(
        &g.router,
        "/admin/security/report",
        "198.51.100.6",
        Some(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["total_events"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn tenant_mismatch_is_denied_with_one_critical_event() {
    // Scenario C.
    let mut g = gate(config(Mode::Production));
    let t = token("user-1", "company-a", "member");
    let (status, body) = get(
        &g.router,
        "/api/companies/company-b/orders",
        "198.51.100.7",
        Some(&t),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "COMPANY_ACCESS_DENIED");

    let report = g.state.detector.report();
    assert_eq!(report.events_by_type[&EventKind::CompanyViolation], 1);
    assert_eq!(report.recent_critical_events.len(), 1);
    let violation = &report.recent_critical_events[0];
    assert_eq!(violation.kind, EventKind::CompanyViolation);
    assert_eq!(violation.severity, Severity::Critical);
    assert_eq!(violation.tenant_id.as_deref(), Some("company-a"));
    assert_eq!(violation.extra["named_tenant"], "company-b");
    assert_eq!(violation.user_id.as_deref(), Some("user-1"));

    // The CRITICAL event was also forwarded to the durable sink channel.
    let forwarded = g.critical_rx.try_recv().unwrap();
    assert_eq!(forwarded.kind, EventKind::CompanyViolation);
}

#[tokio::test]
async fn tenant_match_is_admitted_with_context() {
    let g = gate(config(Mode::Production));
    let t = token("user-1", "company-a", "member");
    let (status, body) = get(
        &g.router,
        "/api/companies/company-a/orders",
        "198.51.100.8",
        Some(&t),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant_context"], "company-a");
    assert_eq!(
        g.state.detector.report().events_by_type[&EventKind::CompanyAccessGranted],
        1
    );
}

#[tokio::test]
async fn privileged_role_crosses_tenants() {
    let g = gate(config(Mode::Production));
    let t = token("root", "company-ops", "admin");
    let (status, _) = get(
        &g.router,
        "/api/companies/company-b/orders",
        "198.51.100.9",
        Some(&t),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report = g.state.detector.report();
    assert!(!report.events_by_type.contains_key(&EventKind::CompanyViolation));
}

#[tokio::test]
async fn named_tenant_in_query_is_checked() {
    let g = gate(config(Mode::Production));
    let t = token("user-1", "company-a", "member");
    let (status, body) = get(
        &g.router,
        "/api/orders?company_id=company-b",
        "198.51.100.10",
        Some(&t),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "COMPANY_ACCESS_DENIED");
}

#[tokio::test]
async fn repeated_auth_failures_escalate_and_block() {
    // Scenarios A and B over the wire.
    let g = gate(config(Mode::Production));
    let ip = "9.9.9.9";
    let addr: std::net::IpAddr = ip.parse().unwrap();

    for _ in 0..9 {
        let (status, _) = get(&g.router, "/api/profile", ip, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert!(!g.state.detector.is_suspicious(addr));

    let (status, _) = get(&g.router, "/api/profile", ip, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(g.state.detector.is_suspicious(addr));
    assert!(!g.state.detector.is_blocked(addr));

    for _ in 0..10 {
        get(&g.router, "/api/profile", ip, None).await;
    }
    assert!(g.state.detector.is_blocked(addr));

    // The next request is rejected by the IP gate before authentication.
    let (status, body) = get(&g.router, "/api/profile", ip, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "IP_BLOCKED");
    let report = g.state.detector.report();
    assert_eq!(report.events_by_type[&EventKind::BlockedIpAttempt], 1);
    assert!(report.blocked_ips.contains(&addr));
}

#[tokio::test]
async fn development_mode_always_admits_loopback() {
    // Scenario E.
    let g = gate(config(Mode::Development));
    let addr: std::net::IpAddr = "127.0.0.1".parse().unwrap();
    for _ in 0..25 {
        g.state.detector.record(
            gatekeeper::security::SecurityEvent::new(EventKind::FailedAuth).ip(addr),
        );
    }
    assert!(g.state.detector.is_blocked(addr));

    let (status, _) = get(&g.router, "/health", "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn development_mode_never_rejects_non_loopback() {
    let g = gate(config(Mode::Development));
    let addr: std::net::IpAddr = "198.51.100.11".parse().unwrap();
    for _ in 0..25 {
        g.state.detector.record(
            gatekeeper::security::SecurityEvent::new(EventKind::FailedAuth).ip(addr),
        );
    }
    assert!(g.state.detector.is_blocked(addr));

    let (status, _) = get(&g.router, "/health", "198.51.100.11", None).await;
    assert_eq!(status, StatusCode::OK);
    // The access was still observed as suspicious.
    let report = g.state.detector.report();
    assert_eq!(report.events_by_type[&EventKind::SuspiciousIpAccess], 1);
}

#[tokio::test]
async fn sweep_amnesties_blocked_ip() {
    let g = gate(config(Mode::Production));
    let ip = "9.9.9.9";
    let addr: std::net::IpAddr = ip.parse().unwrap();
    for _ in 0..20 {
        get(&g.router, "/api/profile", ip, None).await;
    }
    assert!(g.state.detector.is_blocked(addr));

    g.state.detector.sweep();
    assert!(!g.state.detector.is_blocked(addr));

    // Admission is restored: the request reaches authentication again
    // instead of being rejected at the gate.
    let (status, body) = get(&g.router, "/api/profile", ip, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_REQUIRED");
}

#[tokio::test]
async fn admin_can_unblock_an_ip() {
    let g = gate(config(Mode::Production));
    let addr: std::net::IpAddr = "203.0.113.50".parse().unwrap();
    for _ in 0..25 {
        g.state.detector.record(
            gatekeeper::security::SecurityEvent::new(EventKind::FailedAuth).ip(addr),
        );
    }
    assert!(g.state.detector.is_blocked(addr));

    let admin = token("root", "company-ops", "admin");
    let req = request("POST", "/admin/security/unblock", "198.51.100.12")
        .header("authorization", format!("Bearer {admin}"))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"ip":"203.0.113.50"}"#))
        .unwrap();
    let (status, body) = send(&g.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
    assert!(!g.state.detector.is_blocked(addr));
}

#[tokio::test]
async fn remediation_requires_privileged_role() {
    let g = gate(config(Mode::Production));
    let member = token("user-1", "company-a", "member");
    let req = request("POST", "/admin/security/blocks/clear", "198.51.100.13")
        .header("authorization", format!("Bearer {member}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&g.router, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ADMIN_ACCESS_REQUIRED");
}

#[tokio::test]
async fn admin_clear_blocks_resets_escalation() {
    let g = gate(config(Mode::Production));
    let addr: std::net::IpAddr = "203.0.113.51".parse().unwrap();
    for _ in 0..25 {
        g.state.detector.record(
            gatekeeper::security::SecurityEvent::new(EventKind::FailedAuth).ip(addr),
        );
    }

    let admin = token("root", "company-ops", "admin");
    let req = request("POST", "/admin/security/blocks/clear", "198.51.100.14")
        .header("authorization", format!("Bearer {admin}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&g.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared_blocked"].as_u64().unwrap(), 1);
    assert!(!g.state.detector.is_blocked(addr));
    assert!(!g.state.detector.is_suspicious(addr));
}

#[tokio::test]
async fn json_body_naming_another_tenant_is_denied() {
    let g = gate(config(Mode::Production));
    let t = token("user-1", "company-a", "member");
    let req = request("POST", "/api/orders", "198.51.100.15")
        .header("authorization", format!("Bearer {t}"))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"companyId":"company-b","total":42}"#))
        .unwrap();
    let (status, body) = send(&g.router, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "COMPANY_ACCESS_DENIED");
}
