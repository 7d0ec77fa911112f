//! Client IP resolution.
//!
//! # Responsibilities
//! - Prefer the first address in X-Forwarded-For
//! - Fall back to the transport-level peer address
//! - Normalize IPv4-mapped IPv6 addresses to bare IPv4
//!
//! # Design Decisions
//! - A malformed forwarded header falls through to the peer address
//! - Resolution is pure over (headers, peer) for unit testing

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use std::net::{IpAddr, SocketAddr};

/// The resolved caller address, attached to request extensions by the IP
/// gate for the rest of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Resolve the caller's IP for a request.
pub fn resolve(req: &Request<Body>) -> Option<IpAddr> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    from_parts(req.headers(), peer)
}

/// Resolution over the raw parts.
pub fn from_parts(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    forwarded.or(peer).map(normalize)
}

/// Collapse an IPv4-mapped IPv6 address (::ffff:a.b.c.d) to bare IPv4.
pub fn normalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => ip,
        },
        IpAddr::V4(_) => ip,
    }
}
