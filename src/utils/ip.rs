//! 客户端 IP 提取
//!
//! - 配置了 `trusted_proxies` 且连接来自其中之一 → 使用 X-Forwarded-For / X-Real-IP
//! - 未配置时，连接来自私有地址或 localhost → 视为反向代理，使用转发头
//! - 其余情况使用连接 IP，防止伪造

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

fn parse_peer(peer: &str) -> Option<IpAddr> {
    peer.parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .or_else(|_| peer.parse::<IpAddr>())
        .ok()
}

pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let (Ok(prefix_len), Ok(network)) = (prefix_len.parse::<u32>(), network.parse::<IpAddr>())
    else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

pub fn is_trusted_proxy(ip: &IpAddr, trusted_proxies: &[String]) -> bool {
    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(ip, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| &p == ip)
        }
    })
}

/// 从请求头提取转发 IP（X-Forwarded-For 第一个，其次 X-Real-IP）
pub fn forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

/// 根据连接地址与请求头决定客户端 IP
pub fn resolve_client_ip(
    peer: Option<&str>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> Option<String> {
    let Some(peer) = peer else {
        return forwarded_ip_from_headers(headers);
    };
    let Some(peer_ip) = parse_peer(peer) else {
        return Some(peer.to_string());
    };

    let trust_forwarded = if trusted_proxies.is_empty() {
        is_private_or_local(&peer_ip)
    } else {
        is_trusted_proxy(&peer_ip, trusted_proxies)
    };

    if trust_forwarded && let Some(real_ip) = forwarded_ip_from_headers(headers) {
        debug!("Forwarded client IP via proxy {}: {}", peer_ip, real_ip);
        return Some(real_ip);
    }
    Some(peer_ip.to_string())
}

pub fn extract_client_ip(req: &HttpRequest, trusted_proxies: &[String]) -> Option<String> {
    let peer = req.peer_addr().map(|addr| addr.to_string());
    resolve_client_ip(peer.as_deref(), req.headers(), trusted_proxies)
}
