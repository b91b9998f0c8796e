//! Address Resolver Adapter
//!
//! Answers IPv6 questions from `/proc/net/if_inet6`. A host without the
//! file, or with only loopback and link-local addresses, cannot satisfy
//! `prefer-ipv6`.

use crate::domain::ports::AddressResolver;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fs;
use std::net::Ipv6Addr;
use std::path::PathBuf;
use tracing::debug;

/// Kernel scope value for a globally routable address
const SCOPE_GLOBAL: u8 = 0;

pub struct ProcAddressResolver {
    proc_path: PathBuf,
}

impl ProcAddressResolver {
    pub fn new() -> Self {
        Self {
            proc_path: PathBuf::from("/proc/net/if_inet6"),
        }
    }

    /// Read from a different path (for testing)
    pub fn with_proc_path(proc_path: PathBuf) -> Self {
        Self { proc_path }
    }

    fn global_addresses(&self) -> Vec<Ipv6Addr> {
        let content = match fs::read_to_string(&self.proc_path) {
            Ok(content) => content,
            // No file means the kernel has no IPv6 stack at all
            Err(_) => return Vec::new(),
        };
        parse_if_inet6(&content)
    }
}

impl Default for ProcAddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressResolver for ProcAddressResolver {
    async fn supports_ipv6(&self) -> Result<bool> {
        let addresses = self.global_addresses();
        debug!(count = addresses.len(), "global ipv6 addresses found");
        Ok(!addresses.is_empty())
    }

    async fn ipv6_address(&self) -> Result<Ipv6Addr> {
        self.global_addresses()
            .into_iter()
            .next()
            .ok_or(Error::Ipv6Unsupported)
    }
}

/// Extract global-scope addresses from `/proc/net/if_inet6` content
///
/// Each line is: 32-hex address, ifindex, prefix length, scope, flags,
/// interface name.
fn parse_if_inet6(content: &str) -> Vec<Ipv6Addr> {
    let mut addresses = Vec::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }

        let Ok(scope) = u8::from_str_radix(fields[3], 16) else {
            continue;
        };
        if scope != SCOPE_GLOBAL {
            continue;
        }

        if let Some(address) = parse_hex_address(fields[0]) {
            addresses.push(address);
        }
    }
    addresses
}

fn parse_hex_address(hex: &str) -> Option<Ipv6Addr> {
    if hex.len() != 32 {
        return None;
    }
    u128::from_str_radix(hex, 16).ok().map(Ipv6Addr::from)
}
