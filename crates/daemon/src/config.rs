// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven daemon configuration, loaded once at startup.

use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub admin_token: String,
    pub worker_enabled: bool,
    pub worker_pid: u32,
    pub worker_tick_interval_seconds: u64,
    pub worker_env: String,
    pub worker_lane: String,
    pub http_addr: SocketAddr,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("FORGE_DB_PATH must be set")]
    MissingDbPath,
    #[error("invalid AUTONOMY_V2_HTTP_ADDR: {0}")]
    InvalidHttpAddr(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var("FORGE_DB_PATH").map_err(|_| ConfigError::MissingDbPath)?;
        let admin_token = std::env::var("ADMIN_TOKEN").unwrap_or_default();
        let worker_enabled = env_bool("AUTONOMY_V2_WORKER_ENABLED", false);
        let worker_pid = env_u32("AUTONOMY_V2_WORKER_PID", 0);
        let worker_tick_interval_seconds = env_u64("AUTONOMY_V2_WORKER_TICK_INTERVAL_SECONDS", 3);
        let worker_env = std::env::var("AUTONOMY_V2_WORKER_ENV").unwrap_or_else(|_| "local".to_string());
        let worker_lane = std::env::var("AUTONOMY_V2_WORKER_LANE").unwrap_or_else(|_| "default".to_string());
        let http_addr_str = std::env::var("AUTONOMY_V2_HTTP_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8099".to_string());
        let http_addr = http_addr_str
            .parse()
            .map_err(|_| ConfigError::InvalidHttpAddr(http_addr_str))?;

        Ok(Self {
            db_path,
            admin_token,
            worker_enabled,
            worker_pid,
            worker_tick_interval_seconds,
            worker_env,
            worker_lane,
            http_addr,
        })
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
