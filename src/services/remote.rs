//! Link lookup through a remote link service
//!
//! `GET {base}/api/links/{code}` returning the `{code, message, data}` envelope.
//! Blocking ureq calls run on `spawn_blocking`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use ureq::Agent;

use super::redirect::LinkLookup;
use super::types::LinkDetail;
use crate::errors::{Result, ShortUrlError};
use crate::storage::ShortLinkRecord;
use crate::utils::is_valid_short_code;

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i32,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<LinkDetail>,
}

pub struct RemoteLinkLookup {
    agent: Agent,
    base_url: String,
}

impl RemoteLinkLookup {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_sync(agent: Agent, url: String, code: String) -> Result<ShortLinkRecord> {
        let resp = match agent.get(&url).call() {
            Ok(resp) => resp,
            // 任何非成功状态都视为不存在；只有传输失败才算不可用
            Err(ureq::Error::StatusCode(status)) => {
                if status >= 500 {
                    warn!("Remote lookup {} returned HTTP {}", url, status);
                } else {
                    debug!("Remote lookup {} returned HTTP {}", url, status);
                }
                return Err(ShortUrlError::not_found(format!("短链接不存在: {}", code)));
            }
            Err(e) => {
                warn!("Remote lookup {} failed: {}", url, e);
                return Err(ShortUrlError::unavailable(format!(
                    "链接服务不可用: {}",
                    e
                )));
            }
        };

        let envelope: Envelope = resp.into_body().read_json().map_err(|e| {
            ShortUrlError::serialization(format!("远程响应解析失败: {}", e))
        })?;

        match envelope.data {
            Some(detail) if envelope.code == 0 => Ok(detail.into()),
            _ => {
                debug!(
                    "Remote lookup for {} rejected: code={}, message={}",
                    code, envelope.code, envelope.message
                );
                Err(ShortUrlError::not_found(format!("短链接不存在: {}", code)))
            }
        }
    }
}

#[async_trait]
impl LinkLookup for RemoteLinkLookup {
    async fn lookup(&self, code: &str) -> Result<ShortLinkRecord> {
        // 非法短码不会存在，也避免拼接出异常路径
        if !is_valid_short_code(code) {
            return Err(ShortUrlError::not_found(format!("短链接不存在: {}", code)));
        }

        let url = format!("{}/api/links/{}", self.base_url, code);
        let agent = self.agent.clone();
        let code = code.to_string();

        tokio::task::spawn_blocking(move || Self::fetch_sync(agent, url, code))
            .await
            .map_err(|e| ShortUrlError::internal(format!("远程查询任务失败: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
