//! Backend addresses derived from host and scheme

use crate::error::{Result, TrackerError};
use crate::infrastructure::config::TrackerConfig;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    secure: bool,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.host.trim(), config.secure)
    }

    /// Use the host of the page the tracking link points at
    ///
    /// A plain `http` page gets a plain `ws` channel.
    pub fn from_page_url(page: &str) -> Result<Self> {
        let url = Url::parse(page)
            .map_err(|e| TrackerError::Configuration(format!("invalid page url {}: {}", page, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| TrackerError::Configuration(format!("page url has no host: {}", page)))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self::new(host, url.scheme() != "http"))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Push channel address for one order: `<ws|wss>://<host>/ws/order/<id>/`
    pub fn channel_url(&self, order_id: &str) -> Result<String> {
        if order_id.trim().is_empty() {
            return Err(TrackerError::Configuration("order id is empty".to_string()));
        }
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = self.base(scheme)?;
        url.path_segments_mut()
            .map_err(|_| TrackerError::Configuration(format!("cannot build path on {}", self.host)))?
            .clear()
            .extend(["ws", "order", order_id, ""]);
        Ok(url.to_string())
    }

    /// `http(s)://<host>`, without trailing slash
    pub fn http_base(&self) -> Result<String> {
        let scheme = if self.secure { "https" } else { "http" };
        let url = self.base(scheme)?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    fn base(&self, scheme: &str) -> Result<Url> {
        Url::parse(&format!("{}://{}/", scheme, self.host))
            .map_err(|e| TrackerError::Configuration(format!("invalid host {}: {}", self.host, e)))
    }
}
