use serde::Deserialize;

use super::interval::Interval;

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
#[readonly::make]
pub struct ApiServer {
    pub bind_address: String,
    pub port: u16,
    /// Redirect plain HTTP requests to HTTPS (ignored in test mode).
    #[serde(default)]
    pub enforce_https: bool,
    /// Read + write budget for a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Interval,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_request_timeout() -> Interval {
    Interval::Seconds(15)
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

impl ApiServer {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        ApiServer {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            enforce_https: false,
            request_timeout: default_request_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}
