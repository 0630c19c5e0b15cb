use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Address family of the MyDNS endpoint, also its subdomain label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    IPv4,
    IPv6,
}

impl Protocol {
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::IPv4 => "ipv4",
            Protocol::IPv6 => "ipv6",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Error while sending request: {0}")]
    Network(#[from] reqwest::Error),
    /// Text of the error page title, shown as-is in notifications.
    #[error("{0}")]
    Provider(String),
    #[error("No {0} address found in the MyDNS response")]
    MissingAddress(Protocol),
}

impl NotifierError {
    /// Provider error for an error page that has no usable title.
    pub(crate) fn untitled(status: StatusCode) -> Self {
        NotifierError::Provider(status.to_string())
    }
}

#[async_trait]
pub trait IPNotifier {
    /// Logs in to the provider for `protocol` and returns the address it reports.
    async fn fetch_reported_ip(
        &self,
        protocol: Protocol,
        id: &str,
        password: &str,
    ) -> Result<String, NotifierError>;
}
