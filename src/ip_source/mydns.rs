use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html};
use tracing::{debug, error, info, trace};

use super::ip_source::{IPNotifier, NotifierError, Protocol};

/// `{protocol}` is replaced with `ipv4` or `ipv6`.
pub(crate) const MYDNS_URL_TEMPLATE: &str = "https://{protocol}.mydns.jp/login.html";

pub(crate) struct IPNotifierMyDns {
    client: Client,
    url_template: String,
}

impl IPNotifierMyDns {
    pub(crate) fn with_url_template(client: Client, url_template: impl Into<String>) -> Self {
        IPNotifierMyDns {
            client,
            url_template: url_template.into(),
        }
    }

    fn url(&self, protocol: Protocol) -> String {
        self.url_template.replace("{protocol}", protocol.label())
    }
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |element| element.value().name() == name)
}

/// Text at `/html/head/title`.
fn page_title(document: &Html) -> Option<String> {
    let head = child_elements(document.root_element(), "head").next()?;
    let title = child_elements(head, "title").next()?;
    Some(title.text().collect())
}

/// Text at `/html/body/dd[2]`, where the login page shows the address it saw.
fn reported_address(document: &Html) -> Option<String> {
    let body = child_elements(document.root_element(), "body").next()?;
    let dd = child_elements(body, "dd").nth(1)?;
    Some(dd.text().collect())
}

fn parse_login_page(
    protocol: Protocol,
    status: StatusCode,
    body: &str,
) -> Result<String, NotifierError> {
    let document = Html::parse_document(body);
    if status != StatusCode::OK {
        return Err(match page_title(&document) {
            Some(title) if !title.is_empty() => NotifierError::Provider(title),
            _ => NotifierError::untitled(status),
        });
    }
    match reported_address(&document) {
        Some(ip) if !ip.is_empty() => Ok(ip),
        _ => Err(NotifierError::MissingAddress(protocol)),
    }
}

#[async_trait]
impl IPNotifier for IPNotifierMyDns {
    async fn fetch_reported_ip(
        &self,
        protocol: Protocol,
        id: &str,
        password: &str,
    ) -> Result<String, NotifierError> {
        let url = self.url(protocol);
        debug!(%protocol, "running notify");

        let result: Result<String, NotifierError> = async {
            let response = self
                .client
                .get(&url)
                .basic_auth(id, Some(password))
                .send()
                .await?;
            let status = response.status();
            trace!("GET {} finished with {}", url, status);
            let body = response.text().await?;
            parse_login_page(protocol, status, &body)
        }
        .await;

        match &result {
            Ok(ip) => info!("notify {}: {}", protocol, ip),
            Err(err) => error!("notify {} failed: {}", protocol, err),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use reqwest::{Client, StatusCode};

    use super::{parse_login_page, IPNotifierMyDns, MYDNS_URL_TEMPLATE};
    use crate::ip_source::ip_source::{IPNotifier, NotifierError, Protocol};

    const LOGIN_PAGE: &str = "<html><head><title>MyDNS.JP</title></head><body>\
        <dt>MASTER ID</dt><dd>mydns123456</dd>\
        <dt>REMOTE ADDRESS</dt><dd>1.2.3.4</dd>\
        </body></html>";

    fn notifier(server: &MockServer) -> IPNotifierMyDns {
        IPNotifierMyDns::with_url_template(
            Client::new(),
            format!("{}/{{protocol}}/login.html", server.base_url()),
        )
    }

    #[test]
    fn default_urls() {
        let notifier = IPNotifierMyDns::with_url_template(Client::new(), MYDNS_URL_TEMPLATE);
        assert_eq!(
            notifier.url(Protocol::IPv4),
            "https://ipv4.mydns.jp/login.html"
        );
        assert_eq!(
            notifier.url(Protocol::IPv6),
            "https://ipv6.mydns.jp/login.html"
        );
    }

    #[test]
    fn extracts_second_dd_unmodified() {
        let page = "<html><body><dd>first</dd><dd> fe80::1 </dd><dd>third</dd></body></html>";
        let ip = parse_login_page(Protocol::IPv6, StatusCode::OK, page).expect("Should extract");
        assert_eq!(ip, " fe80::1 ");
    }

    #[test]
    fn missing_address() {
        let page = "<html><head><title>MyDNS.JP</title></head><body><dd>only one</dd></body></html>";
        assert!(matches!(
            parse_login_page(Protocol::IPv4, StatusCode::OK, page),
            Err(NotifierError::MissingAddress(Protocol::IPv4))
        ));
        let page = "<html><body><dd>first</dd><dd></dd></body></html>";
        assert!(matches!(
            parse_login_page(Protocol::IPv4, StatusCode::OK, page),
            Err(NotifierError::MissingAddress(Protocol::IPv4))
        ));
    }

    #[test]
    fn nested_dd_is_not_matched() {
        let page = "<html><body><dl><dd>a</dd><dd>b</dd></dl></body></html>";
        assert!(matches!(
            parse_login_page(Protocol::IPv4, StatusCode::OK, page),
            Err(NotifierError::MissingAddress(_))
        ));
    }

    #[test]
    fn untitled_error_page() {
        let err = parse_login_page(Protocol::IPv4, StatusCode::BAD_GATEWAY, "oops")
            .expect_err("Should fail");
        assert_eq!(err.to_string(), "502 Bad Gateway");
    }

    #[tokio::test]
    async fn success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/ipv4/login.html")
                    .header("authorization", "Basic dTpw");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(LOGIN_PAGE);
            })
            .await;

        let ip = notifier(&server)
            .fetch_reported_ip(Protocol::IPv4, "u", "p")
            .await
            .expect("Failed to fetch the IP address");

        assert_eq!(ip, "1.2.3.4");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_uses_title() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ipv6/login.html");
                then.status(403).body(
                    "<html><head><title>Forbidden</title></head><body><h1>Forbidden</h1></body></html>",
                );
            })
            .await;

        let err = notifier(&server)
            .fetch_reported_ip(Protocol::IPv6, "u", "wrong")
            .await
            .expect_err("Should fail on 403");

        assert!(matches!(&err, NotifierError::Provider(title) if title == "Forbidden"));
        assert_eq!(err.to_string(), "Forbidden");
    }

    #[tokio::test]
    async fn network_error() {
        let notifier =
            IPNotifierMyDns::with_url_template(Client::new(), "http://127.0.0.1:1/{protocol}");
        let err = notifier
            .fetch_reported_ip(Protocol::IPv4, "u", "p")
            .await
            .expect_err("Nothing listens on port 1");
        assert!(matches!(err, NotifierError::Network(_)));
    }
}
