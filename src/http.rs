use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::config::PackConfig;
use crate::error::{LauncherError, LauncherResult};

pub fn build_http_client(config: &PackConfig) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(config.user_agent())
        .default_headers(default_headers)
        .connect_timeout(config.connect_timeout)
        .build()
}

/// Fetch a small text document, mapping non-2xx statuses to the same
/// error shape the downloader produces.
pub(crate) async fn fetch_text(
    client: &Client,
    url: &str,
    item: &str,
) -> LauncherResult<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
            item: item.to_string(),
        });
    }
    Ok(response.text().await?)
}
