//! Authorization endpoint client

use crate::error::{Error, Result};
use crate::http;
use crate::types::{ChannelCredentials, ContentKey};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

/// Acknowledgement returned by the authorization endpoint in manifest mode
#[derive(Debug, Clone, Deserialize)]
pub struct AuthAck {
    pub status: String,
}

impl AuthAck {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Client for `auth.php`-style endpoints
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// `<base>?channel_id=..&ts=..&rnd=..&sig=..`
    pub fn auth_url(&self, creds: &ChannelCredentials) -> Url {
        auth_url(&self.base_url, creds)
    }

    /// Binary protocol: the response body is the key itself
    #[instrument(skip(self, creds), fields(channel = %creds.channel_id))]
    pub async fn fetch_key(&self, creds: &ChannelCredentials) -> Result<ContentKey> {
        let url = self.auth_url(creds);
        let body = http::get_bytes(&self.client, &url).await?;
        debug!(bytes = body.len(), "received key body");
        Ok(ContentKey::new(body))
    }

    /// Manifest protocol: succeed only on `{"status":"ok"}`
    #[instrument(skip(self, creds), fields(channel = %creds.channel_id))]
    pub async fn authorize(&self, creds: &ChannelCredentials) -> Result<AuthAck> {
        let url = self.auth_url(creds);
        let body = http::get_text(&self.client, &url).await?;
        let ack = parse_ack(&body)?;
        if !ack.is_ok() {
            return Err(Error::StatusNotOk { status: ack.status });
        }
        Ok(ack)
    }
}

/// Build the authorization URL for a set of credentials
pub fn auth_url(base: &Url, creds: &ChannelCredentials) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("channel_id", &creds.channel_id)
        .append_pair("ts", &creds.timestamp)
        .append_pair("rnd", &creds.nonce)
        .append_pair("sig", &creds.signature);
    url
}

fn parse_ack(body: &str) -> Result<AuthAck> {
    serde_json::from_str(body).map_err(|e| Error::InvalidAcknowledgement(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_url() {
        let base = Url::parse("https://top2new.newkso.ru/auth.php").unwrap();
        let creds = ChannelCredentials::new("premium51", "1749990000", "83412", "9f2cab");
        assert_eq!(
            auth_url(&base, &creds).as_str(),
            "https://top2new.newkso.ru/auth.php?channel_id=premium51&ts=1749990000&rnd=83412&sig=9f2cab"
        );
    }

    #[test]
    fn test_parse_ack() {
        assert!(parse_ack(r#"{"status":"ok"}"#).unwrap().is_ok());
        assert!(!parse_ack(r#"{"status":"fail","extra":1}"#).unwrap().is_ok());
        assert!(matches!(
            parse_ack("<html>denied</html>"),
            Err(Error::InvalidAcknowledgement(_))
        ));
        assert!(parse_ack(r#"{"message":"no status"}"#).is_err());
    }
}
