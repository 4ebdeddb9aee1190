//! Storage redirect resolution
//!
//! Maps a library path under the mount path to a signed Alist `/d` link, then
//! decides what the client is actually sent:
//! - direct-capable clients with a public base get the public link as is
//! - everyone else gets wherever Alist redirects the internal link to
//!   (or the provider's `raw_url` in [`ResolveMode::RawUrl`])

use http::HeaderMap;
use mediarelay_providers::alist::{download_path, AlistClient, AlistError, SignedUrlToken};
use mediarelay_providers::ProviderClientError;

use crate::config::{Config, ResolveMode};
use crate::error::{Error, Result};

/// Links never expire; Alist only checks the signature.
const SIGN_EXPIRY: i64 = 0;

/// Resolves storage paths to client-facing URLs
#[derive(Clone)]
pub struct RedirectResolver {
    alist: AlistClient,
    secret: String,
    public_url: Option<String>,
    mount_path: String,
    direct_clients: Vec<String>,
    mode: ResolveMode,
}

impl RedirectResolver {
    pub fn new(config: &Config, alist: AlistClient) -> Self {
        Self {
            alist,
            secret: config.alist.token.clone(),
            public_url: config
                .alist
                .public_url()
                .map(|url| url.trim_end_matches('/').to_string()),
            mount_path: config.redirect.mount_path.clone(),
            direct_clients: config
                .redirect
                .direct_clients
                .iter()
                .filter(|pattern| !pattern.is_empty())
                .map(|pattern| pattern.to_lowercase())
                .collect(),
            mode: config.alist.resolve_mode,
        }
    }

    /// Path relative to the Alist root, always starting with `/`
    pub fn storage_relative_path(&self, storage_path: &str) -> Result<String> {
        let relative = storage_path
            .strip_prefix(&self.mount_path)
            .ok_or_else(|| Error::IneligiblePath {
                path: storage_path.to_string(),
                mount_path: self.mount_path.clone(),
            })?
            .replace('\\', "/");

        if relative.starts_with('/') {
            Ok(relative)
        } else {
            Ok(format!("/{relative}"))
        }
    }

    /// Whether the User-Agent belongs to a client allowed to fetch the public link
    #[must_use]
    pub fn is_direct_client(&self, user_agent: &str) -> bool {
        let user_agent = user_agent.to_lowercase();
        self.direct_clients
            .iter()
            .any(|pattern| user_agent.contains(pattern.as_str()))
    }

    /// Resolve the URL a client should be redirected to.
    ///
    /// `headers` are the client's request headers, replayed on the redirect hop.
    pub async fn resolve(&self, storage_path: &str, user_agent: &str, headers: &HeaderMap) -> Result<String> {
        let relative = self.storage_relative_path(storage_path)?;
        let token = SignedUrlToken::sign(&self.secret, &relative, SIGN_EXPIRY)?;
        let download = download_path(&relative, &token);

        if let Some(public_url) = self.public_url.as_deref() {
            if self.is_direct_client(user_agent) {
                let url = format!("{public_url}{download}");
                tracing::info!(%url, "Redirecting direct client to public storage URL");
                return Ok(url);
            }
        }

        let result = match self.mode {
            ResolveMode::Redirect => {
                let url = format!("{}{download}", self.alist.host());
                tracing::debug!(%url, "Probing storage redirect");
                self.alist.redirect_location(&url, headers).await
            }
            ResolveMode::RawUrl => self.alist.fs_get(&relative, None).await.and_then(|info| {
                if info.raw_url.is_empty() {
                    Err(AlistError::MissingData(format!("raw_url for {relative}")))
                } else {
                    Ok(info.raw_url)
                }
            }),
        };

        match result {
            Ok(url) => {
                tracing::info!(%url, "Resolved storage URL");
                Ok(url)
            }
            Err(e) => {
                tracing::warn!(path = %relative, kind = failure_kind(&e), error = %e, "Storage resolution failed");
                Err(e.into())
            }
        }
    }
}

/// Coarse failure class for logs
fn failure_kind(err: &AlistError) -> &'static str {
    let status = match err {
        AlistError::Upstream(ProviderClientError::Network(_)) => return "network",
        AlistError::MissingLocation { .. } => return "missing_location",
        AlistError::Api { .. } => return "api_error",
        AlistError::UnexpectedStatus { status, .. } | AlistError::Upstream(ProviderClientError::Http { status, .. }) => {
            status
        }
        _ => return "other",
    };

    if status.is_client_error() {
        "client_error"
    } else if status.is_server_error() {
        "server_error"
    } else {
        "unexpected_status"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(alist_url: &str, public_url: Option<&str>) -> Config {
        let mut config = Config::default();
        config.alist.url = alist_url.to_string();
        config.alist.public_url = public_url.map(str::to_string);
        config.alist.token = "secret".to_string();
        config.redirect.mount_path = "/mnt/cloud".to_string();
        config
    }

    fn resolver(config: &Config) -> RedirectResolver {
        let alist = AlistClient::with_token(&config.alist.url, &config.alist.token).unwrap();
        RedirectResolver::new(config, alist)
    }

    fn sign_query(path: &str) -> String {
        SignedUrlToken::sign("secret", path, 0).unwrap().to_string()
    }

    #[test]
    fn test_storage_relative_path() {
        let resolver = resolver(&config("http://alist:5244", None));
        assert_eq!(resolver.storage_relative_path("/mnt/cloud/movies/a.mkv").unwrap(), "/movies/a.mkv");
        assert_eq!(resolver.storage_relative_path("/mnt/cloudmovies\\a.mkv").unwrap(), "/movies/a.mkv");
        assert!(matches!(
            resolver.storage_relative_path("/data/local/a.mkv"),
            Err(Error::IneligiblePath { .. })
        ));
    }

    #[test]
    fn test_direct_client_match_is_case_insensitive() {
        let mut config = config("http://alist:5244", None);
        config.redirect.direct_clients = vec!["Infuse".to_string(), String::new()];
        let resolver = resolver(&config);

        assert!(resolver.is_direct_client("INFUSE-Direct/7.6"));
        assert!(!resolver.is_direct_client("Emby Theater"));
    }

    #[tokio::test]
    async fn test_direct_client_gets_public_url_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "https://cdn/a"))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = resolver(&config(&server.uri(), Some("https://alist.example.com/")));
        let url = resolver
            .resolve("/mnt/cloud/movies/a.mkv", "Infuse/7.0", &HeaderMap::new())
            .await
            .unwrap();

        assert_eq!(
            url,
            format!("https://alist.example.com/d/movies/a.mkv?sign={}", sign_query("/movies/a.mkv"))
        );
    }

    #[tokio::test]
    async fn test_other_clients_follow_storage_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/d/movies/my%20film.mkv"))
            .and(query_param("sign", sign_query("/movies/my film.mkv")))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "https://cdn.example.com/x"))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver(&config(&server.uri(), Some("https://alist.example.com")));
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("Emby Theater"));

        let url = resolver
            .resolve("/mnt/cloud/movies/my film.mkv", "Emby Theater", &headers)
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/x");
    }

    #[tokio::test]
    async fn test_direct_client_without_public_url_uses_hop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(307).insert_header("Location", "https://cdn.example.com/y"))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver(&config(&server.uri(), None));
        let url = resolver
            .resolve("/mnt/cloud/a.mkv", "Infuse/7.0", &HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/y");
    }

    #[tokio::test]
    async fn test_hop_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("file bytes"))
            .mount(&server)
            .await;

        let resolver = resolver(&config(&server.uri(), None));
        let err = resolver
            .resolve("/mnt/cloud/a.mkv", "VLC", &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(AlistError::UnexpectedStatus { .. })));
    }

    #[tokio::test]
    async fn test_raw_url_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/fs/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "message": "success",
                "data": {"name": "a.mkv", "raw_url": "https://provider.example.com/a.mkv"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config(&server.uri(), None);
        config.alist.resolve_mode = ResolveMode::RawUrl;
        let url = resolver(&config)
            .resolve("/mnt/cloud/a.mkv", "VLC", &HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(url, "https://provider.example.com/a.mkv");
    }

    #[test]
    fn test_failure_kind() {
        let status = |code: u16| AlistError::UnexpectedStatus {
            status: reqwest_status(code),
            url: String::new(),
        };
        assert_eq!(failure_kind(&AlistError::Upstream(ProviderClientError::Network("refused".to_string()))), "network");
        assert_eq!(failure_kind(&status(404)), "client_error");
        assert_eq!(failure_kind(&status(502)), "server_error");
        assert_eq!(failure_kind(&status(200)), "unexpected_status");
        assert_eq!(failure_kind(&AlistError::MissingLocation { url: String::new() }), "missing_location");
    }

    fn reqwest_status(code: u16) -> http::StatusCode {
        http::StatusCode::from_u16(code).unwrap()
    }
}
