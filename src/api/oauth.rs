//! OAuth 2.0 installed-application flow for Google Sheets API access.
//!
//! This module handles:
//! - Running the OAuth consent flow with a local callback server
//! - Persisting access and refresh tokens in token.json
//! - Refreshing the access token when it is about to expire

use crate::api::files::{File, SecretFile, TokenFile};
use crate::api::OAUTH_SCOPES;
use crate::Result;
use anyhow::{ensure, Context};
use chrono::Utc;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::convert::Infallible;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info};

const OAUTH_CALLBACK_PORT: u16 = 3030;

type OAuthClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Provides a valid access token, refreshing it and saving it to `token.json` when needed.
#[derive(Debug, Clone)]
pub(crate) struct TokenProvider {
    secret: SecretFile,
    token: File<TokenFile>,
}

impl TokenProvider {
    /// Runs the OAuth consent flow and saves the resulting tokens to `token_path`.
    ///
    /// This is the only function that requires the user to visit Google in a browser.
    pub(crate) async fn initialize(
        secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let secret = SecretFile::load(secret_path.as_ref()).await?;
        let token = consent(&secret).await?;
        let token = File::new(token_path.as_ref(), token);
        token.save().await?;
        info!("Tokens saved to {}", token.path().display());
        Ok(Self { secret, token })
    }

    /// Loads existing credentials and tokens. Never opens a browser.
    pub(crate) async fn load(
        secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let secret = SecretFile::load(secret_path.as_ref()).await?;
        let token = TokenFile::load(token_path.as_ref()).await?;
        Ok(Self { secret, token })
    }

    /// Exchanges the refresh token for a new access token and saves it.
    pub(crate) async fn refresh(&mut self) -> Result<()> {
        let client = oauth_client(&self.secret, None)?;
        let refresh_token = RefreshToken::new(self.token.data().refresh_token().to_string());
        let response = client
            .exchange_refresh_token(&refresh_token)
            .request_async(&http_client()?)
            .await
            .context("Failed to refresh the OAuth token")?;
        self.token.data_mut().update(
            response.access_token().secret().to_string(),
            expires_at(response.expires_in()),
            response.refresh_token().map(|t| t.secret().to_string()),
        );
        self.token.save().await?;
        debug!("Refreshed the OAuth access token");
        Ok(())
    }

    /// Returns an access token that is valid for at least a few more minutes.
    pub(crate) async fn token_with_refresh(&mut self) -> Result<&str> {
        if self.token.data().is_expired() {
            self.refresh().await?;
        }
        Ok(self.token.data().access_token())
    }
}

fn oauth_client(secret: &SecretFile, redirect: Option<String>) -> Result<OAuthClient> {
    let client = BasicClient::new(ClientId::new(secret.client_id().to_string()))
        .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
        .set_auth_uri(AuthUrl::new(secret.auth_uri().to_string()).context("Invalid auth_uri")?)
        .set_token_uri(
            TokenUrl::new(secret.token_uri().to_string()).context("Invalid token_uri")?,
        );
    Ok(match redirect {
        Some(redirect) => {
            client.set_redirect_uri(RedirectUrl::new(redirect).context("Invalid redirect URI")?)
        }
        None => client,
    })
}

fn http_client() -> Result<reqwest::Client> {
    // The token endpoint must not be followed through redirects
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Unable to create the HTTP client")
}

fn expires_at(expires_in: Option<Duration>) -> chrono::DateTime<Utc> {
    let seconds = expires_in.map(|d| d.as_secs()).unwrap_or(3600);
    Utc::now() + chrono::Duration::seconds(seconds as i64)
}

/// Sends the user to Google's consent page and waits for the redirect back to localhost.
async fn consent(secret: &SecretFile) -> Result<TokenFile> {
    let redirect = format!("http://localhost:{OAUTH_CALLBACK_PORT}");
    let client = oauth_client(secret, Some(redirect))?;
    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(OAUTH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();

    info!("Open this URL in your browser to authorize access to your sheets:\n\n{auth_url}\n");
    info!("Local callback server listening on http://localhost:{OAUTH_CALLBACK_PORT}");
    let callback = wait_for_callback(OAUTH_CALLBACK_PORT).await?;
    ensure!(
        callback.state == *csrf_token.secret(),
        "The OAuth state returned by Google does not match the one we sent"
    );

    let response = client
        .exchange_code(AuthorizationCode::new(callback.code))
        .set_pkce_verifier(pkce_verifier)
        .request_async(&http_client()?)
        .await
        .context("Failed to exchange the authorization code for tokens")?;

    let refresh_token = response
        .refresh_token()
        .context("Google did not return a refresh token")?
        .secret()
        .to_string();
    let scopes = match response.scopes() {
        Some(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
        None => OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
    };
    info!("Authorization successful!");
    Ok(TokenFile::new(
        scopes,
        response.access_token().secret().to_string(),
        refresh_token,
        expires_at(response.expires_in()),
    ))
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct Callback {
    code: String,
    state: String,
}

/// Serves `localhost:port` until a request carrying an authorization code arrives.
async fn wait_for_callback(port: u16) -> Result<Callback> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Unable to listen on port {port} for the OAuth callback"))?;
    let (tx, mut rx) = oneshot::channel::<Callback>();
    let tx = Arc::new(Mutex::new(Some(tx)));

    loop {
        tokio::select! {
            received = &mut rx => {
                return received.context("The OAuth callback server stopped unexpectedly");
            }
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("Unable to accept the OAuth callback")?;
                let tx = tx.clone();
                let service = service_fn(move |req: Request<Incoming>| {
                    let tx = tx.clone();
                    async move {
                        let body = match parse_callback(req.uri().query().unwrap_or_default()) {
                            Some(callback) => {
                                if let Some(sender) = tx.lock().ok().and_then(|mut s| s.take()) {
                                    let _ = sender.send(callback);
                                }
                                "Authorization complete, you can close this window."
                            }
                            None => "Waiting for an authorization code.",
                        };
                        Ok::<_, Infallible>(Response::new(body.to_string()))
                    }
                });
                tokio::spawn(async move {
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("OAuth callback connection error: {e}");
                    }
                });
            }
        }
    }
}

fn parse_callback(query: &str) -> Option<Callback> {
    let mut code = None;
    let mut state = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(Callback {
        code: code?,
        state: state?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback() {
        let callback = parse_callback("state=abc%3D&code=4%2F0Adeu&scope=x").unwrap();
        assert_eq!(callback.code, "4/0Adeu");
        assert_eq!(callback.state, "abc=");
    }

    #[test]
    fn test_parse_callback_missing_code() {
        assert!(parse_callback("state=abc").is_none());
        assert!(parse_callback("").is_none());
        assert!(parse_callback("error=access_denied&state=abc").is_none());
    }

    #[test]
    fn test_expires_at_defaults_to_an_hour() {
        let at = expires_at(None);
        let remaining = at - Utc::now();
        assert!(remaining > chrono::Duration::minutes(59));
        assert!(remaining <= chrono::Duration::hours(1));
    }
}
