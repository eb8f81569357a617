//! REST client implementing [`AuthBackend`].

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use taskdesk_platform_access::{
    AuthBackend, AuthError, AuthGrant, Credentials, PasswordChange, Registration, Token,
};
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::wire::{
    ChangePasswordBody, Endpoint, ErrorBody, LoginBody, RegisterBody, VerifyResponse, classify,
};

/// Authentication backend talking to the taskdesk REST API.
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    /// Creates a backend for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, Report<ApiError>> {
        let url = Url::parse(&config.base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("taskdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the API root without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn request(&self, endpoint: Endpoint, token: Option<&Token>) -> RequestBuilder {
        let request = self
            .client
            .request(endpoint.method(), self.endpoint_url(endpoint));
        match token {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    #[instrument(skip_all, fields(endpoint = %endpoint))]
    async fn execute(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
        request_email: Option<&str>,
    ) -> Result<Response, AuthError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            AuthError::Network {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let error = classify(endpoint, status, ErrorBody::parse(&text), request_email);
        debug!(status = status.as_u16(), kind = %error.kind(), "request rejected");
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
        response.json().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::Network {
                    message: e.to_string(),
                }
            } else {
                AuthError::Server {
                    message: format!("unexpected response: {e}"),
                }
            }
        })
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError> {
        let request = self.request(Endpoint::Login, None).json(&LoginBody {
            email: credentials.email(),
            password: credentials.password(),
        });
        let response = self
            .execute(Endpoint::Login, request, Some(credentials.email()))
            .await?;
        Self::decode(response).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, AuthError> {
        let request = self.request(Endpoint::Register, None).json(&RegisterBody {
            name: registration.display_name(),
            email: registration.email(),
            password: registration.password(),
        });
        let response = self
            .execute(Endpoint::Register, request, Some(registration.email()))
            .await?;
        Self::decode(response).await
    }

    async fn logout(&self, token: &Token) -> Result<(), AuthError> {
        let request = self.request(Endpoint::Logout, Some(token));
        self.execute(Endpoint::Logout, request, None).await?;
        Ok(())
    }

    async fn verify_token(&self, token: &Token) -> Result<bool, AuthError> {
        let request = self.request(Endpoint::Verify, Some(token));
        match self.execute(Endpoint::Verify, request, None).await {
            Ok(response) => {
                let verdict: VerifyResponse = Self::decode(response).await?;
                Ok(verdict.valid)
            }
            // The server refusing the token is an answer, not a failure.
            Err(AuthError::InvalidCredentials) => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn change_password(
        &self,
        token: &Token,
        change: &PasswordChange,
    ) -> Result<(), AuthError> {
        let request = self
            .request(Endpoint::ChangePassword, Some(token))
            .json(&ChangePasswordBody {
                current_password: change.current(),
                new_password: change.new_password(),
            });
        self.execute(Endpoint::ChangePassword, request, None).await?;
        Ok(())
    }
}
