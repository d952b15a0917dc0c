use std::sync::RwLock;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use inferhost_common::{
    ApiKey, AuthTokenRequest, AuthTokenResponse, CreateApiKeyRequest, CreateApiKeyResponse,
    CreateSessionRequest, CreateSessionResponse, GetApiKeysResponse, ProfileResponse,
    RefreshSessionRequest,
};

use super::credential_store::{CredentialStore, DEFAULT_LOGIN_TYPE};
use super::token;
use crate::error::{SdkError, SdkResult};
use crate::transport::{encode_path, HttpClient, CLIENT_ID_HEADER};

/// Attempts allowed for a 2FA code before login gives up.
pub const MAX_OTP_ATTEMPTS: u32 = 3;

/// Supplies one-time codes when the account has 2FA enabled.
pub trait OtpProvider: Send + Sync {
    /// Code for `attempt` (1-based). `None` aborts the login.
    fn otp_code(&self, attempt: u32, max_attempts: u32) -> Option<String>;
}

impl<F> OtpProvider for F
where
    F: Fn(u32, u32) -> Option<String> + Send + Sync,
{
    fn otp_code(&self, attempt: u32, max_attempts: u32) -> Option<String> {
        self(attempt, max_attempts)
    }
}

/// Anything that can decorate a request with credentials.
pub trait AuthProvider: Send + Sync {
    fn auth_headers(&self) -> SdkResult<HeaderMap>;
}

/// Tokens held for the lifetime of a client instance.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

/// Client for the IAM service: login, session refresh and API keys.
pub struct IamClient {
    client_id: String,
    email: String,
    password: String,
    http: HttpClient,
    session: RwLock<Session>,
    store: Option<CredentialStore>,
}

impl IamClient {
    pub fn new(
        client_id: &str,
        email: &str,
        password: &str,
        http: HttpClient,
        store: Option<CredentialStore>,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            http,
            session: RwLock::new(Session::default()),
            store,
        }
    }

    /// Use a long-lived API key as the bearer token. Login and refresh are
    /// not available in this mode.
    pub fn with_api_key(client_id: &str, api_key: &str, http: HttpClient) -> Self {
        let user_id = token::user_id(api_key).unwrap_or_default();
        Self {
            client_id: client_id.to_string(),
            email: String::new(),
            password: String::new(),
            http,
            session: RwLock::new(Session {
                access_token: api_key.to_string(),
                refresh_token: String::new(),
                user_id,
            }),
            store: None,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn session(&self) -> Session {
        self.session.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user_id(&self) -> String {
        self.session().user_id
    }

    /// Reuse a cached, unexpired refresh token when there is one; fall back
    /// to a full login otherwise.
    pub async fn authenticate(&self, otp: Option<&dyn OtpProvider>) -> SdkResult<()> {
        if let Some(store) = &self.store {
            match store.refresh_token(&self.email) {
                Ok(Some(cached)) if !token::is_expired(&cached, chrono::Utc::now().timestamp()) => {
                    self.write_session(|s| s.refresh_token = cached);
                    match self.refresh().await {
                        Ok(()) => {
                            tracing::debug!(email=%self.email, "session restored from cached refresh token");
                            return Ok(());
                        }
                        Err(e) => {
                            tracing::warn!(error=%e, "cached refresh token rejected, logging in");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error=%e, path=%store.path().display(), "failed to read credential cache");
                }
            }
        }
        self.login(otp).await
    }

    /// Exchange email and password for a session, asking `otp` for codes
    /// when the account requires 2FA.
    pub async fn login(&self, otp: Option<&dyn OtpProvider>) -> SdkResult<()> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(SdkError::Auth("email and password are required to log in".into()));
        }

        let req = AuthTokenRequest {
            email: self.email.clone(),
            password: self.password.clone(),
        };
        let tokens: AuthTokenResponse = self
            .http
            .post("/me/auth-tokens", self.client_headers()?, &req)
            .await?;

        let session = if tokens.is_2fa_required {
            let otp = otp.ok_or_else(|| {
                SdkError::Auth("2FA is required but no code provider was given".into())
            })?;
            self.create_session_with_otp(&tokens.auth_token, otp).await?
        } else {
            let req = CreateSessionRequest {
                kind: "native".into(),
                auth_token: tokens.auth_token,
                otp_code: None,
            };
            self.http
                .post("/me/sessions", self.client_headers()?, &req)
                .await?
        };

        self.install(session)?;
        tracing::info!(email=%self.email, user_id=%self.user_id(), "logged in");
        Ok(())
    }

    async fn create_session_with_otp(
        &self,
        auth_token: &str,
        otp: &dyn OtpProvider,
    ) -> SdkResult<CreateSessionResponse> {
        let mut last_error = None;
        for attempt in 1..=MAX_OTP_ATTEMPTS {
            let Some(code) = otp.otp_code(attempt, MAX_OTP_ATTEMPTS) else {
                return Err(SdkError::Auth("2FA code entry aborted".into()));
            };
            let req = CreateSessionRequest {
                kind: "native".into(),
                auth_token: auth_token.to_string(),
                otp_code: Some(code),
            };
            match self
                .http
                .post("/me/sessions", self.client_headers()?, &req)
                .await
            {
                Ok(session) => return Ok(session),
                Err(e) => {
                    tracing::warn!(attempt, error=%e, "invalid 2FA code");
                    last_error = Some(e);
                }
            }
        }
        Err(SdkError::Auth(format!(
            "failed to create session after {MAX_OTP_ATTEMPTS} incorrect 2FA attempts: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Trade the current refresh token for a new token pair.
    pub async fn refresh(&self) -> SdkResult<()> {
        let refresh_token = self.session().refresh_token;
        if refresh_token.is_empty() {
            return Err(SdkError::Auth("no refresh token available".into()));
        }
        let session: CreateSessionResponse = self
            .http
            .patch(
                "/me/sessions",
                self.client_headers()?,
                &RefreshSessionRequest { refresh_token },
            )
            .await?;
        self.install(session)
    }

    fn install(&self, session: CreateSessionResponse) -> SdkResult<()> {
        let user_id = token::user_id(&session.access_token)?;
        let refresh_token = session.refresh_token.clone();
        self.write_session(|s| {
            s.access_token = session.access_token;
            s.refresh_token = session.refresh_token;
            s.user_id = user_id;
        });

        if let Some(store) = &self.store {
            if let Err(e) = store.write_refresh_token(&self.email, &refresh_token, DEFAULT_LOGIN_TYPE)
            {
                tracing::error!(error=%e, path=%store.path().display(), "failed to cache refresh token");
            }
        }
        Ok(())
    }

    fn write_session(&self, f: impl FnOnce(&mut Session)) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }

    fn client_headers(&self) -> SdkResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_ID_HEADER, header_value(&self.client_id)?);
        Ok(headers)
    }

    pub async fn profile(&self) -> SdkResult<ProfileResponse> {
        self.http.get("/me/profile", self.auth_headers()?).await
    }

    async fn organization_id(&self) -> SdkResult<String> {
        self.profile()
            .await?
            .organization
            .map(|o| o.id)
            .ok_or_else(|| SdkError::NotFound("profile has no organization".into()))
    }

    /// Create an organization API key and return its secret value.
    /// `expires_at` is a unix timestamp; `None` means no expiry.
    pub async fn create_org_api_key(&self, name: &str, expires_at: Option<i64>) -> SdkResult<String> {
        crate::error::require_non_empty(name, "API key name")?;
        let org_id = self.organization_id().await?;
        let req = CreateApiKeyRequest {
            name: name.to_string(),
            kind: "ie_model".into(),
            scope: "ie_model".into(),
            expires_at: expires_at.unwrap_or(0),
        };
        let resp: CreateApiKeyResponse = self
            .http
            .post(
                &encode_path(&["organizations", org_id.as_str(), "api-keys"])?,
                self.auth_headers()?,
                &req,
            )
            .await?;
        Ok(resp.key)
    }

    pub async fn get_org_api_keys(&self) -> SdkResult<Vec<ApiKey>> {
        let org_id = self.organization_id().await?;
        let resp: GetApiKeysResponse = self
            .http
            .get(
                &encode_path(&["organizations", org_id.as_str(), "api-keys"])?,
                self.auth_headers()?,
            )
            .await?;
        Ok(resp.api_keys)
    }
}

impl AuthProvider for IamClient {
    fn auth_headers(&self) -> SdkResult<HeaderMap> {
        let access_token = self.session().access_token;
        if access_token.is_empty() {
            return Err(SdkError::Auth("not logged in".into()));
        }
        let mut headers = self.client_headers()?;
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {access_token}"))?);
        Ok(headers)
    }
}

fn header_value(v: &str) -> SdkResult<HeaderValue> {
    HeaderValue::from_str(v).map_err(|e| SdkError::Config(format!("invalid header value: {e}")))
}
