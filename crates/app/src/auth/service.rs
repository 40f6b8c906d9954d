//! Auth service.
//!
//! One [`PgAuthService`] serves each principal kind. Users and admins share the two-step
//! login, refresh and password-reset pipeline; the kind selects the tables, the verification
//! purposes and the `user_type` claim.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{debug, error, info, warn};

use crate::{
    auth::{
        AuthServiceError, TokenCodec,
        ipinfo::IpLookup,
        models::{
            Authenticated, ClientMeta, CodeSent, LoginEnvelope, NewLoginSession, NewPrincipal,
            Principal, PrincipalKind, Profile, SessionInfo, SessionStatus,
        },
        password::{hash_password, verify_password},
        repository::PgAuthRepository,
        user_agent::parse_user_agent,
    },
    database::Db,
    verification::PgVerificationService,
};

const TOKEN_TYPE: &str = "Bearer";
const LOGIN_SUCCESS_REASON: &str = "登录成功";
const MIN_PASSWORD_LENGTH: usize = 6;

/// Kind-specific wording for responses and journal reasons.
struct Messages {
    not_found: &'static str,
    wrong_password: &'static str,
    inactive: &'static str,
    invalid_code: &'static str,
    code_sent: &'static str,
    reset_code_sent: &'static str,
    reset_generic: &'static str,
    reset_done: &'static str,
}

static USER_MESSAGES: Messages = Messages {
    not_found: "用户不存在",
    wrong_password: "密码错误",
    inactive: "账户未激活",
    invalid_code: "验证码无效或已过期",
    code_sent: "登录验证码已发送",
    reset_code_sent: "重置密码验证码已发送到您的邮箱",
    reset_generic: "如果该邮箱已注册，重置密码验证码已发送",
    reset_done: "密码重置成功，请使用新密码登录",
};

static ADMIN_MESSAGES: Messages = Messages {
    not_found: "管理员不存在",
    wrong_password: "密码错误",
    inactive: "管理员账户未激活",
    invalid_code: "验证码无效",
    code_sent: "管理员登录验证码已发送",
    reset_code_sent: "管理员重置密码验证码已发送到您的邮箱",
    reset_generic: "如果该邮箱已注册为管理员，重置密码验证码已发送",
    reset_done: "管理员密码重置成功，请使用新密码登录",
};

/// A failed login attempt and what to write to the journal for it.
#[derive(Debug)]
struct Rejection {
    owner_id: i64,
    reason: String,
    error: AuthServiceError,
}

impl From<AuthServiceError> for Rejection {
    fn from(error: AuthServiceError) -> Self {
        Self {
            owner_id: 0,
            reason: error.to_string(),
            error,
        }
    }
}

impl From<sqlx::Error> for Rejection {
    fn from(error: sqlx::Error) -> Self {
        AuthServiceError::from(error).into()
    }
}

#[derive(Clone)]
pub struct PgAuthService {
    db: Db,
    repository: PgAuthRepository,
    verification: PgVerificationService,
    tokens: TokenCodec,
    ip_lookup: Option<Arc<dyn IpLookup>>,
}

impl std::fmt::Debug for PgAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAuthService")
            .field("kind", &self.repository.kind())
            .field("tokens", &self.tokens)
            .field("ip_lookup", &self.ip_lookup.is_some())
            .finish_non_exhaustive()
    }
}

impl PgAuthService {
    #[must_use]
    pub fn new(
        db: Db,
        kind: PrincipalKind,
        verification: PgVerificationService,
        tokens: TokenCodec,
    ) -> Self {
        Self {
            db,
            repository: PgAuthRepository::new(kind),
            verification,
            tokens,
            ip_lookup: None,
        }
    }

    /// Enrich login sessions with location details from `lookup`.
    #[must_use]
    pub fn with_ip_lookup(mut self, lookup: Arc<dyn IpLookup>) -> Self {
        self.ip_lookup = Some(lookup);
        self
    }

    #[must_use]
    pub fn kind(&self) -> PrincipalKind {
        self.repository.kind()
    }

    /// Create an active principal without verification. Used for admin provisioning.
    ///
    /// # Errors
    ///
    /// Returns `EmailExists` when the email is taken, or a hashing/storage error.
    pub async fn provision(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
        is_super: bool,
    ) -> Result<Profile, AuthServiceError> {
        validate_password(password)?;

        let password_hash = hash_password(password).await?;

        let mut tx = self.db.begin().await?;

        let principal = self
            .repository
            .create(
                &mut tx,
                &NewPrincipal {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash,
                    role: role.to_string(),
                    status: "active",
                    is_super,
                },
            )
            .await?;

        tx.commit().await?;

        info!(id = principal.id, kind = %self.kind(), "principal provisioned");

        Ok(principal.profile())
    }

    fn messages(&self) -> &'static Messages {
        match self.kind() {
            PrincipalKind::User => &USER_MESSAGES,
            PrincipalKind::Admin => &ADMIN_MESSAGES,
        }
    }

    fn not_found_error(&self) -> AuthServiceError {
        match self.kind() {
            PrincipalKind::User => AuthServiceError::UserNotFound,
            PrincipalKind::Admin => AuthServiceError::AdminNotFound,
        }
    }

    fn login_not_found_error(&self) -> AuthServiceError {
        match self.kind() {
            PrincipalKind::User => AuthServiceError::InvalidCredentials,
            PrincipalKind::Admin => AuthServiceError::AdminNotFound,
        }
    }

    fn inactive_error(&self) -> AuthServiceError {
        match self.kind() {
            PrincipalKind::User => AuthServiceError::UserInactive,
            PrincipalKind::Admin => AuthServiceError::AdminInactive,
        }
    }

    fn bad_password_error(&self) -> AuthServiceError {
        match self.kind() {
            PrincipalKind::User => AuthServiceError::InvalidCredentials,
            PrincipalKind::Admin => AuthServiceError::InvalidAdminCredentials,
        }
    }

    /// Look up the principal for either login step.
    async fn load_for_login(&self, email: &str) -> Result<Principal, Rejection> {
        let messages = self.messages();

        let mut tx = self.db.begin().await?;
        let principal = self.repository.find_by_email(&mut tx, email).await?;
        tx.commit().await?;

        let principal = principal
            .ok_or_else(|| reject(0, messages.not_found, self.login_not_found_error()))?;

        Ok(principal)
    }

    fn ensure_active(&self, principal: &Principal) -> Result<(), Rejection> {
        if principal.is_active() {
            return Ok(());
        }

        Err(reject(principal.id, self.messages().inactive, self.inactive_error()))
    }

    async fn start_login(&self, email: &str, password: &str) -> Result<CodeSent, Rejection> {
        let messages = self.messages();
        let principal = self.load_for_login(email).await?;

        if !verify_password(password, &principal.password_hash).await? {
            return Err(reject(
                principal.id,
                messages.wrong_password,
                self.bad_password_error(),
            ));
        }

        self.ensure_active(&principal)?;

        let user_id = (self.kind() == PrincipalKind::User).then_some(principal.id);

        let issued = self
            .verification
            .issue(email, self.kind().login_purpose(), user_id)
            .await
            .map_err(|error| {
                let error = AuthServiceError::from(error);
                reject(principal.id, &error.to_string(), error)
            })?;

        Ok(CodeSent {
            message: messages.code_sent.to_string(),
            expires_in: issued.ttl.as_secs(),
        })
    }

    async fn finish_login(
        &self,
        email: &str,
        code: &str,
        client: &ClientMeta,
    ) -> Result<(Principal, LoginEnvelope), Rejection> {
        let messages = self.messages();
        let principal = self.load_for_login(email).await?;

        self.ensure_active(&principal)?;

        let mut tx = self.db.begin().await?;

        let valid = self
            .verification
            .verify_in(&mut tx, email, self.kind().login_purpose(), code)
            .await
            .map_err(|error| {
                let error = AuthServiceError::from(error);
                reject(principal.id, &error.to_string(), error)
            })?;

        if !valid {
            return Err(reject(
                principal.id,
                messages.invalid_code,
                AuthServiceError::InvalidCode,
            ));
        }

        let principal = self.repository.record_login(&mut tx, principal.id).await?;

        let envelope = self
            .issue_tokens(&mut tx, &principal, &client.user_agent)
            .await?;

        tx.commit().await?;

        Ok((principal, envelope))
    }

    async fn issue_tokens(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        principal: &Principal,
        device_info: &str,
    ) -> Result<LoginEnvelope, AuthServiceError> {
        let kind = self.kind();

        let access =
            self.tokens
                .encode_access(principal.id, &principal.email, &principal.role, kind)?;

        let refresh =
            self.tokens
                .encode_refresh(principal.id, &principal.email, &principal.role, kind)?;

        self.repository
            .insert_refresh_token(tx, principal.id, &refresh.token, refresh.expires_at, device_info)
            .await?;

        Ok(LoginEnvelope {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: TOKEN_TYPE,
            expires_in: self.tokens.access_ttl().as_secs(),
            principal: principal.profile(),
            session: None,
        })
    }

    /// Build a journal entry with device and location details for `client`.
    async fn session_for(&self, client: &ClientMeta) -> NewLoginSession {
        let device = parse_user_agent(&client.user_agent);

        let mut session = NewLoginSession {
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            device_type: device.device_type,
            os: device.os,
            browser: device.browser,
            platform: device.platform,
            login_method: (self.kind() == PrincipalKind::User).then_some("email"),
            ..NewLoginSession::default()
        };

        if let Some(lookup) = &self.ip_lookup {
            match lookup.lookup(&client.ip).await {
                Ok(details) => {
                    session.country = details.country;
                    session.city = details.city;
                    session.region = details.region;
                    session.timezone = details.timezone;
                    session.organization = details.organization;
                    session.location = details.location;
                }
                Err(error) => debug!(ip = %client.ip, %error, "ip lookup skipped"),
            }
        }

        session
    }

    /// Write one journal entry. Journal failures are logged and never fail the login.
    async fn journal(
        &self,
        mut session: NewLoginSession,
        owner_id: i64,
        status: SessionStatus,
        reason: &str,
    ) -> NewLoginSession {
        session.owner_id = owner_id;
        session.status = status.as_str();
        session.reason = reason.to_string();

        let written = async {
            let mut tx = self.db.begin().await?;
            self.repository.insert_login_session(&mut tx, &session).await?;
            tx.commit().await
        }
        .await;

        if let Err(error) = written {
            error!(kind = %self.kind(), owner_id, %error, "failed to write login session");
        }

        session
    }

    async fn journal_failure(&self, client: &ClientMeta, rejection: Rejection) -> AuthServiceError {
        warn!(
            kind = %self.kind(),
            owner_id = rejection.owner_id,
            reason = %rejection.reason,
            "login attempt rejected"
        );

        let session = self.session_for(client).await;

        self.journal(session, rejection.owner_id, SessionStatus::Failed, &rejection.reason)
            .await;

        rejection.error
    }
}

fn reject(owner_id: i64, reason: &str, error: AuthServiceError) -> Rejection {
    Rejection {
        owner_id,
        reason: reason.to_string(),
        error,
    }
}

fn validate_password(password: &str) -> Result<(), AuthServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthServiceError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthServiceError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

    if !valid {
        return Err(AuthServiceError::Validation("invalid email address".to_string()));
    }

    Ok(())
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientMeta,
    ) -> Result<CodeSent, AuthServiceError> {
        match self.start_login(email, password).await {
            Ok(sent) => {
                info!(kind = %self.kind(), "login code issued");
                Ok(sent)
            }
            Err(rejection) => Err(self.journal_failure(client, rejection).await),
        }
    }

    async fn login_verify(
        &self,
        email: &str,
        code: &str,
        client: &ClientMeta,
    ) -> Result<LoginEnvelope, AuthServiceError> {
        match self.finish_login(email, code, client).await {
            Ok((principal, mut envelope)) => {
                let session = self.session_for(client).await;
                let session = self
                    .journal(session, principal.id, SessionStatus::Success, LOGIN_SUCCESS_REASON)
                    .await;

                info!(kind = %self.kind(), id = principal.id, "login completed");

                envelope.session = Some(SessionInfo::from(&session));

                Ok(envelope)
            }
            Err(rejection) => Err(self.journal_failure(client, rejection).await),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<LoginEnvelope, AuthServiceError> {
        let claims = self.tokens.decode_refresh(refresh_token)?;

        if claims.user_type != self.kind() {
            return Err(AuthServiceError::RefreshTokenInvalid);
        }

        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .find_refresh_token(&mut tx, refresh_token)
            .await?
            .filter(|record| {
                record.is_valid
                    && record.expires_at > Timestamp::now()
                    && record.owner_id == claims.user_id
            })
            .ok_or(AuthServiceError::RefreshTokenInvalid)?;

        let principal = self
            .repository
            .find_by_id(&mut tx, record.owner_id)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        tx.commit().await?;

        if !principal.is_active() {
            return Err(self.inactive_error());
        }

        let access =
            self.tokens
                .encode_access(principal.id, &principal.email, &principal.role, self.kind())?;

        debug!(kind = %self.kind(), id = principal.id, "access token refreshed");

        Ok(LoginEnvelope {
            access_token: access.token,
            refresh_token: record.token,
            token_type: TOKEN_TYPE,
            expires_in: self.tokens.access_ttl().as_secs(),
            principal: principal.profile(),
            session: None,
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<CodeSent, AuthServiceError> {
        let messages = self.messages();
        let ttl = self.verification.settings().code_ttl.as_secs();

        let generic = CodeSent {
            message: messages.reset_generic.to_string(),
            expires_in: ttl,
        };

        let mut tx = self.db.begin().await?;
        let principal = self.repository.find_by_email(&mut tx, email).await?;
        tx.commit().await?;

        let Some(principal) = principal.filter(Principal::is_active) else {
            debug!(kind = %self.kind(), "password reset requested for unknown or inactive email");
            return Ok(generic);
        };

        let user_id = (self.kind() == PrincipalKind::User).then_some(principal.id);

        match self
            .verification
            .issue(email, self.kind().reset_purpose(), user_id)
            .await
        {
            Ok(_) => Ok(CodeSent {
                message: messages.reset_code_sent.to_string(),
                expires_in: ttl,
            }),
            Err(error) if error.is_rate_limited() => {
                debug!(kind = %self.kind(), id = principal.id, "password reset code throttled");
                Ok(generic)
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<String, AuthServiceError> {
        validate_password(new_password)?;

        let password_hash = hash_password(new_password).await?;

        let mut tx = self.db.begin().await?;

        let principal = self
            .repository
            .find_by_email(&mut tx, email)
            .await?
            .ok_or_else(|| self.not_found_error())?;

        if !self
            .verification
            .verify_in(&mut tx, email, self.kind().reset_purpose(), code)
            .await?
        {
            return Err(AuthServiceError::InvalidCode);
        }

        self.repository
            .update_password(&mut tx, principal.id, &password_hash)
            .await?;

        let revoked = self
            .repository
            .revoke_refresh_tokens(&mut tx, principal.id)
            .await?;

        tx.commit().await?;

        info!(kind = %self.kind(), id = principal.id, revoked, "password reset");

        Ok(self.messages().reset_done.to_string())
    }

    async fn register(&self, email: &str, password: &str) -> Result<Profile, AuthServiceError> {
        if self.kind() != PrincipalKind::User {
            return Err(AuthServiceError::Forbidden);
        }

        validate_email(email)?;
        validate_password(password)?;

        let mut tx = self.db.begin().await?;

        if self.repository.find_by_email(&mut tx, email).await?.is_some() {
            return Err(AuthServiceError::EmailExists);
        }

        tx.commit().await?;

        let password_hash = hash_password(password).await?;

        let mut tx = self.db.begin().await?;

        let principal = self
            .repository
            .create(
                &mut tx,
                &NewPrincipal {
                    name: String::new(),
                    email: email.to_string(),
                    password_hash,
                    role: "user".to_string(),
                    status: "inactive",
                    is_super: false,
                },
            )
            .await?;

        tx.commit().await?;

        info!(id = principal.id, "user registered");

        Ok(principal.profile())
    }

    async fn authenticate(&self, access_token: &str) -> Result<Authenticated, AuthServiceError> {
        let claims = self.tokens.decode_access(access_token)?;

        if claims.user_type != self.kind() {
            return Err(AuthServiceError::Forbidden);
        }

        Ok(Authenticated {
            id: claims.user_id,
            email: claims.email,
            role: claims.role,
            kind: claims.user_type,
        })
    }

    async fn profile(&self, id: i64) -> Result<Profile, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let principal = self
            .repository
            .find_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| self.not_found_error())?;

        tx.commit().await?;

        Ok(principal.profile())
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and send a login code.
    async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientMeta,
    ) -> Result<CodeSent, AuthServiceError>;

    /// Consume a login code and issue tokens.
    async fn login_verify(
        &self,
        email: &str,
        code: &str,
        client: &ClientMeta,
    ) -> Result<LoginEnvelope, AuthServiceError>;

    /// Exchange a refresh token for a new access token. The refresh token is returned as is.
    async fn refresh(&self, refresh_token: &str) -> Result<LoginEnvelope, AuthServiceError>;

    /// Send a password reset code. The response does not reveal whether the email exists.
    async fn forgot_password(&self, email: &str) -> Result<CodeSent, AuthServiceError>;

    /// Replace the password and revoke every refresh token of the principal.
    async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<String, AuthServiceError>;

    /// Create an inactive user awaiting email verification.
    async fn register(&self, email: &str, password: &str) -> Result<Profile, AuthServiceError>;

    /// Resolve a bearer access token of this service's principal kind.
    async fn authenticate(&self, access_token: &str) -> Result<Authenticated, AuthServiceError>;

    async fn profile(&self, id: i64) -> Result<Profile, AuthServiceError>;
}
