use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, instrument, warn};

use super::claims::Subject;
use super::jwt::JwtKeys;
use super::password::{burn_hash, hash_password, verify_password};
use super::proof::SignupProofs;
use super::repo::UserStore;
use super::repo_types::NewUser;
use super::roles::Role;
use crate::error::AppError;
use crate::state::AppState;

/// Signup parameters after request validation.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Signup, signin and product-key issuance.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: Arc<JwtKeys>,
    proofs: Arc<SignupProofs>,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.jwt.clone(), state.proofs.clone())
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: Arc<JwtKeys>, proofs: Arc<SignupProofs>) -> Self {
        Self { users, jwt, proofs }
    }

    #[instrument(skip(self, params, proof), fields(email = %params.email))]
    pub async fn sign_up(
        &self,
        params: SignUp,
        role: Role,
        proof: Option<&str>,
    ) -> Result<String, AppError> {
        let email = normalize_email(&params.email);

        if self.users.find_by_email(&email).await?.is_some() {
            warn!("email already registered");
            return Err(AppError::DuplicateUser);
        }

        if role.is_privileged() {
            let Some(proof) = proof else {
                warn!(%role, "privileged signup without product key");
                return Err(AppError::Unauthorized);
            };
            if !self.proofs.verify(&email, role, proof) {
                warn!(%role, "privileged signup with invalid product key");
                return Err(AppError::Unauthorized);
            }
        }

        let password_hash = hash_password(&params.password)?;
        let user = self
            .users
            .create(NewUser {
                email,
                name: params.name,
                phone: params.phone,
                password_hash,
                role,
            })
            .await?;

        let token = self.jwt.issue_default(&Subject::from(&user))?;
        info!(user_id = user.id, role = %user.role, "user registered");
        Ok(token)
    }

    #[instrument(skip(self, email, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            burn_hash(password);
            warn!(email = %email, "signin unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "signin invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.jwt.issue_default(&Subject::from(&user))?;
        info!(user_id = user.id, "user signed in");
        Ok(token)
    }

    /// Product key an administrator hands out for a privileged signup.
    pub fn generate_signup_proof(&self, email: &str, role: Role) -> String {
        self.proofs.generate(&normalize_email(email), role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::SystemClock;
    use crate::auth::repo::MemoryUserStore;
    use std::time::Duration;

    fn service() -> AuthService {
        let jwt = JwtKeys::new(b"service-test-secret", Duration::from_secs(600), Arc::new(SystemClock))
            .unwrap();
        AuthService::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(jwt),
            Arc::new(SignupProofs::new("product-secret").unwrap()),
        )
    }

    fn params(email: &str) -> SignUp {
        SignUp {
            email: email.into(),
            password: "hunter22".into(),
            name: "Pat".into(),
            phone: "+15551234567".into(),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_yields_token_for_same_user() {
        let svc = service();
        let signup_token = svc.sign_up(params("pat@example.com"), Role::Buyer, None).await.unwrap();
        let signin_token = svc.sign_in("pat@example.com", "hunter22").await.unwrap();

        let a = svc.jwt.verify(&signup_token).unwrap();
        let b = svc.jwt.verify(&signin_token).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.name, "Pat");

        let stored = svc.users.find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Buyer);
        assert_ne!(stored.password_hash, "hunter22");
    }

    #[tokio::test]
    async fn email_is_normalized() {
        let svc = service();
        svc.sign_up(params("  Pat@Example.COM "), Role::Buyer, None).await.unwrap();
        assert!(svc.sign_in("pat@example.com", "hunter22").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let svc = service();
        svc.sign_up(params("dup@example.com"), Role::Buyer, None).await.unwrap();
        let err = svc.sign_up(params("dup@example.com"), Role::Buyer, None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));
    }

    #[tokio::test]
    async fn privileged_signup_requires_valid_proof() {
        let svc = service();
        let missing = svc.sign_up(params("r@example.com"), Role::Realtor, None).await.unwrap_err();
        assert!(matches!(missing, AppError::Unauthorized));

        let wrong = svc
            .sign_up(params("r@example.com"), Role::Realtor, Some("deadbeef"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::Unauthorized));

        // key minted for another role does not work
        let admin_key = svc.generate_signup_proof("r@example.com", Role::Admin);
        let cross = svc
            .sign_up(params("r@example.com"), Role::Realtor, Some(&admin_key))
            .await
            .unwrap_err();
        assert!(matches!(cross, AppError::Unauthorized));

        let key = svc.generate_signup_proof("r@example.com", Role::Realtor);
        let token = svc.sign_up(params("r@example.com"), Role::Realtor, Some(&key)).await.unwrap();
        let identity = svc.jwt.verify(&token).unwrap();
        let stored = svc.users.find_by_id(identity.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Realtor);
    }

    #[tokio::test]
    async fn sign_in_failures_are_indistinguishable() {
        let svc = service();
        svc.sign_up(params("known@example.com"), Role::Buyer, None).await.unwrap();

        let unknown = svc.sign_in("nobody@example.com", "hunter22").await.unwrap_err();
        let wrong = svc.sign_in("known@example.com", "not-it").await.unwrap_err();
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.user_message(), wrong.user_message());
        assert_eq!(unknown.code(), wrong.code());
    }
}
