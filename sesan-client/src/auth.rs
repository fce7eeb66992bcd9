//! Authentication endpoints
//!
//! The service uses a two-step email verification flow: `register`/`login`
//! check credentials and send a 6-digit code to the user's email address;
//! `verify_register`/`verify_login` exchange that code for a bearer token.

use crate::ApiClient;
use sesan_common::types::{
    Credentials, MessageResponse, TokenResponse, UserInfo, VerificationRequest,
};
use sesan_common::Result;

impl ApiClient {
    /// Start registration; the service emails a verification code
    pub async fn register(&self, email: &str, password: &str) -> Result<MessageResponse> {
        self.post_json(
            "/api/auth/register",
            &Credentials {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    /// Complete registration with the emailed code, receiving a token
    pub async fn verify_register(&self, email: &str, code: &str) -> Result<TokenResponse> {
        self.post_json(
            "/api/auth/verify-register",
            &VerificationRequest {
                email: email.to_string(),
                code: code.to_string(),
            },
        )
        .await
    }

    /// Check credentials; on success the service emails a login code
    pub async fn login(&self, email: &str, password: &str) -> Result<MessageResponse> {
        self.post_json(
            "/api/auth/login",
            &Credentials {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    /// Complete login with the emailed code, receiving a token
    pub async fn verify_login(&self, email: &str, code: &str) -> Result<TokenResponse> {
        self.post_json(
            "/api/auth/verify-login",
            &VerificationRequest {
                email: email.to_string(),
                code: code.to_string(),
            },
        )
        .await
    }

    /// Ask for the verification code to be re-sent
    pub async fn resend_code(&self, email: &str) -> Result<MessageResponse> {
        self.post_json(
            "/api/auth/resend-code",
            &serde_json::json!({ "email": email }),
        )
        .await
    }

    /// Fetch the authenticated user's record
    pub async fn me(&self) -> Result<UserInfo> {
        self.get_json("/api/auth/me").await
    }
}
