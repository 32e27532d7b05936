//! Caller identification.
//!
//! The server does not issue credentials. It sits behind a gateway that authenticates users and forwards the login of
//! the caller in a request header (`X-Authenticated-User` unless configured otherwise). [`AuthenticatedLogin`] pulls
//! the login out of that header and rejects the request with a 401 if it is missing.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use log::*;

use crate::{config::DEFAULT_AUTH_HEADER, errors::ServerError};

/// The name of the header carrying the caller's login. Registered as app data by the server.
#[derive(Debug, Clone)]
pub struct AuthHeader(pub String);

impl Default for AuthHeader {
    fn default() -> Self {
        Self(DEFAULT_AUTH_HEADER.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedLogin(pub String);

impl AuthenticatedLogin {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromRequest for AuthenticatedLogin {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header =
            req.app_data::<web::Data<AuthHeader>>().map(|h| h.0.clone()).unwrap_or_else(|| AuthHeader::default().0);
        let login = req
            .headers()
            .get(header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| AuthenticatedLogin(s.to_string()));
        ready(login.ok_or_else(|| {
            debug!("💻️ Request to {} has no {header} header", req.path());
            ServerError::AuthenticationError(format!("The {header} header is missing or empty"))
        }))
    }
}
