use std::future::{ready, Ready};

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::Cookie;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponseBuilder};
use serde::Deserialize;

use super::DEFAULT_CURRENCY;

pub const COOKIE_SESSION_ID: &str = "shop_session-id";
pub const COOKIE_CURRENCY: &str = "shop_currency";
const COOKIE_MAX_AGE_HOURS: i64 = 48;

#[derive(Deserialize)]
struct UserOverride {
    user_id: Option<String>,
}

/// Per-request shopper identity, read from cookies.
///
/// A first visit gets a fresh UUID, written back by [`Session::attach`].
/// A non-empty `user_id` query value takes precedence over the cookie.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    user_override: Option<String>,
    currency: String,
    is_new: bool,
}

impl Session {
    fn from_http(req: &HttpRequest) -> Self {
        let existing = req
            .cookie(COOKIE_SESSION_ID)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());
        let is_new = existing.is_none();
        let session_id = existing.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let currency = req
            .cookie(COOKIE_CURRENCY)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let user_override = web::Query::<UserOverride>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.into_inner().user_id)
            .filter(|v| !v.is_empty());

        Self {
            session_id,
            user_override,
            currency,
            is_new,
        }
    }

    /// The user ID for backend calls. A form value wins over query and cookie.
    pub fn user_id(&self, form_value: Option<&str>) -> String {
        form_value
            .filter(|v| !v.is_empty())
            .or(self.user_override.as_deref())
            .unwrap_or(&self.session_id)
            .to_string()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Set the session cookie on the response if this visit created it.
    pub fn attach(&self, response: &mut HttpResponseBuilder) {
        if self.is_new {
            response.cookie(long_lived(COOKIE_SESSION_ID, self.session_id.clone()));
        }
    }
}

pub fn long_lived(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .max_age(CookieDuration::hours(COOKIE_MAX_AGE_HOURS))
        .finish()
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Session::from_http(req)))
    }
}
