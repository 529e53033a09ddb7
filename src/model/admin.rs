use std::convert::Infallible;

use rocket::{
    http::{Cookie, CookieJar, SameSite},
    request::{FromRequest, Outcome},
    time::OffsetDateTime,
    Request,
};

use crate::error::{Error, Result};

/// Private cookie carrying the admin flag.
pub const ADMIN_SESSION_COOKIE: &str = "admin_authenticated";

/// Check a submitted password against the configured admin secret.
///
/// There is exactly one shared secret per deployment; an empty password never matches.
pub fn authenticate(secret: &str, password: &str) -> bool {
    !password.is_empty() && password == secret
}

/// Whether the current browser session belongs to the admin.
///
/// Obtained per request from the encrypted session cookie, so handlers receive
/// it explicitly rather than consulting shared state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession {
    authenticated: bool,
}

impl AdminSession {
    /// Read the session flag from the cookie jar.
    pub fn from_cookies(cookies: &CookieJar<'_>) -> Self {
        let authenticated = cookies
            .get_private(ADMIN_SESSION_COOKIE)
            .map_or(false, |cookie| cookie.value() == "true");
        Self { authenticated }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Succeed only for an authenticated session.
    pub fn require(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    /// Mark the browser session as authenticated.
    ///
    /// The cookie expires with the browser session.
    pub fn sign_in(cookies: &CookieJar<'_>) -> Self {
        let cookie = Cookie::build((ADMIN_SESSION_COOKIE, "true"))
            .http_only(true)
            .same_site(SameSite::Strict)
            .expires(None::<OffsetDateTime>);
        cookies.add_private(cookie);
        Self {
            authenticated: true,
        }
    }

    /// Clear the session flag.
    pub fn sign_out(cookies: &CookieJar<'_>) -> Self {
        cookies.remove_private(ADMIN_SESSION_COOKIE);
        Self::default()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Self::from_cookies(req.cookies()))
    }
}
