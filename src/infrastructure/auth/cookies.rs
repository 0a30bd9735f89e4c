use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::domain::auth::TokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Attributes shared by both token cookies
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    fn token_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .path("/")
            .build()
    }

    /// Write both tokens. Both cookies go out in the same response or neither does.
    pub fn set_tokens(&self, jar: CookieJar, tokens: &TokenPair) -> CookieJar {
        jar.add(self.token_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
            .add(self.token_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
    }

    /// Expire both cookies, whether or not the request carried them
    pub fn clear_tokens(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.removal_cookie(ACCESS_TOKEN_COOKIE))
            .add(self.removal_cookie(REFRESH_TOKEN_COOKIE))
    }

    fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.token_cookie(name, String::new());
        cookie.make_removal();
        cookie
    }
}

/// Cookie value, ignoring empty ones
pub fn token_from_jar(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
