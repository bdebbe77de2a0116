//! Cookie lookup seam used to source the anti-forgery token.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

/// Looks up cookie values by name.
#[cfg_attr(test, mockall::automock)]
pub trait CookieSource: Send + Sync {
    /// The value of the named cookie, if present.
    fn get_cookie(&self, name: &str) -> Option<String>;
}

/// [`CookieSource`] reading the cookies a `reqwest` jar holds for one origin.
#[derive(Debug, Clone)]
pub struct JarCookieSource {
    jar: Arc<Jar>,
    origin: Url,
}

impl JarCookieSource {
    /// Reads cookies scoped to `origin` from `jar`.
    #[must_use]
    pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
        Self { jar, origin }
    }
}

impl CookieSource for JarCookieSource {
    fn get_cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.origin)?;
        cookie_value(header.to_str().ok()?, name)
    }
}

/// Extracts one cookie from a `Cookie` header value (`a=1; b=2`).
#[must_use]
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}
