use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;

pub const SESSION_COOKIE: &str = "session_id";

pub fn session_cookie(session_id: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Overwrites the session cookie with an already-expired one.
pub fn clear_session_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    let expired = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build();
    jar.add(expired)
}
