use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const AUTH_COOKIE: &str = "moneywise_auth";
pub const SESSION_COOKIE: &str = "moneywise_session";

fn essential(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn with_ticket(jar: CookieJar, ticket: String, secure: bool) -> CookieJar {
    jar.add(essential(AUTH_COOKIE, ticket, secure))
}

pub fn with_session(jar: CookieJar, ticket: String, session_id: String, secure: bool) -> CookieJar {
    with_ticket(jar, ticket, secure).add(essential(SESSION_COOKIE, session_id, secure))
}

fn removal(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// Expires both cookies on the client, whether or not the request sent them.
pub fn cleared(jar: CookieJar) -> CookieJar {
    jar.add(removal(AUTH_COOKIE)).add(removal(SESSION_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn set_cookies(jar: CookieJar) -> Vec<String> {
        let response = (jar, "").into_response();
        response
            .headers()
            .get_all(axum::http::header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn issued_cookies_are_http_only() {
        let headers = set_cookies(with_session(CookieJar::new(), "t".into(), "s".into(), true));
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|h| h.contains("HttpOnly") && h.contains("Secure")));
        assert!(headers.iter().any(|h| h.starts_with("moneywise_auth=t")));
        assert!(headers.iter().any(|h| h.starts_with("moneywise_session=s")));
    }

    #[test]
    fn clearing_an_empty_jar_still_expires_both_cookies() {
        let headers = set_cookies(cleared(CookieJar::new()));
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|h| h.contains("Max-Age=0")));
    }
}
