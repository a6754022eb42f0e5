// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

/// Value of `name` in a `Cookie` header such as `a=1; csrftoken=abc`.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"').to_owned())
    })
}

/// Anti-forgery token: the cookie wins over the hidden page field. Neither
/// yields an empty string, which the server is free to reject.
pub fn resolve_csrf_token(
    cookie_header: Option<&str>,
    cookie_name: &str,
    page_token: Option<&str>,
) -> String {
    if let Some(token) = cookie_header
        .and_then(|header| cookie_value(header, cookie_name))
        .filter(|token| !token.is_empty())
    {
        return token;
    }
    if let Some(token) = page_token.map(str::trim).filter(|token| !token.is_empty()) {
        return token.to_owned();
    }
    tracing::error!(cookie = cookie_name, "anti-forgery token not found");
    String::new()
}
