//! Helpers for joining server routes onto a configured base URL.

/// Strips trailing slashes so endpoint joins never produce `//`.
///
/// ```
/// use campus_chat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:5000/"), "http://localhost:5000");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Joins a route such as `api/chat/stream` onto the server base URL.
///
/// ```
/// use campus_chat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:5000/", "/api/admin/sync"),
///     "http://localhost:5000/api/admin/sync"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

/// Checks a user-supplied server URL before it is saved to config.
pub fn validate_server_url(candidate: &str) -> Result<String, String> {
    let normalized = normalize_base_url(candidate);
    let url = reqwest::Url::parse(&normalized)
        .map_err(|err| format!("Invalid server URL '{candidate}': {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "Server URL must start with http:// or https://: {candidate}"
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(format!("Server URL is missing a host: {candidate}"));
    }
    Ok(normalized)
}
