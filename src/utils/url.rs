//! Endpoint URL assembly.

/// Join a base URL and an endpoint path with exactly one slash between them.
///
/// # Examples
///
/// ```
/// use parlance::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.openai.com/v1/", "/responses"),
///     "https://api.openai.com/v1/responses"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_duplicate_slashes() {
        assert_eq!(
            construct_api_url("https://api.example.com/v1", "responses"),
            "https://api.example.com/v1/responses"
        );
        assert_eq!(
            construct_api_url("https://api.example.com/v1///", "///responses"),
            "https://api.example.com/v1/responses"
        );
    }

    #[test]
    fn trims_surrounding_whitespace_from_base() {
        assert_eq!(
            construct_api_url("  http://localhost:8080/ ", "responses"),
            "http://localhost:8080/responses"
        );
    }
}
