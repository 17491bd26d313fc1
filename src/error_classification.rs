// A status code stands alone: no adjacent word characters or dots, so
// "5000ms" and "ext-1.400.0" don't count.
lazy_static::lazy_static! {
    static ref HTTP_5XX: regex::Regex = regex::Regex::new(r"(?:^|[^\w.])50[0234](?:[^\w.]|$)").unwrap();
    static ref HTTP_429: regex::Regex = regex::Regex::new(r"(?:^|[^\w.])429(?:[^\w.]|$)").unwrap();
    static ref HTTP_401: regex::Regex = regex::Regex::new(r"(?:^|[^\w.])401(?:[^\w.]|$)").unwrap();
    static ref HTTP_400: regex::Regex = regex::Regex::new(r"(?:^|[^\w.])400(?:[^\w.]|$)").unwrap();
}

/// Classify an API error message into a coarse category for user hints.
///
/// Returns one of: "rate_limit", "server", "network", "auth", "validation", "unknown".
pub(crate) fn classify_error(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if lower.contains("rate limit")
        || lower.contains("too many requests")
        || lower.contains("quota")
        || HTTP_429.is_match(&lower)
    {
        return "rate_limit";
    }

    if lower.contains("internal server error")
        || lower.contains("server_error")
        || lower.contains("service unavailable")
        || lower.contains("overloaded")
    {
        return "server";
    }
    if HTTP_5XX.is_match(&lower) {
        return "server";
    }

    if lower.contains("connection refused")
        || lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("dns error")
        || lower.contains("error sending request")
    {
        return "network";
    }

    if HTTP_401.is_match(&lower)
        || lower.contains("unauthorized")
        || lower.contains("incorrect api key")
        || lower.contains("invalid api key")
    {
        return "auth";
    }

    if lower.contains("invalid_request_error") || HTTP_400.is_match(&lower) {
        return "validation";
    }

    "unknown"
}

/// One-line hint for a category, if there is anything useful to say.
pub(crate) fn hint_for(category: &str) -> Option<&'static str> {
    match category {
        "rate_limit" => Some("the API is rate limiting this key; wait and try again"),
        "server" => Some("the API reported a server error; try again later"),
        "network" => Some("could not reach the API endpoint; check the network and api_endpoint"),
        "auth" => Some("the API rejected the key; run `dilly set-key` or set OPENAI_API_KEY"),
        "validation" => Some("the API rejected the request; check the model name in settings"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_errors() {
        assert_eq!(classify_error("rate limit exceeded"), "rate_limit");
        assert_eq!(classify_error("Too Many Requests"), "rate_limit");
        assert_eq!(classify_error("You exceeded your current quota"), "rate_limit");
        assert_eq!(classify_error("API returned 429 Too Many Requests: {}"), "rate_limit");
    }

    #[test]
    fn classifies_server_errors() {
        assert_eq!(classify_error("Internal server error"), "server");
        assert_eq!(classify_error("API returned 500 Internal Server Error: boom"), "server");
        assert_eq!(classify_error("Error 502 Bad Gateway"), "server");
        assert_eq!(classify_error("503 Service Unavailable"), "server");
        assert_eq!(classify_error("The engine is currently overloaded"), "server");
    }

    #[test]
    fn numeric_codes_need_word_boundaries() {
        assert_eq!(classify_error("took 5000ms"), "unknown");
        assert_eq!(classify_error("id 15001"), "unknown");
        assert_eq!(classify_error("build 1.502.3"), "unknown");
    }

    #[test]
    fn classifies_network_errors() {
        assert_eq!(classify_error("error sending request for url"), "network");
        assert_eq!(classify_error("connection refused"), "network");
        assert_eq!(classify_error("operation timed out"), "network");
    }

    #[test]
    fn classifies_auth_errors() {
        assert_eq!(classify_error("API returned 401 Unauthorized: {}"), "auth");
        assert_eq!(classify_error("Incorrect API key provided: sk-..."), "auth");
    }

    #[test]
    fn auth_and_validation_codes_need_word_boundaries() {
        assert_eq!(classify_error("failed to read ext-1.400.0/package.json"), "unknown");
        assert_eq!(classify_error("version 2.401.1"), "unknown");
        assert_eq!(classify_error("took 4010ms"), "unknown");
        assert_eq!(classify_error("id 14001"), "unknown");
        assert_eq!(classify_error("offset 4290"), "unknown");
        assert_eq!(classify_error("API returned 400: bad"), "validation");
    }

    #[test]
    fn classifies_validation_errors() {
        assert_eq!(
            classify_error(r#"API returned 400 Bad Request: {"type":"invalid_request_error"}"#),
            "validation"
        );
    }

    #[test]
    fn unknown_has_no_hint() {
        assert_eq!(classify_error("something odd"), "unknown");
        assert!(hint_for("unknown").is_none());
        assert!(hint_for("auth").is_some());
    }
}
