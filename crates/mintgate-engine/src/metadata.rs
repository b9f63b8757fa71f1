use mintgate_core::types::TokenId;

/// Compose a token URI: `base || decimal(id) || suffix`. An empty base URI
/// yields the empty string regardless of suffix.
pub fn compose_token_uri(base_uri: &str, token_id: TokenId, suffix: &str) -> String {
    if base_uri.is_empty() {
        return String::new();
    }
    format!("{base_uri}{token_id}{suffix}")
}
