//! Username and password generation for new accounts.

use rand::RngCore;

use crate::types::ClientIdentity;

/// Length cap for usernames derived from a domain.
const DOMAIN_USERNAME_MAX: usize = 16;
/// Length cap for the base of a fallback username, before the random suffix.
const FALLBACK_USERNAME_MAX: usize = 10;
/// Random bytes appended (hex encoded) to fallback usernames.
const SUFFIX_BYTES: usize = 2;
/// Random bytes in a generated password (hex encoded, so twice as many chars).
const PASSWORD_BYTES: usize = 10;

const DEFAULT_BASE: &str = "user";

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Leftmost label of `domain` with any `http://`/`https://` prefix removed.
fn domain_label(domain: &str) -> Option<&str> {
    let host = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    host.split('.').next().filter(|label| !label.is_empty())
}

fn client_base(client: &ClientIdentity) -> Option<String> {
    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }

    if let Some(company) = non_empty(&client.company) {
        return Some(company.to_string());
    }

    match (non_empty(&client.first_name), non_empty(&client.last_name)) {
        (Some(first), Some(last)) => first.chars().next().map(|initial| format!("{initial}{last}")),
        _ => None,
    }
}

/// Strip non-alphanumerics, lower-case, and make sure the result starts with a letter.
fn sanitize(base: &str) -> String {
    let cleaned: String = base
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if cleaned.starts_with(|c: char| c.is_ascii_lowercase()) {
        cleaned
    } else {
        format!("u{cleaned}")
    }
}

/// Generate a panel username.
///
/// The domain's leftmost label is preferred and used as-is (capped at 16
/// characters). Without a domain the client's company, or first initial plus
/// last name, or `user` is used, capped at 10 characters and followed by four
/// random hex characters.
pub fn generate_username(domain: Option<&str>, client: Option<&ClientIdentity>) -> String {
    if let Some(label) = domain.and_then(domain_label) {
        let mut username = sanitize(label);
        username.truncate(DOMAIN_USERNAME_MAX);
        return username;
    }

    let base = client
        .and_then(client_base)
        .unwrap_or_else(|| DEFAULT_BASE.to_string());
    let mut username = sanitize(&base);
    username.truncate(FALLBACK_USERNAME_MAX);
    username.push_str(&random_hex(SUFFIX_BYTES));
    username
}

/// Generate a 20-character hex password.
pub fn generate_password() -> String {
    random_hex(PASSWORD_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(company: Option<&str>, first: Option<&str>, last: Option<&str>) -> ClientIdentity {
        ClientIdentity {
            email: None,
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            company: company.map(String::from),
        }
    }

    fn split_suffix(username: &str) -> (&str, &str) {
        username.split_at(username.len() - SUFFIX_BYTES * 2)
    }

    #[test]
    fn domain_with_protocol() {
        assert_eq!(generate_username(Some("https://My-Example.com"), None), "myexample");
    }

    #[test]
    fn domain_takes_precedence_over_client() {
        let c = client(Some("Acme"), None, None);
        assert_eq!(generate_username(Some("shop.example.org"), Some(&c)), "shop");
    }

    #[test]
    fn domain_label_is_capped_without_suffix() {
        assert_eq!(
            generate_username(Some("averyveryverylongdomainname.com"), None),
            "averyveryverylon"
        );
    }

    #[test]
    fn numeric_domain_gets_letter_prefix() {
        assert_eq!(generate_username(Some("123host.net"), None), "u123host");
    }

    #[test]
    fn uppercase_protocol_is_not_stripped() {
        // "HTTPS://x.com" splits on '.', leaving "HTTPS://x" to sanitize.
        assert_eq!(generate_username(Some("HTTPS://x.com"), None), "httpsx");
    }

    #[test]
    fn empty_domain_falls_back() {
        let name = generate_username(Some(""), None);
        let (base, suffix) = split_suffix(&name);
        assert_eq!(base, "user");
        assert_eq!(suffix.len(), 4);
    }

    #[test]
    fn company_fallback() {
        let c = client(Some("Acme Hosting & Co."), Some("Jane"), Some("Doe"));
        let name = generate_username(None, Some(&c));
        let (base, suffix) = split_suffix(&name);
        assert_eq!(base, "acmehostin");
        assert!(suffix.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn initial_and_last_name_fallback() {
        let c = client(None, Some("Jane"), Some("O'Neil"));
        let name = generate_username(None, Some(&c));
        assert_eq!(split_suffix(&name).0, "joneil");
    }

    #[test]
    fn incomplete_name_uses_default() {
        let c = client(Some(""), Some("Jane"), None);
        let name = generate_username(None, Some(&c));
        assert_eq!(split_suffix(&name).0, "user");
    }

    #[test]
    fn password_is_twenty_hex_chars() {
        let password = generate_password();
        assert_eq!(password.len(), 20);
        assert!(password.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(password, generate_password());
    }
}
