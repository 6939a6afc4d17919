//! Account batch parsing
//!
//! Turns the raw `ACCOUNTS` string into an ordered list of credential pairs.
//! Parsing is the only place a fatal error can originate: everything after it
//! degrades per account instead of aborting the run.

use thiserror::Error;

/// Fatal configuration errors, raised before any browser session is opened.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No accounts configured, set ACCOUNTS to \"user1:pass1,user2:pass2\"")]
    MissingAccounts,

    #[error("Account configuration yielded no valid credentials")]
    NoValidCredentials,
}

/// A username/password pair to be authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub pass: String,
}

/// Parse the raw account batch string.
///
/// Accounts are separated by `,` or `;`; each entry is `username:password`,
/// split on the first `:`, with surrounding whitespace trimmed from both
/// fields. Entries that do not yield two non-empty fields are dropped
/// silently. Insertion order is processing order.
pub fn parse(raw: Option<&str>) -> Result<Vec<Credential>, ConfigError> {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Err(ConfigError::MissingAccounts),
    };

    let credentials: Vec<Credential> = raw
        .split([',', ';'])
        .filter_map(|entry| {
            let (user, pass) = entry.split_once(':')?;
            let user = user.trim();
            let pass = pass.trim();
            if user.is_empty() || pass.is_empty() {
                return None;
            }
            Some(Credential {
                user: user.to_string(),
                pass: pass.to_string(),
            })
        })
        .collect();

    if credentials.is_empty() {
        return Err(ConfigError::NoValidCredentials);
    }

    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(user: &str, pass: &str) -> Credential {
        Credential {
            user: user.to_string(),
            pass: pass.to_string(),
        }
    }

    #[test]
    fn test_parse_comma_separated() {
        let batch = parse(Some("a:1,b:2")).unwrap();
        assert_eq!(batch, vec![cred("a", "1"), cred("b", "2")]);
    }

    #[test]
    fn test_parse_semicolon_separated() {
        let batch = parse(Some("a:1;b:2")).unwrap();
        assert_eq!(batch, vec![cred("a", "1"), cred("b", "2")]);
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let batch = parse(Some("a:1;;b:2")).unwrap();
        assert_eq!(batch, vec![cred("a", "1"), cred("b", "2")]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let batch = parse(Some(" a : 1 , b:2")).unwrap();
        assert_eq!(batch, vec![cred("a", "1"), cred("b", "2")]);
    }

    #[test]
    fn test_password_keeps_later_colons() {
        let batch = parse(Some("a:p:q")).unwrap();
        assert_eq!(batch, vec![cred("a", "p:q")]);
    }

    #[test]
    fn test_entry_without_password_is_dropped() {
        let batch = parse(Some("a:1,b:")).unwrap();
        assert_eq!(batch, vec![cred("a", "1")]);
    }

    #[test]
    fn test_missing_input_is_fatal() {
        assert!(matches!(parse(None), Err(ConfigError::MissingAccounts)));
        assert!(matches!(parse(Some("")), Err(ConfigError::MissingAccounts)));
        assert!(matches!(parse(Some("   ")), Err(ConfigError::MissingAccounts)));
    }

    #[test]
    fn test_garbage_input_yields_no_credentials() {
        assert!(matches!(
            parse(Some("garbage")),
            Err(ConfigError::NoValidCredentials)
        ));
        assert!(matches!(
            parse(Some(":,;:")),
            Err(ConfigError::NoValidCredentials)
        ));
    }

    #[test]
    fn test_order_is_preserved() {
        let batch = parse(Some("z:1,a:2,m:3")).unwrap();
        let users: Vec<&str> = batch.iter().map(|c| c.user.as_str()).collect();
        assert_eq!(users, vec!["z", "a", "m"]);
    }
}
