use std::iter;

/// Character substituted for every character of a masked password.
pub const MASK_CHAR: char = '*';

const PASSWORD_TOKEN: &str = "password=";

/// Renders `uri` for diagnostics: the value following every case-insensitive `password=` token,
/// up to the next `&` or the end of the string, is replaced with the same number of
/// [`MASK_CHAR`]s.
pub fn mask_password(uri: &str) -> String {
    // ASCII lowercasing keeps byte offsets intact, so indices found here are valid in `uri`
    let lowered = uri.to_ascii_lowercase();
    let mut masked = String::with_capacity(uri.len());
    let mut cursor = 0;

    while let Some(found) = lowered[cursor..].find(PASSWORD_TOKEN) {
        let value_start = cursor + found + PASSWORD_TOKEN.len();
        let value_end = value_end(uri, value_start);

        masked.push_str(&uri[cursor..value_start]);
        masked.extend(iter::repeat(MASK_CHAR).take(uri[value_start..value_end].chars().count()));

        cursor = value_end;
    }

    masked.push_str(&uri[cursor..]);
    masked
}

/// Returns the value of the first `password=` token in `uri`, if any.
pub fn password_value(uri: &str) -> Option<&str> {
    let value_start = uri.to_ascii_lowercase().find(PASSWORD_TOKEN)? + PASSWORD_TOKEN.len();
    Some(&uri[value_start..value_end(uri, value_start)])
}

fn value_end(uri: &str, value_start: usize) -> usize {
    uri[value_start..]
        .find('&')
        .map_or(uri.len(), |end| value_start + end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password_keeps_other_options() {
        assert_eq!(
            mask_password("jdbc:cassandra://h/ks?user=bob&password=secret&dc=dc1"),
            "jdbc:cassandra://h/ks?user=bob&password=******&dc=dc1"
        );
    }

    #[test]
    fn test_mask_password_is_case_insensitive() {
        assert_eq!(
            mask_password("jdbc:cassandra://h?PassWord=abc"),
            "jdbc:cassandra://h?PassWord=***"
        );
    }

    #[test]
    fn test_mask_password_masks_every_token() {
        let masked = mask_password(
            "jdbc:cassandra://h?password=a&javax.net.ssl.truststorepassword=changeit",
        );
        assert_eq!(
            masked,
            "jdbc:cassandra://h?password=*&javax.net.ssl.truststorepassword=********"
        );
    }

    #[test]
    fn test_mask_password_without_token() {
        let uri = "jdbc:cassandra://localhost/ks";
        assert_eq!(mask_password(uri), uri);
        assert_eq!(password_value(uri), None);
    }

    #[test]
    fn test_mask_password_preserves_value_length() {
        for uri in [
            "jdbc:cassandra://h?password=",
            "jdbc:cassandra://h?password=päss&user=x",
            "jdbc:cassandra://h;password=a;b",
        ] {
            let masked = mask_password(uri);
            assert_eq!(
                password_value(&masked).map(|value| value.chars().count()),
                password_value(uri).map(|value| value.chars().count())
            );
        }
    }

    #[test]
    fn test_password_value_stops_at_ampersand() {
        assert_eq!(
            password_value("jdbc:cassandra://h?password=pw&user=u"),
            Some("pw")
        );
    }
}
