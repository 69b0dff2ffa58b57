//! Query string dictionary for request parameters.
//!
//! [`QueryDict`] is an insertion-ordered multi-value dictionary used for both
//! GET query strings and `application/x-www-form-urlencoded` POST bodies.
//! Keeping key order is what lets [`query_transform`] rebuild a link with the
//! caller's parameters in the order they arrived.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped when encoding: the RFC 3986 unreserved set.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Like [`QUERY_ENCODE_SET`] but keeps `/`, for paths carried in `next`.
const NEXT_ENCODE_SET: &AsciiSet = &QUERY_ENCODE_SET.remove(b'/');

/// An ordered dictionary mapping each key to one or more string values.
///
/// # Examples
///
/// ```
/// use taxi_http::QueryDict;
///
/// let qd = QueryDict::parse("drivers=1&drivers=2&model=Corolla");
/// assert_eq!(qd.get("model"), Some("Corolla"));
/// assert_eq!(qd.get_list("drivers"), vec!["1", "2"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryDict {
    /// Creates a new, empty `QueryDict`.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parses a URL query string or form body (e.g. `"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding, `+` as space, and repeated keys. Empty pairs
    /// are skipped; a pair without `=` has an empty value.
    pub fn parse(query_string: &str) -> Self {
        let mut qd = Self::new();
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);

        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            qd.append(&percent_decode(key), &percent_decode(value));
        }

        qd
    }

    /// Builds a `QueryDict` from key/value pairs, keeping their order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut qd = Self::new();
        for (k, v) in pairs {
            qd.append(k.as_ref(), v.as_ref());
        }
        qd
    }

    /// Returns the last value for the given key, or `None` if not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key)
            .and_then(|i| self.entries[i].1.last())
            .map(String::as_str)
    }

    /// Returns all values for the given key, empty if the key is absent.
    pub fn get_list(&self, key: &str) -> Vec<&str> {
        self.position(key)
            .map(|i| self.entries[i].1.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Sets a single value for the given key, replacing any existing values.
    /// A new key goes to the end; an existing key keeps its position.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.position(key) {
            Some(i) => self.entries[i].1 = vec![value.to_string()],
            None => self
                .entries
                .push((key.to_string(), vec![value.to_string()])),
        }
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: &str, value: &str) {
        match self.position(key) {
            Some(i) => self.entries[i].1.push(value.to_string()),
            None => self
                .entries
                .push((key.to_string(), vec![value.to_string()])),
        }
    }

    /// Removes a key and all of its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Encodes every value of every key, in insertion order.
    pub fn urlencode(&self) -> String {
        self.entries
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| encode_pair(key, v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

/// Merges override values into a set of query parameters and encodes the result.
///
/// Original keys come first in their original order, each with its override
/// value if one is given or else its own (last) value. Keys that only appear
/// in `overrides` follow, in argument order. Each key appears exactly once.
///
/// # Examples
///
/// ```
/// use taxi_http::{query_transform, QueryDict};
///
/// let params = QueryDict::parse("param1=value1&param2=value2");
/// let query = query_transform(&params, &[("param1", "new_value1"), ("param3", "value3")]);
/// assert_eq!(query, "param1=new_value1&param2=value2&param3=value3");
/// ```
pub fn query_transform(params: &QueryDict, overrides: &[(&str, &str)]) -> String {
    let mut merged: Vec<(&str, &str)> = params
        .entries
        .iter()
        .filter_map(|(key, values)| values.last().map(|v| (key.as_str(), v.as_str())))
        .collect();

    for &(key, value) in overrides {
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => merged.push((key, value)),
        }
    }

    merged
        .into_iter()
        .map(|(k, v)| encode_pair(k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the login URL carrying `next` so the user returns to `next`
/// after signing in: `/accounts/login/?next=/cars/%3Fpage%3D2`.
pub fn redirect_to_login_url(login_url: &str, next: &str) -> String {
    let separator = if login_url.contains('?') { '&' } else { '?' };
    let next = percent_encoding::utf8_percent_encode(next, NEXT_ENCODE_SET);
    format!("{login_url}{separator}next={next}")
}

fn encode_pair(key: &str, value: &str) -> String {
    format!("{}={}", percent_encode(key), percent_encode(value))
}

/// Decodes a percent-encoded string, treating `+` as a space.
fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Percent-encodes a string for use in a URL query.
fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_to_login_url() {
        assert_eq!(
            redirect_to_login_url("/accounts/login/", "/cars/"),
            "/accounts/login/?next=/cars/"
        );
        assert_eq!(
            redirect_to_login_url("/accounts/login/", "/drivers/?page=2"),
            "/accounts/login/?next=/drivers/%3Fpage%3D2"
        );
        assert_eq!(
            redirect_to_login_url("/login/?lang=en", "/"),
            "/login/?lang=en&next=/"
        );
    }

    #[test]
    fn test_new_is_empty() {
        let qd = QueryDict::new();
        assert!(qd.is_empty());
        assert_eq!(qd.len(), 0);
        assert_eq!(qd.urlencode(), "");
    }

    #[test]
    fn test_parse_multiple_values() {
        let qd = QueryDict::parse("drivers=3&model=X5&drivers=7");
        assert_eq!(qd.len(), 2);
        assert_eq!(qd.get("drivers"), Some("7"));
        assert_eq!(qd.get_list("drivers"), vec!["3", "7"]);
        assert_eq!(qd.keys().collect::<Vec<_>>(), vec!["drivers", "model"]);
    }

    #[test]
    fn test_parse_edge_cases() {
        let qd = QueryDict::parse("?&username&page=&&");
        assert_eq!(qd.get("username"), Some(""));
        assert_eq!(qd.get("page"), Some(""));
        assert_eq!(qd.len(), 2);
    }

    #[test]
    fn test_parse_percent_and_plus() {
        let qd = QueryDict::parse("username=user%21%40%23&name=Land+Rover");
        assert_eq!(qd.get("username"), Some("user!@#"));
        assert_eq!(qd.get("name"), Some("Land Rover"));
    }

    #[test]
    fn test_get_missing_key() {
        let qd = QueryDict::parse("a=1");
        assert_eq!(qd.get("b"), None);
        assert!(qd.get_list("b").is_empty());
        assert!(!qd.contains_key("b"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut qd = QueryDict::parse("page=1&model=Corolla&page=2");
        qd.set("page", "3");
        qd.set("sort", "asc");
        assert_eq!(qd.urlencode(), "page=3&model=Corolla&sort=asc");
    }

    #[test]
    fn test_remove() {
        let mut qd = QueryDict::parse("a=1&b=2&a=3");
        assert_eq!(qd.remove("a"), Some(vec!["1".to_string(), "3".to_string()]));
        assert_eq!(qd.remove("a"), None);
        assert_eq!(qd.urlencode(), "b=2");
    }

    #[test]
    fn test_urlencode_keeps_order_and_escapes() {
        let qd = QueryDict::from_pairs([("name", "Land Rover"), ("country", "UK&Co")]);
        assert_eq!(qd.urlencode(), "name=Land%20Rover&country=UK%26Co");
    }

    #[test]
    fn test_query_transform_merge() {
        let params = QueryDict::from_pairs([("param1", "value1"), ("param2", "value2")]);
        let query = query_transform(&params, &[("param1", "new_value1"), ("param3", "value3")]);
        assert_eq!(query, "param1=new_value1&param2=value2&param3=value3");
    }

    #[test]
    fn test_query_transform_preserves_search_filter() {
        let params = QueryDict::parse("username=bob&page=2");
        assert_eq!(query_transform(&params, &[("page", "3")]), "username=bob&page=3");
    }

    #[test]
    fn test_query_transform_empty_params() {
        let params = QueryDict::new();
        assert_eq!(query_transform(&params, &[("page", "2")]), "page=2");
        assert_eq!(query_transform(&params, &[]), "");
    }

    #[test]
    fn test_query_transform_repeated_key_appears_once() {
        let params = QueryDict::parse("tag=a&tag=b&page=1");
        assert_eq!(query_transform(&params, &[]), "tag=b&page=1");
        let twice = query_transform(&params, &[("new", "1"), ("new", "2")]);
        assert_eq!(twice, "tag=b&page=1&new=2");
    }

    #[test]
    fn test_query_transform_unreserved_not_escaped() {
        let params = QueryDict::from_pairs([("q", "a-b_c.d~e")]);
        assert_eq!(query_transform(&params, &[]), "q=a-b_c.d~e");
    }
}
