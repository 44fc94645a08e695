//! Canonical request targets.
//!
//! A token signed for a URL must validate against the request that URL produces, whatever
//! the scheme, host or parameter order. The subject is therefore the path plus the query
//! with pairs sorted by key and the token parameter removed.

use crate::error::CsrfError;
use http::Uri;
use http::uri::PathAndQuery;
use url::form_urlencoded;

/// Decoded query pairs of `uri`, in their original order.
pub(crate) fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Path plus the query re-encoded in key order, without `parameter`.
pub(crate) fn canonical_subject(uri: &Uri, parameter: &str) -> String {
    let mut pairs: Vec<_> = query_pairs(uri).into_iter().filter(|(k, _)| k != parameter).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    with_query(path(uri), &pairs)
}

/// `uri` with `token` attached as `parameter`, replacing any previous value.
pub(crate) fn attach_token(uri: &Uri, parameter: &str, token: &str) -> Result<Uri, CsrfError> {
    let mut pairs: Vec<_> = query_pairs(uri).into_iter().filter(|(k, _)| k != parameter).collect();
    pairs.push((parameter.to_owned(), token.to_owned()));
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(with_query(path(uri), &pairs))?);
    Ok(Uri::from_parts(parts)?)
}

/// The value of `parameter`, if present.
pub(crate) fn token(uri: &Uri, parameter: &str) -> Option<String> {
    query_pairs(uri).into_iter().find(|(k, _)| k == parameter).map(|(_, v)| v)
}

fn path(uri: &Uri) -> &str {
    match uri.path() {
        "" => "/",
        path => path,
    }
}

fn with_query(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let query = form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();
    format!("{path}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().expect("uri")
    }

    #[test]
    fn scheme_host_and_order_do_not_matter() {
        let a = canonical_subject(&uri("https://shop.example.com/cart?b=2&a=1&csrf=x"), "csrf");
        let b = canonical_subject(&uri("/cart?a=1&b=2"), "csrf");
        assert_eq!(a, "/cart?a=1&b=2");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_query_is_dropped() {
        assert_eq!(canonical_subject(&uri("/checkout?csrf=abc"), "csrf"), "/checkout");
        assert_eq!(canonical_subject(&uri("https://example.com"), "csrf"), "/");
    }

    #[test]
    fn attach_replaces_existing_token() {
        let signed = attach_token(&uri("https://example.com/a?z=1&csrf=old"), "csrf", "new=").expect("attach");
        assert_eq!(signed.to_string(), "https://example.com/a?csrf=new%3D&z=1");
        assert_eq!(token(&signed, "csrf").as_deref(), Some("new="));
    }
}
