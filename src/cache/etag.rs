//! Deterministic, order-independent ETag generation.
//!
//! Inputs are explicitly sorted before hashing, so equal logical input
//! yields an identical tag regardless of the iteration order of whatever
//! container supplied the parts.

use sha2::{Digest, Sha256};

/// Combine input parts into an opaque ETag.
pub fn generate<I>(parts: I) -> String
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut parts: Vec<String> = parts.into_iter().map(Into::into).collect();
    parts.sort();

    let mut hasher = Sha256::new();
    for part in &parts {
        hasher.update(part.as_bytes());
        // Separator prevents ["ab","c"] colliding with ["a","bc"].
        hasher.update([0x1f]);
    }
    let digest = hasher.finalize();
    format!("\"{}\"", hex::encode(&digest[..16]))
}

/// Header name/value pairs as ETag parts, restricted to an allow-list.
///
/// The allow-list is expected pre-sorted and lowercase
/// (see [`DeliveryOptions::normalize`](crate::config::DeliveryOptions::normalize)).
pub fn header_parts(
    allow_list: &[String],
    headers: &[(String, String)],
) -> Vec<String> {
    let mut parts = Vec::new();
    for name in allow_list {
        for (header, value) in headers {
            if header.eq_ignore_ascii_case(name) {
                parts.push(format!("{name}={value}"));
            }
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_independent() {
        let a = generate(["content:1", "content:2", "content:3"]);
        let b = generate(["content:3", "content:1", "content:2"]);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_input_distinct_tag() {
        assert_ne!(generate(["content:1"]), generate(["content:2"]));
    }

    #[test]
    fn concatenation_does_not_collide() {
        assert_ne!(generate(["ab", "c"]), generate(["a", "bc"]));
    }

    #[test]
    fn header_parts_follow_allow_list() {
        let allow = vec!["accept".to_string(), "accept-language".to_string()];
        let headers = vec![
            ("Accept-Language".to_string(), "sv".to_string()),
            ("Authorization".to_string(), "secret".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        let parts = header_parts(&allow, &headers);
        assert_eq!(
            parts,
            vec!["accept=application/json", "accept-language=sv"]
        );
    }
}
