pub const DEFAULT_MATCH_HOST: &str = "www.breakingpoint.gg";

/// Extracts `{id}` from `https://<host>/match/{id}/{slug}`.
///
/// Scheme and host compare case-insensitively; the id is returned verbatim.
/// A missing slug, another scheme or another host yields `None`.
pub fn parse_match_id(url: &str, expected_host: &str) -> Option<String> {
    let prefix = format!("https://{expected_host}/match/");
    let url = url.trim();

    let head = url.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(&prefix) {
        return None;
    }

    let (match_id, slug) = url[prefix.len()..].split_once('/')?;
    if match_id.is_empty() || slug.is_empty() {
        return None;
    }

    Some(match_id.to_string())
}

pub fn invalid_match_url_message(expected_host: &str) -> String {
    format!("Invalid match URL. Expected https://{expected_host}/match/{{id}}/{{slug}}")
}
