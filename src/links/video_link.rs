use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use url::Url;

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";
const EMBED_URL_BASE: &str = "https://www.youtube.com/embed/";

lazy_static! {
    static ref FALLBACK_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"[?&]v=([^&#]+)").expect("valid watch id pattern"),
        Regex::new(r"youtu\.be/([^?&#/]+)").expect("valid short link pattern"),
        Regex::new(r"youtube\.com/embed/([^?&#/]+)").expect("valid embed pattern"),
        Regex::new(r"youtube\.com/live/([^?&#/]+)").expect("valid live pattern"),
    ];
    static ref FALLBACK_START_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"[?&]t=([^&#]+)").expect("valid t pattern"),
        Regex::new(r"[?&]start=([^&#]+)").expect("valid start pattern"),
    ];
    static ref COMPOUND_OFFSET: Regex =
        Regex::new(r"(?i)^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?").expect("valid offset pattern");
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub video_id: String,
    pub start_seconds: u64,
}

impl VideoRef {
    pub fn watch_url(&self) -> String {
        watch_url(&self.video_id)
    }

    pub fn embed_url(&self, origin: Option<&str>) -> String {
        embed_url(&self.video_id, self.start_seconds, origin)
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_BASE}{video_id}")
}

pub fn embed_url(video_id: &str, start_seconds: u64, origin: Option<&str>) -> String {
    let mut embed = format!("{EMBED_URL_BASE}{video_id}?enablejsapi=1");
    if start_seconds > 0 {
        embed.push_str(&format!("&start={start_seconds}"));
    }
    if let Some(origin) = origin.map(str::trim).filter(|value| !value.is_empty()) {
        let encoded: String = url::form_urlencoded::byte_serialize(origin.as_bytes()).collect();
        embed.push_str(&format!("&origin={encoded}"));
    }
    embed
}

/// Recovers a video id and start offset from a watch, embed, live or short link.
///
/// A structural parse runs first; when the input is not a valid absolute URL or
/// yields no id, a pattern scan over the raw text gets a second chance.
pub fn parse_video_ref(raw_url: &str) -> Option<VideoRef> {
    let raw_url = raw_url.trim();
    if raw_url.is_empty() {
        return None;
    }

    match parse_structured(raw_url) {
        Ok(Some(video)) => return Some(video),
        Ok(None) => {
            tracing::debug!(url = raw_url, "Video URL parsed but carried no id, scanning raw text");
        }
        Err(error) => {
            tracing::debug!(url = raw_url, parse_error = %error, "Video URL is not absolute, scanning raw text");
        }
    }

    parse_permissive(raw_url)
}

fn parse_structured(raw_url: &str) -> Result<Option<VideoRef>, url::ParseError> {
    let parsed = Url::parse(raw_url)?;
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = parsed.path();
    let query = |name: &str| -> Option<String> {
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    let (video_id, start) = if host.contains("youtube.com") {
        if path.starts_with("/watch") {
            (query("v"), query("t").or_else(|| query("start")))
        } else if let Some(rest) = path.strip_prefix("/embed/") {
            (first_segment(rest), query("start").or_else(|| query("t")))
        } else if let Some(rest) = path.strip_prefix("/live/") {
            (first_segment(rest), query("t").or_else(|| query("start")))
        } else {
            (None, None)
        }
    } else if host == "youtu.be" {
        (first_segment(path.trim_start_matches('/')), query("t"))
    } else {
        (None, None)
    };

    Ok(video_id.map(|video_id| VideoRef {
        video_id,
        start_seconds: parse_start_offset(start.as_deref()),
    }))
}

fn parse_permissive(raw_url: &str) -> Option<VideoRef> {
    let video_id = first_capture(&FALLBACK_ID_PATTERNS, raw_url)?;
    let start = first_capture(&FALLBACK_START_PATTERNS, raw_url);

    Some(VideoRef {
        video_id,
        start_seconds: parse_start_offset(start.as_deref()),
    })
}

fn first_capture(patterns: &[Regex], haystack: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(haystack)
            .and_then(|captures| captures.get(1))
            .map(|capture| capture.as_str().to_string())
            .filter(|value| !value.is_empty())
    })
}

fn first_segment(path: &str) -> Option<String> {
    path.split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Reads a start offset written as `90`, `90s` or `1h2m3s` (any component
/// optional). Anything else, and a zero duration, reads as 0.
pub fn parse_start_offset(value: Option<&str>) -> u64 {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return 0;
    };

    if let Some(seconds) = parse_digits(value) {
        return seconds;
    }
    if let Some(seconds) = value.strip_suffix('s').and_then(parse_digits) {
        return seconds;
    }

    let Some(captures) = COMPOUND_OFFSET.captures(value) else {
        return 0;
    };
    let component = |index: usize| -> Option<u64> {
        captures
            .get(index)
            .map_or(Some(0), |capture| capture.as_str().parse::<u64>().ok())
    };

    let total = component(1)
        .and_then(|hours| hours.checked_mul(3600))
        .zip(component(2).and_then(|minutes| minutes.checked_mul(60)))
        .and_then(|(hours, minutes)| hours.checked_add(minutes))
        .zip(component(3))
        .and_then(|(partial, seconds)| partial.checked_add(seconds));

    total.unwrap_or(0)
}

fn parse_digits(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok()
}
