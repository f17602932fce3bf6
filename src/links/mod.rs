mod match_link;
mod video_link;

pub use match_link::{invalid_match_url_message, parse_match_id, DEFAULT_MATCH_HOST};
pub use video_link::{embed_url, parse_start_offset, parse_video_ref, watch_url, VideoRef};

pub const INVALID_VIDEO_URL_MESSAGE: &str = "Invalid YouTube URL";
