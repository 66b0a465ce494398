use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{info, warn};

pub const TWEET_INTENT_URL: &str = "https://twitter.com/intent/tweet";

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Posting-intent URL with `content` as the prefilled text.
pub fn intent_url(content: &str) -> String {
    format!(
        "{}?text={}",
        TWEET_INTENT_URL,
        utf8_percent_encode(content, COMPONENT)
    )
}

/// Open the posting intent in the system browser. Failures are only logged.
pub fn share(content: &str) -> String {
    let url = intent_url(content);
    match webbrowser::open(&url) {
        Ok(()) => info!("opened share intent"),
        Err(err) => warn!(?err, %url, "failed to open browser for share"),
    }
    url
}
