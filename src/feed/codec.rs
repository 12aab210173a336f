//! RSS 2.0 encoding of the release feed
//!
//! Each record becomes one `<item>`:
//!
//! ```xml
//! <item>
//!   <title>Show.S01E01.720p</title>
//!   <link>magnet:?xt=urn:btih:...</link>
//!   <guid isPermaLink="false">755248817D32B00CC853E633ECDC48E4C21BFF15</guid>
//!   <pubDate>Wed, 4 Sep 2024 10:15:30 +0000</pubDate>
//!   <description>Pilot</description>
//!   <enclosure url="magnet:?xt=urn:btih:..." length="0" type="application/x-bittorrent"/>
//! </item>
//! ```

use crate::config::FeedMetadata;
use crate::error::FeedError;
use crate::feed::Feed;
use crate::types::ReleaseRecord;
use chrono::{DateTime, FixedOffset, TimeZone};
use rss::{Channel, Enclosure, Guid, Item};
use std::collections::HashSet;

/// Content type of every enclosure; consumers treat the URL as a torrent reference
pub const ENCLOSURE_MIME_TYPE: &str = "application/x-bittorrent";

const PUB_DATE_FORMAT: &str = "%a, %-d %b %Y %H:%M:%S %z";

/// Outcome of decoding a feed file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// The document held a channel
    Feed(Feed),
    /// The input was empty; the caller supplies headers for a fresh feed
    Empty,
}

/// Format a publication date, e.g. `Wed, 4 Sep 2024 10:15:30 +0000`
pub fn format_pub_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    date.format(PUB_DATE_FORMAT).to_string()
}

/// Text as a reader recovers it from a feed document
///
/// Characters XML 1.0 cannot carry are dropped, line endings become `\n` and
/// surrounding whitespace is trimmed. Records built from this text decode back
/// unchanged.
pub fn feed_text(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| is_xml_char(c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Decode a feed document
///
/// Blank input yields [`Decoded::Empty`]. Anything else must be a well-formed
/// channel whose items each carry a link, a guid and a parseable pubDate, with
/// no guid repeated.
pub fn decode(bytes: &[u8]) -> Result<Decoded, FeedError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Decoded::Empty);
    }

    let channel = Channel::read_from(bytes).map_err(|e| FeedError::Malformed(e.to_string()))?;

    let metadata = FeedMetadata {
        title: channel.title().to_string(),
        link: channel.link().to_string(),
        description: channel.description().to_string(),
    };

    let mut feed = Feed::empty(metadata);
    let mut seen = HashSet::new();
    for (index, item) in channel.items().iter().enumerate() {
        let record = decode_item(index, item)?;
        if !seen.insert(record.content_hash.to_ascii_uppercase()) {
            return Err(FeedError::DuplicateHash {
                index,
                hash: record.content_hash,
            });
        }
        feed.push_newest(record);
    }

    Ok(Decoded::Feed(feed))
}

fn decode_item(index: usize, item: &Item) -> Result<ReleaseRecord, FeedError> {
    let missing = |field| FeedError::MissingField { index, field };

    let magnet_uri = item.link().ok_or_else(|| missing("link"))?.to_string();
    let content_hash = item
        .guid()
        .map(Guid::value)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing("guid"))?
        .to_string();
    let raw_date = item.pub_date().ok_or_else(|| missing("pubDate"))?;
    let published_at = parse_pub_date(raw_date).ok_or_else(|| FeedError::InvalidDate {
        index,
        value: raw_date.to_string(),
    })?;

    Ok(ReleaseRecord {
        title: item.title().unwrap_or_default().to_string(),
        content_hash,
        magnet_uri,
        published_at,
        description: item
            .description()
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    })
}

fn parse_pub_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(value.trim())
        .or_else(|_| DateTime::parse_from_str(value.trim(), PUB_DATE_FORMAT))
        .ok()
}

/// Encode a feed as an RSS 2.0 document
///
/// Text goes through [`feed_text`], so the output is well-formed XML whatever
/// the records hold.
pub fn encode(feed: &Feed) -> Result<Vec<u8>, FeedError> {
    let metadata = feed.metadata();
    let mut channel = Channel::default();
    channel.set_title(feed_text(&metadata.title));
    channel.set_link(feed_text(&metadata.link));
    channel.set_description(feed_text(&metadata.description));
    channel.set_items(feed.records().map(encode_item).collect::<Vec<_>>());

    channel
        .write_to(Vec::new())
        .map_err(|e| FeedError::Serialize(e.to_string()))
}

fn encode_item(record: &ReleaseRecord) -> Item {
    let mut guid = Guid::default();
    guid.set_value(record.content_hash.clone());
    guid.set_permalink(false);

    let magnet_uri = feed_text(&record.magnet_uri);

    let mut enclosure = Enclosure::default();
    enclosure.set_url(magnet_uri.clone());
    enclosure.set_length("0".to_string());
    enclosure.set_mime_type(ENCLOSURE_MIME_TYPE.to_string());

    let mut item = Item::default();
    item.set_title(feed_text(&record.title));
    item.set_link(magnet_uri);
    item.set_guid(guid);
    item.set_pub_date(format_pub_date(&record.published_at));
    item.set_description(
        record
            .description
            .as_deref()
            .map(feed_text)
            .filter(|d| !d.is_empty()),
    );
    item.set_enclosure(enclosure);
    item
}
