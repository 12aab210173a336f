//! Content hashes for releases
//!
//! A release is identified by its BitTorrent v1 info-hash, rendered as 40
//! upper-case hex characters. Magnet links carry it in their `xt=urn:btih:`
//! topic (hex or base32); torrent files carry it implicitly as the SHA-1 of
//! their bencoded `info` dictionary.

use crate::error::{Error, Result};
use async_trait::async_trait;
use sha1::{Digest, Sha1};
use url::Url;

const BTIH_PREFIX: &str = "urn:btih:";
const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Deepest list/dictionary nesting accepted inside a torrent file
const MAX_NESTING: usize = 64;

/// Computes a content hash from raw torrent file bytes
#[async_trait]
pub trait TorrentHashReader: Send + Sync {
    /// Info-hash of the torrent, as upper-case hex
    async fn hash_from_torrent_file(&self, content: &[u8]) -> Result<String>;
}

/// [`TorrentHashReader`] computing the SHA-1 of the bencoded `info` dictionary
#[derive(Clone, Copy, Debug, Default)]
pub struct InfoHashReader;

#[async_trait]
impl TorrentHashReader for InfoHashReader {
    async fn hash_from_torrent_file(&self, content: &[u8]) -> Result<String> {
        let info = info_dictionary(content)?;
        Ok(format!("{:X}", Sha1::digest(info)))
    }
}

/// Extract the info-hash from a magnet link
///
/// Accepts both the 40-character hex and the 32-character base32 forms and
/// normalizes to upper-case hex.
///
/// # Examples
///
/// ```
/// use torrent_rss::hash::parse_magnet_hash;
///
/// let hash = parse_magnet_hash(
///     "magnet:?xt=urn:btih:755248817d32b00cc853e633ecdc48e4c21bff15&dn=Show",
/// ).unwrap();
/// assert_eq!(hash, "755248817D32B00CC853E633ECDC48E4C21BFF15");
/// ```
pub fn parse_magnet_hash(magnet: &str) -> Result<String> {
    let url = Url::parse(magnet).map_err(|e| Error::InvalidMagnet(format!("{magnet}: {e}")))?;
    if url.scheme() != "magnet" {
        return Err(Error::InvalidMagnet(format!(
            "expected magnet scheme, got {}",
            url.scheme()
        )));
    }

    let topic = url
        .query_pairs()
        .filter(|(key, _)| key == "xt")
        .find_map(|(_, value)| {
            value
                .get(..BTIH_PREFIX.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(BTIH_PREFIX))
                .map(|_| value[BTIH_PREFIX.len()..].to_string())
        })
        .ok_or_else(|| Error::InvalidMagnet(format!("no btih topic in {magnet}")))?;

    normalize_hash(&topic)
}

/// Build a magnet link for a hash, with the title as display name
pub fn magnet_from_hash(hash: &str, title: &str) -> String {
    format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        hash,
        urlencoding::encode(title)
    )
}

fn normalize_hash(topic: &str) -> Result<String> {
    match topic.len() {
        40 if topic.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(topic.to_ascii_uppercase()),
        32 => {
            let bytes = decode_base32(topic)
                .ok_or_else(|| Error::InvalidMagnet(format!("invalid base32 hash {topic}")))?;
            Ok(bytes.iter().map(|b| format!("{b:02X}")).collect())
        }
        _ => Err(Error::InvalidMagnet(format!("invalid info-hash {topic}"))),
    }
}

fn decode_base32(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for c in input.bytes() {
        let value = BASE32_ALPHABET
            .iter()
            .position(|&a| a == c.to_ascii_uppercase())? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Some(out)
}

/// Raw bytes of the top-level `info` value
fn info_dictionary(content: &[u8]) -> Result<&[u8]> {
    if content.first() != Some(&b'd') {
        return Err(Error::InvalidTorrent(
            "metainfo is not a bencoded dictionary".to_string(),
        ));
    }

    let mut pos = 1;
    while content.get(pos) != Some(&b'e') {
        let (key, value_start) = read_string(content, pos)?;
        let value_end = skip_value(content, value_start, 1)?;
        if key == b"info" {
            return Ok(&content[value_start..value_end]);
        }
        pos = value_end;
    }

    Err(Error::InvalidTorrent("metainfo has no info dictionary".to_string()))
}

fn truncated() -> Error {
    Error::InvalidTorrent("truncated bencode".to_string())
}

/// Parse `<len>:<bytes>` at `pos`, returning the bytes and the position after them
fn read_string(content: &[u8], pos: usize) -> Result<(&[u8], usize)> {
    let colon = content[pos..]
        .iter()
        .position(|&b| b == b':')
        .map(|offset| pos + offset)
        .ok_or_else(truncated)?;
    let len: usize = std::str::from_utf8(&content[pos..colon])
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| Error::InvalidTorrent(format!("invalid string length at byte {pos}")))?;
    let start = colon + 1;
    let end = start.checked_add(len).filter(|&end| end <= content.len()).ok_or_else(truncated)?;
    Ok((&content[start..end], end))
}

/// Position just past the bencoded value starting at `pos`, nested `depth` containers deep
fn skip_value(content: &[u8], pos: usize, depth: usize) -> Result<usize> {
    if depth > MAX_NESTING && matches!(content.get(pos), Some(b'l' | b'd')) {
        return Err(Error::InvalidTorrent(format!(
            "bencode nested deeper than {MAX_NESTING} at byte {pos}"
        )));
    }

    match content.get(pos) {
        Some(b'i') => content[pos..]
            .iter()
            .position(|&b| b == b'e')
            .map(|offset| pos + offset + 1)
            .ok_or_else(truncated),
        Some(b'l') => {
            let mut pos = pos + 1;
            while content.get(pos).ok_or_else(truncated)? != &b'e' {
                pos = skip_value(content, pos, depth + 1)?;
            }
            Ok(pos + 1)
        }
        Some(b'd') => {
            let mut pos = pos + 1;
            while content.get(pos).ok_or_else(truncated)? != &b'e' {
                let (_, value_start) = read_string(content, pos)?;
                pos = skip_value(content, value_start, depth + 1)?;
            }
            Ok(pos + 1)
        }
        Some(b'0'..=b'9') => read_string(content, pos).map(|(_, end)| end),
        Some(other) => Err(Error::InvalidTorrent(format!(
            "unexpected byte {other:#04x} at {pos}"
        ))),
        None => Err(truncated()),
    }
}
