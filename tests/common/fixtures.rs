//! Releases, magnet links and torrent files for tests

use torrent_rss::{FeedClientConfig, Release, TorrentPayload};

/// Magnet template from a real indexer; `{0}` is replaced by the info-hash
pub const MAGNET_TEMPLATE: &str = "magnet:?xt=urn:btih:{0}&dn=Series.S05E10.PROPER.HDTV.x264-DEFiNE%5Brartv%5D&tr=http%3A%2F%2Ftracker.trackerfix.com%3A80%2Fannounce&tr=udp%3A%2F%2F9.rarbg.me%3A2710&tr=udp%3A%2F%2F9.rarbg.to%3A2710";

/// Title of the release used for single-release scenarios
pub const TITLE: &str = "Droned.S01E01.Pilot.1080p.WEB-DL-DRONE";

/// Deterministic 40-character lower-case hex hash for `n`
pub fn hash_for(n: usize) -> String {
    format!("{:040x}", n.wrapping_mul(0x9E37_79B9) + 1)
}

/// Magnet link for `hash` built from [`MAGNET_TEMPLATE`]
pub fn magnet_for(hash: &str) -> String {
    MAGNET_TEMPLATE.replace("{0}", hash)
}

/// Magnet release titled `title` with hash `hash_for(n)`
pub fn magnet_release(n: usize, title: &str) -> Release {
    Release {
        title: title.to_string(),
        description: Some(format!("Overview of {title}")),
        payload: TorrentPayload::magnet(magnet_for(&hash_for(n))),
    }
}

/// Bencoded single-file torrent whose info dictionary names `name`
pub fn torrent_file(name: &str) -> Vec<u8> {
    let info = format!(
        "d6:lengthi1048576e4:name{}:{}12:piece lengthi262144e6:pieces0:e",
        name.len(),
        name
    );
    format!("d8:announce23:http://tracker/announce4:info{info}e").into_bytes()
}

/// Torrent-file release for `name`
pub fn torrent_release(name: &str) -> Release {
    Release {
        title: name.to_string(),
        description: None,
        payload: TorrentPayload::torrent_file(format!("{name}.torrent"), torrent_file(name)),
    }
}

/// Config for a feed in `feed_dir` holding at most `max_items`
pub fn config_in(feed_dir: &std::path::Path, max_items: usize) -> FeedClientConfig {
    let mut config = FeedClientConfig::new(feed_dir);
    config.name = "rss".to_string();
    config.max_items = max_items;
    config
}
