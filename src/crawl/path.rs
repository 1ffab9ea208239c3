// src/crawl/path.rs
// Maps a crawled URL to the file it is saved as.
//
//   /            -> <root>/index.html
//   /docs/       -> <root>/docs/index.html
//   /a/b         -> <root>/a/b.html      (no dot: assume it is a page)
//   /img/x.png   -> <root>/img/x.png
//   /s.css?v=2   -> <root>/s.css?v=2     (query kept so variants don't collide)
//   /caf%C3%A9   -> <root>/café.html     (path segments are percent-decoded)
//
// A segment that would decode into a separator, a dot segment or invalid
// UTF-8 is kept in its encoded form.

use super::normalize::NormalizedUrl;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

pub const INDEX_FILE: &str = "index.html";

// Pure mapping, no filesystem access
pub fn local_path(root: &Path, url: &NormalizedUrl) -> PathBuf {
    let path = url.path();

    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect();

    if path.is_empty() || path.ends_with('/') {
        segments.push(INDEX_FILE.to_string());
    } else if let Some(file_name) = segments.last_mut() {
        // No dot: assume it is a page
        if !file_name.contains('.') {
            file_name.push_str(".html");
        }
    }

    // The query belongs to the file name; a '/' inside it must not open a directory
    if let (Some(query), Some(file_name)) = (url.query().filter(|q| !q.is_empty()), segments.last_mut()) {
        file_name.push('?');
        file_name.push_str(&query.replace('/', "%2F"));
    }

    // Join segment by segment so the leading '/' doesn't replace `root`
    let mut full = root.to_path_buf();
    full.extend(segments);
    full
}

fn decode_segment(segment: &str) -> String {
    match percent_decode_str(segment).decode_utf8() {
        Ok(decoded) if is_plain_file_name(&decoded) => decoded.into_owned(),
        _ => segment.to_string(),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.contains(&['/', '\\', '\0'][..]) && name != "." && name != ".."
}

/// Maps `url` under `root` and creates any missing parent directories.
pub async fn map_to_path(root: &Path, url: &NormalizedUrl) -> std::io::Result<PathBuf> {
    let path = local_path(root, url);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::normalize::{Resolution, UrlNormalizer};
    use url::Url;

    fn url(s: &str) -> NormalizedUrl {
        let parsed = Url::parse(s).unwrap();
        match UrlNormalizer::new(&parsed).normalize(&parsed, s).unwrap() {
            Resolution::InScope(url) => url,
            Resolution::OutOfScope => panic!("not in scope: {}", s),
        }
    }

    #[test]
    fn test_root_maps_to_index() {
        let root = Path::new("/mirror/example.test");
        assert_eq!(
            local_path(root, &url("http://example.test/")),
            root.join("index.html")
        );
        assert_eq!(
            local_path(root, &url("http://example.test")),
            root.join("index.html")
        );
    }

    #[test]
    fn test_directory_maps_to_nested_index() {
        let root = Path::new("site");
        assert_eq!(
            local_path(root, &url("http://example.test/docs/")),
            root.join("docs").join("index.html")
        );
    }

    #[test]
    fn test_extensionless_gets_html_suffix() {
        let root = Path::new("site");
        assert_eq!(
            local_path(root, &url("http://example.test/a/b")),
            root.join("a").join("b.html")
        );
    }

    #[test]
    fn test_asset_kept_unchanged() {
        let root = Path::new("site");
        assert_eq!(
            local_path(root, &url("http://example.test/img/x.png")),
            root.join("img").join("x.png")
        );
    }

    #[test]
    fn test_query_is_appended() {
        let root = Path::new("site");
        let plain = local_path(root, &url("http://example.test/style.css"));
        let versioned = local_path(root, &url("http://example.test/style.css?v=2"));

        assert_eq!(versioned, root.join("style.css?v=2"));
        assert_ne!(plain, versioned);
        assert_eq!(
            local_path(root, &url("http://example.test/search?q=rust")),
            root.join("search.html?q=rust")
        );
        assert_eq!(
            local_path(root, &url("http://example.test/go?to=/a/b")),
            root.join("go.html?to=%2Fa%2Fb")
        );
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        let root = Path::new("site");
        assert_eq!(
            local_path(root, &url("http://example.test/caf%C3%A9")),
            root.join("café.html")
        );
        assert_eq!(
            local_path(root, &url("http://example.test/my%20docs/report.pdf")),
            root.join("my docs").join("report.pdf")
        );
    }

    #[test]
    fn test_unsafe_segments_stay_encoded() {
        let root = Path::new("site");
        assert_eq!(
            local_path(root, &url("http://example.test/a%2Fb")),
            root.join("a%2Fb.html")
        );
        assert_eq!(
            local_path(root, &url("http://example.test/bad%FF/x.png")),
            root.join("bad%FF").join("x.png")
        );
    }

    #[tokio::test]
    async fn test_map_to_path_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = map_to_path(dir.path(), &url("http://example.test/a/b/c.css"))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("a").join("b").join("c.css"));
        assert!(dir.path().join("a").join("b").is_dir());
    }
}
