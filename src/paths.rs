//! Archive path arithmetic. Entry names are `/`-separated and relative to the
//! archive root, so `std::path` is not used here.

/// Directory portion of an archive path including the trailing `/`, or an
/// empty string for entries at the archive root.
pub fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..=pos].to_string(),
        None => String::new(),
    }
}

/// Split `href` into the path and the optional fragment after `#`.
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor)),
        None => (href, None),
    }
}

pub fn strip_fragment(href: &str) -> &str {
    split_fragment(href).0
}

/// Resolve `href` against `base_dir`, collapsing `.` and `..` segments.
/// A fragment on `href` is preserved.
pub fn resolve(base_dir: &str, href: &str) -> String {
    let (path, fragment) = split_fragment(href);
    let joined = if path.starts_with('/') {
        path.trim_start_matches('/').to_string()
    } else {
        format!("{base_dir}{path}")
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut resolved = segments.join("/");
    if let Some(fragment) = fragment {
        resolved.push('#');
        resolved.push_str(fragment);
    }
    resolved
}
