// src/browser/policy.rs
//! Which requests a rendered fetch lets through

const TRACKER_MARKERS: &[&str] = &[
    "google-analytics",
    "doubleclick",
    "googletagmanager",
    "facebook",
    "segment.io",
];

/// Decide whether to abort a request. `resource_type` is the DevTools
/// resource type name ("Image", "Font", ...).
pub fn should_block(resource_type: &str, url: &str, allow_visual_assets: bool) -> bool {
    is_heavy_asset(resource_type, allow_visual_assets) || is_tracker(url)
}

fn is_heavy_asset(resource_type: &str, allow_visual_assets: bool) -> bool {
    match resource_type.to_ascii_lowercase().as_str() {
        "media" | "font" => true,
        "image" | "stylesheet" => !allow_visual_assets,
        _ => false,
    }
}

fn is_tracker(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    TRACKER_MARKERS.iter().any(|marker| host.contains(marker))
        || host
            .split('.')
            .any(|label| label == "ads" || label.starts_with("ads-") || label.starts_with("adservice"))
}
