use std::path::Path;

/// Companion files that describe a media file rather than contain one.
const SIDECAR_EXTENSIONS: &[&str] = &["xmp", "aae", "json", "thm", "pp3", "dop"];

/// Camera containers mime_guess has no image/video type for.
const EXTRA_MEDIA_EXTENSIONS: &[&str] = &[
    "mts", "m2ts", "raf", "cr2", "cr3", "nef", "arw", "orf", "rw2", "pef", "srw", "dng", "heic",
    "heif", "avif", "insv",
];

/// Formats kamadak-exif can open: JPEG, TIFF (and TIFF-based RAW), HEIF, PNG, WebP.
const EXIF_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "tif", "tiff", "dng", "nef", "arw", "cr2", "orf", "rw2", "pef", "srw",
    "heic", "heif", "avif", "png", "webp",
];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_sidecar(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SIDECAR_EXTENSIONS.contains(&ext.as_str()))
}

/// Image or video file that gets a fingerprint in its destination name.
pub fn is_media(path: &Path) -> bool {
    if is_sidecar(path) {
        return false;
    }
    let Some(ext) = extension(path) else {
        return false;
    };
    if EXTRA_MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    mime_guess::from_ext(&ext).iter().any(|mime| {
        mime.type_() == mime_guess::mime::IMAGE || mime.type_() == mime_guess::mime::VIDEO
    })
}

pub fn is_exif_capable(path: &Path) -> bool {
    extension(path).is_some_and(|ext| EXIF_EXTENSIONS.contains(&ext.as_str()))
}
