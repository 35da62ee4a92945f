use sha2::{Digest, Sha256};
use url::Url;

/// Fallback product code when nothing usable remains after standardization
pub const UNKNOWN_PRODUCT: &str = "unknown_product";

/// Removes a trailing `_<digits>` site id
fn strip_trailing_id(segment: &str) -> &str {
    match segment.rsplit_once('_') {
        Some((head, id)) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => head,
        _ => segment,
    }
}

/// Returns the last non-empty path segment of a URL, percent-decoded
fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| {
            url::form_urlencoded::parse(format!("s={}", segment).as_bytes())
                .next()
                .map(|(_, value)| value.into_owned())
                .unwrap_or_else(|| segment.to_string())
        })
}

/// Derives a category folder name from its URL
///
/// Uses the last path segment with any trailing `_<digits>` site id
/// removed, e.g. `/danh-muc/cam-bien-quang_1234` becomes `cam-bien-quang`.
/// Falls back to the host when the path is empty.
pub fn category_name_from_url(url_str: &str) -> String {
    let Ok(url) = Url::parse(url_str) else {
        return sanitize_component(url_str);
    };

    let name = last_segment(&url)
        .map(|segment| strip_trailing_id(&segment).to_string())
        .filter(|segment| !segment.is_empty())
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "category".to_string());

    sanitize_component(&name)
}

/// Derives a product code from a product URL when the page carries none
///
/// The last path segment loses its file extension and trailing site id,
/// then goes through [`standardize_code`].
pub fn code_from_url(url_str: &str) -> String {
    let segment = Url::parse(url_str)
        .ok()
        .and_then(|url| last_segment(&url))
        .unwrap_or_default();

    let stem = match segment.rsplit_once('.') {
        Some((stem, ext)) if ext.chars().all(|c| c.is_ascii_alphabetic()) && !stem.is_empty() => {
            stem.to_string()
        }
        _ => segment,
    };

    standardize_code(strip_trailing_id(&stem))
}

/// Normalizes a product code for use as an image file name
///
/// Uppercases, replaces runs of characters outside `A-Z 0-9 . _ -` with a
/// dash, collapses repeated dashes and trims leading/trailing separators.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::standardize_code;
///
/// assert_eq!(standardize_code(" e3z-d61 / 2m "), "E3Z-D61-2M");
/// assert_eq!(standardize_code("///"), "unknown_product");
/// ```
pub fn standardize_code(code: &str) -> String {
    let mut collapsed = String::with_capacity(code.len());
    for c in code.trim().to_uppercase().chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    let trimmed = collapsed.trim_matches(|c| c == '-' || c == '.' || c == '_');

    if trimmed.is_empty() {
        UNKNOWN_PRODUCT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Makes an arbitrary label safe as a single path component
///
/// Path separators, characters reserved on common filesystems and control
/// characters become `_`; surrounding whitespace and dots are trimmed.
/// When anything had to change, `~` and the first eight hex digits of the
/// label's SHA-256 are appended, so `A/B` and `A_B` never share a file.
/// Safe labels pass through untouched and the result is stable across runs.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.').trim();
    let base = if trimmed.is_empty() { "_" } else { trimmed };

    if base == name {
        base.to_string()
    } else {
        let digest = Sha256::digest(name.as_bytes());
        format!("{}~{}", base, hex::encode(&digest[..4]))
    }
}
