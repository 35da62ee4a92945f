use crate::UrlError;
use url::Url;

/// Builds the URL of a given listing page
///
/// Page 1 (and 0) is the category URL itself. For later pages the page
/// parameter is merged into the existing query string: an existing value is
/// replaced and every other parameter is kept in order.
///
/// # Arguments
///
/// * `base_url` - The category URL
/// * `page` - The 1-based page number
/// * `param` - Name of the page query parameter
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::make_page_url;
///
/// let url = make_page_url("https://shop.example.com/category/a?sort=asc", 3, "page").unwrap();
/// assert_eq!(url, "https://shop.example.com/category/a?sort=asc&page=3");
/// ```
pub fn make_page_url(base_url: &str, page: u32, param: &str) -> Result<String, UrlError> {
    if page <= 1 {
        return Ok(base_url.to_string());
    }

    let mut url = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, &page.to_string());

    Ok(url.to_string())
}
