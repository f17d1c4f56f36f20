//! Header-driven pagination.
//!
//! GitLab reports paging state in `X-Page`-style response headers (1-based)
//! and RFC 5988 `Link` headers. Both are folded into an opaque [`Cursor`]:
//! the headers become zero-based metadata, the links become the cursor's
//! navigation payload.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use verso_client::ApiResponse;
use verso_core::{Cursor, PageInfo};

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]*)>\s*;\s*rel="([^"]*)""#).unwrap());

/// Parses an RFC 5988 `Link` header into a rel-to-URL map.
pub(crate) fn parse_links(header: &str) -> BTreeMap<String, String> {
    LINK_RE
        .captures_iter(header)
        .map(|captures| (captures[2].to_owned(), captures[1].to_owned()))
        .collect()
}

fn header_number(response: &ApiResponse, name: &str) -> Option<u64> {
    response.header(name)?.trim().parse().ok()
}

/// Extracts the normalized page position from the paging headers.
///
/// All four headers must be present and numeric; GitLab omits them on
/// responses that are not paginated listings.
pub(crate) fn page_info(response: &ApiResponse) -> Option<PageInfo> {
    Some(PageInfo::from_one_based(
        header_number(response, "x-page")?,
        header_number(response, "x-total-pages")?,
        header_number(response, "x-per-page")?,
        header_number(response, "x-total")?,
    ))
}

/// Builds a cursor from a listing response, or `None` when the response
/// carries no paging headers.
pub(crate) fn cursor_from_response(response: &ApiResponse) -> Option<Cursor> {
    let info = page_info(response)?;
    let links = response.header("link").map(parse_links).unwrap_or_default();
    Some(Cursor::from_page_info(&info, &links))
}

#[cfg(test)]
mod tests {
    use verso_core::CursorAction;

    use super::*;

    fn listing_response(page: u64, total_pages: u64) -> ApiResponse {
        ApiResponse::new(
            200,
            [
                ("X-Page", page.to_string()),
                ("X-Total-Pages", total_pages.to_string()),
                ("X-Per-Page", "20".to_string()),
                ("X-Total", "45".to_string()),
                (
                    "Link",
                    "<https://gitlab.test/tree?page=2>; rel=\"next\", \
                     <https://gitlab.test/tree?page=3>; rel=\"last\""
                        .to_string(),
                ),
            ],
            "[]",
        )
    }

    #[test]
    fn test_parse_links() {
        let links = parse_links(
            "<https://a.test/x?page=2>; rel=\"next\",<https://a.test/x?page=9>;rel=\"last\"",
        );
        assert_eq!(links["next"], "https://a.test/x?page=2");
        assert_eq!(links["last"], "https://a.test/x?page=9");
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_cursor_carries_zero_based_position() {
        let cursor = cursor_from_response(&listing_response(1, 3)).unwrap();
        let meta = cursor.meta.as_ref().unwrap();
        assert_eq!(meta.index, Some(0));
        assert_eq!(meta.page_count, Some(2));
        assert_eq!(meta.page_size, Some(20));
        assert_eq!(meta.count, Some(45));
    }

    #[test]
    fn test_first_page_offers_forward_actions_only() {
        let cursor = cursor_from_response(&listing_response(1, 3)).unwrap();
        assert!(cursor.has_action(CursorAction::Next));
        assert!(cursor.has_action(CursorAction::Last));
        assert!(!cursor.has_action(CursorAction::Prev));
        assert!(!cursor.has_action(CursorAction::First));
    }

    #[test]
    fn test_last_page_offers_backward_actions_only() {
        let cursor = cursor_from_response(&listing_response(3, 3)).unwrap();
        assert!(cursor.has_action(CursorAction::Prev));
        assert!(cursor.has_action(CursorAction::First));
        assert!(!cursor.has_action(CursorAction::Next));
    }

    #[test]
    fn test_links_survive_in_cursor_data() {
        let cursor = cursor_from_response(&listing_response(1, 3)).unwrap();
        assert_eq!(
            cursor.link(CursorAction::Next).unwrap(),
            "https://gitlab.test/tree?page=2"
        );
    }

    #[test]
    fn test_missing_headers_yield_no_cursor() {
        let response = ApiResponse::new(200, [("content-type", "application/json")], "[]");
        assert!(cursor_from_response(&response).is_none());
    }
}
