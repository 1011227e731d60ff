//! Page arithmetic and link windows.
//!
//! The calculator is pure: the caller supplies the total row count, the page
//! size and a [`PageContext`] describing the current request (path plus query
//! parameters). Page links are that path with the page parameter rewritten.

use crate::config::DEFAULT_LINK_RADIUS;
use crate::error::{QueryError, QueryResult};
use crate::row::Row;
use serde::Serialize;
use url::form_urlencoded;

/// The request a page is rendered for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl PageContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Parse `path?key=value&...`.
    pub fn parse(uri: &str) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        Self {
            path: path.to_string(),
            query: form_urlencoded::parse(query.as_bytes()).into_owned().collect(),
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// The page requested through `page_name`; absent, non-numeric or zero means 1.
    pub fn current_page(&self, page_name: &str) -> u64 {
        self.query
            .iter()
            .find(|(key, _)| key == page_name)
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    /// This context's path with `page_name` set to `page`, other parameters kept in order.
    pub fn page_url(&self, page_name: &str, page: u64) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut replaced = false;
        for (key, value) in &self.query {
            if key == page_name {
                if !replaced {
                    query.append_pair(key, &page.to_string());
                    replaced = true;
                }
            } else {
                query.append_pair(key, value);
            }
        }
        if !replaced {
            query.append_pair(page_name, &page.to_string());
        }
        format!("{}?{}", self.path, query.finish())
    }
}

/// One navigable page in a [`Page`]'s link window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page_number: u64,
    pub link: String,
    pub is_current: bool,
}

/// A page of rows with its position and navigation links.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub current_page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_rows: u64,
    /// 1-based index of the first row on this page (0 when the page is empty).
    pub from: u64,
    /// 1-based index of the last row on this page (0 when the page is empty).
    pub to: u64,
    pub has_more: bool,
    pub first_page_url: String,
    pub prev_page_url: Option<String>,
    pub next_page_url: Option<String>,
    pub last_page_url: String,
    pub link_window: Vec<PageLink>,
    pub data: Vec<Row>,
}

/// Page arithmetic for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total_rows: u64,
    per_page: u64,
    current_page: u64,
    radius: u64,
}

impl Paginator {
    /// Fails with a usage error when `per_page` is zero. A `current_page`
    /// of zero is treated as 1; pages past the end are kept as requested.
    pub fn new(total_rows: u64, per_page: u64, current_page: u64) -> QueryResult<Self> {
        if per_page == 0 {
            return Err(QueryError::usage("per_page must be at least 1"));
        }
        Ok(Self {
            total_rows,
            per_page,
            current_page: current_page.max(1),
            radius: DEFAULT_LINK_RADIUS,
        })
    }

    /// Number of links shown on each side of the current page.
    pub fn radius(mut self, radius: u64) -> Self {
        self.radius = radius;
        self
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn total_pages(&self) -> u64 {
        self.total_rows.div_ceil(self.per_page)
    }

    /// Rows to skip before the current page.
    pub fn offset(&self) -> u64 {
        (self.current_page - 1).saturating_mul(self.per_page)
    }

    /// Page numbers in the link window: up to `radius` positive pages before
    /// the current one, the current page, then up to `radius` pages after it
    /// that exist.
    pub fn window(&self) -> Vec<u64> {
        let start = self.current_page.saturating_sub(self.radius).max(1);
        let end = self
            .current_page
            .saturating_add(self.radius)
            .min(self.total_pages());
        let mut pages: Vec<u64> = (start..self.current_page).collect();
        pages.push(self.current_page);
        pages.extend(self.current_page + 1..=end);
        pages
    }

    /// Assemble the descriptor for `data`, the rows fetched at [`offset`](Self::offset).
    pub fn page(&self, ctx: &PageContext, page_name: &str, data: Vec<Row>) -> Page {
        let total_pages = self.total_pages();
        let last_page = total_pages.max(1);
        let fetched = data.len() as u64;
        let (from, to) = if fetched == 0 {
            (0, 0)
        } else {
            (self.offset() + 1, self.offset() + fetched)
        };
        let has_more = self.current_page < total_pages;

        let link_window = self
            .window()
            .into_iter()
            .map(|page_number| PageLink {
                page_number,
                link: ctx.page_url(page_name, page_number),
                is_current: page_number == self.current_page,
            })
            .collect();

        Page {
            current_page: self.current_page,
            per_page: self.per_page,
            total_pages,
            total_rows: self.total_rows,
            from,
            to,
            has_more,
            first_page_url: ctx.page_url(page_name, 1),
            prev_page_url: (self.current_page > 1).then(|| ctx.page_url(page_name, self.current_page - 1)),
            next_page_url: has_more.then(|| ctx.page_url(page_name, self.current_page + 1)),
            last_page_url: ctx.page_url(page_name, last_page),
            link_window,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| Row::positional(vec![json!(i)])).collect()
    }

    #[test]
    fn current_page_from_context() {
        let ctx = PageContext::parse("/posts?page=3&sort=asc");
        assert_eq!(ctx.path, "/posts");
        assert_eq!(ctx.current_page("page"), 3);
        assert_eq!(PageContext::parse("/posts?page=abc").current_page("page"), 1);
        assert_eq!(PageContext::parse("/posts?page=0").current_page("page"), 1);
        assert_eq!(PageContext::new("/posts").current_page("page"), 1);
    }

    #[test]
    fn page_url_rewrites_only_the_page_parameter() {
        let ctx = PageContext::parse("/posts?sort=asc&page=3&q=a+b");
        assert_eq!(ctx.page_url("page", 4), "/posts?sort=asc&page=4&q=a+b");
        assert_eq!(PageContext::new("/posts").page_url("p", 2), "/posts?p=2");
    }

    #[test]
    fn totals_and_offset() {
        let p = Paginator::new(11, 5, 3).unwrap();
        assert_eq!(p.total_pages(), 3);
        assert_eq!(p.offset(), 10);
        assert_eq!(Paginator::new(10, 5, 1).unwrap().total_pages(), 2);
        assert_eq!(Paginator::new(0, 5, 1).unwrap().total_pages(), 0);
    }

    #[test]
    fn zero_per_page_is_rejected() {
        assert!(Paginator::new(10, 0, 1).unwrap_err().is_usage());
    }

    #[test]
    fn window_stays_within_pages() {
        let p = Paginator::new(100, 5, 3).unwrap();
        assert_eq!(p.window(), vec![1, 2, 3, 4, 5, 6, 7, 8]);

        let p = Paginator::new(100, 5, 20).unwrap();
        assert_eq!(p.window(), vec![15, 16, 17, 18, 19, 20]);

        let p = Paginator::new(100, 5, 10).unwrap().radius(2);
        assert_eq!(p.window(), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn page_past_the_end_keeps_its_offset() {
        let p = Paginator::new(10, 5, 4).unwrap();
        assert_eq!(p.current_page(), 4);
        assert_eq!(p.offset(), 15);

        let page = p.page(&PageContext::new("/u"), "page", Vec::new());
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_more);
        assert_eq!(page.from, 0);
        assert_eq!(page.next_page_url, None);
        assert_eq!(page.prev_page_url.as_deref(), Some("/u?page=3"));
    }

    #[test]
    fn descriptor_links() {
        let ctx = PageContext::parse("/users?page=2");
        let p = Paginator::new(12, 5, 2).unwrap();
        let page = p.page(&ctx, "page", rows(5));

        assert_eq!(page.per_page, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!((page.from, page.to), (6, 10));
        assert!(page.has_more);
        assert_eq!(page.first_page_url, "/users?page=1");
        assert_eq!(page.prev_page_url.as_deref(), Some("/users?page=1"));
        assert_eq!(page.next_page_url.as_deref(), Some("/users?page=3"));
        assert_eq!(page.last_page_url, "/users?page=3");

        let current: Vec<u64> = page
            .link_window
            .iter()
            .filter(|l| l.is_current)
            .map(|l| l.page_number)
            .collect();
        assert_eq!(current, vec![2]);
        assert_eq!(page.link_window.len(), 3);
    }

    #[test]
    fn empty_result_still_describes_the_page() {
        let page = Paginator::new(0, 10, 1)
            .unwrap()
            .page(&PageContext::new("/x"), "page", Vec::new());
        assert_eq!(page.total_pages, 0);
        assert!(page.data.is_empty());
        assert_eq!(page.last_page_url, "/x?page=1");
        assert_eq!(page.link_window.len(), 1);
    }

    #[test]
    fn serializes() {
        let page = Paginator::new(1, 1, 1)
            .unwrap()
            .page(&PageContext::new("/x"), "page", rows(1));
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["current_page"], 1);
        assert_eq!(json["link_window"][0]["is_current"], true);
        assert_eq!(json["data"][0], json!([0]));
    }
}
