//! Cursor pagination
//!
//! A [`Page`] is one slice of a list endpoint. A [`Paginator`] wraps a page
//! fetch function and exposes the pages (or the flattened items) as a lazy
//! [`Stream`]. Cursors are opaque strings: they are only ever handed back to
//! the fetch function, so a caller can stop, keep a cursor, and resume later
//! with [`Paginator::starting_at`].

use futures::future::BoxFuture;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::future::Future;

use crate::error::Result;

/// One page of results
///
/// `has_more()` is true exactly when a next cursor is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Create a page; more results follow iff `next_cursor` is given
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// Create a page from wire fields that may disagree with each other
    ///
    /// A cursor is kept only when `has_more` is set, and `has_more` without a
    /// cursor is treated as the last page since nothing more can be fetched.
    pub fn from_parts(items: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self::new(items, next_cursor.filter(|_| has_more))
    }

    /// A page with no items and nothing after it
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// Items on this page
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Take the items
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Cursor for the following page
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// Whether another page can be fetched
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Convert the items, keeping the cursor
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'p, T> IntoIterator for &'p Page<T> {
    type Item = &'p T;
    type IntoIter = std::slice::Iter<'p, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

type FetchFn<'a, T> = Box<dyn Fn(Option<String>) -> BoxFuture<'a, Result<Page<T>>> + Send + Sync + 'a>;

/// Lazy walk over a cursor-paginated endpoint
///
/// Nothing is fetched until the returned stream is polled. The stream ends
/// after the first page without a next cursor, or right after yielding the
/// first error; a failed page is not retried here.
///
/// # Examples
/// ```
/// use futures::TryStreamExt;
/// use imagine_client::pagination::{Page, Paginator};
///
/// # futures::executor::block_on(async {
/// let paginator = Paginator::new(|cursor: Option<String>| async move {
///     Ok(match cursor.as_deref() {
///         None => Page::new(vec![1, 2], Some("c1".to_string())),
///         Some(_) => Page::new(vec![3], None),
///     })
/// });
///
/// let items: Vec<i32> = paginator.items().try_collect().await.unwrap();
/// assert_eq!(items, vec![1, 2, 3]);
/// # });
/// ```
pub struct Paginator<'a, T> {
    fetch: FetchFn<'a, T>,
    cursor: Option<String>,
}

impl<'a, T: Send + 'a> Paginator<'a, T> {
    /// Walk from the first page
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'a,
        Fut: Future<Output = Result<Page<T>>> + Send + 'a,
    {
        Self {
            fetch: Box::new(move |cursor| Box::pin(fetch(cursor))),
            cursor: None,
        }
    }

    /// Resume from a cursor returned by an earlier page
    pub fn starting_at<F, Fut>(fetch: F, cursor: impl Into<String>) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'a,
        Fut: Future<Output = Result<Page<T>>> + Send + 'a,
    {
        let mut paginator = Self::new(fetch);
        paginator.cursor = Some(cursor.into());
        paginator
    }

    /// Cursor the first fetch will use
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Stream of whole pages
    pub fn pages(self) -> impl Stream<Item = Result<Page<T>>> + Send + 'a {
        // `None` once the last page has been yielded
        let state = Some(self.cursor);

        stream::try_unfold((self.fetch, state), |(fetch, state)| async move {
            let Some(cursor) = state else {
                return Ok(None);
            };

            let page = fetch(cursor).await?;
            let next = page.next_cursor().map(|c| Some(c.to_string()));
            Ok(Some((page, (fetch, next))))
        })
    }

    /// Stream of items across pages
    pub fn items(self) -> impl Stream<Item = Result<T>> + Send + 'a {
        self.pages()
            .map_ok(|page| stream::iter(page.into_items().into_iter().map(Ok)))
            .try_flatten()
    }

    /// Collect every remaining item
    pub async fn collect_all(self) -> Result<Vec<T>> {
        self.items().try_collect().await
    }

    /// Collect up to `limit` items, stopping fetches once reached
    pub async fn take(self, limit: usize) -> Result<Vec<T>> {
        self.items().take(limit).try_collect().await
    }
}

impl<T> std::fmt::Debug for Paginator<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Three pages: c1 -> c2 -> end
    fn three_pages(cursor: Option<String>) -> Result<Page<&'static str>> {
        Ok(match cursor.as_deref() {
            None => Page::new(vec!["a", "b"], Some("c1".into())),
            Some("c1") => Page::new(vec!["c", "d"], Some("c2".into())),
            Some("c2") => Page::new(vec!["e"], None),
            Some(other) => panic!("unexpected cursor {other}"),
        })
    }

    #[test]
    fn test_cursor_present_iff_has_more() {
        let page = Page::new(vec![1, 2], Some("c1".to_string()));
        assert!(page.has_more());
        assert_eq!(page.next_cursor(), Some("c1"));
        assert_eq!(page.len(), 2);

        let last = Page::new(vec![3], None);
        assert!(!last.has_more());

        let empty_cursor = Page::<i32>::new(Vec::new(), Some(String::new()));
        assert!(!empty_cursor.has_more());
        assert!(empty_cursor.is_empty());
    }

    #[test]
    fn test_page_from_parts_normalises() {
        let stray_cursor = Page::from_parts(vec![1], Some("c9".to_string()), false);
        assert!(!stray_cursor.has_more());
        assert_eq!(stray_cursor.next_cursor(), None);

        let no_cursor = Page::<i32>::from_parts(Vec::new(), None, true);
        assert!(!no_cursor.has_more());

        let both = Page::from_parts(vec![1], Some("c1".to_string()), true);
        assert_eq!(both.next_cursor(), Some("c1"));
    }

    #[test]
    fn test_page_map_keeps_cursor() {
        let page = Page::new(vec![1, 2], Some("c1".to_string())).map(|n| n * 10);
        assert_eq!(page.items(), &[10, 20]);
        assert_eq!(page.next_cursor(), Some("c1"));
    }

    #[tokio::test]
    async fn test_items_walk_all_pages() {
        let paginator = Paginator::new(|cursor| async move { three_pages(cursor) });
        let items = paginator.collect_all().await.unwrap();
        assert_eq!(items, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_resume_from_cursor() {
        let paginator = Paginator::starting_at(|cursor| async move { three_pages(cursor) }, "c2");
        assert_eq!(paginator.cursor(), Some("c2"));
        assert_eq!(paginator.collect_all().await.unwrap(), vec!["e"]);

        let paginator = Paginator::starting_at(|cursor| async move { three_pages(cursor) }, "c1");
        let pages: Vec<_> = paginator.pages().try_collect().await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].items(), &["c", "d"]);
    }

    #[tokio::test]
    async fn test_lazy_until_polled() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();

        let paginator = Paginator::new(move |cursor| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { three_pages(cursor) }
        });
        let stream = paginator.items();
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        let first_two: Vec<_> = stream.take(2).try_collect().await.unwrap();
        assert_eq!(first_two, vec!["a", "b"]);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let paginator = Paginator::new(move |cursor: Option<String>| {
            log.lock().unwrap().push(cursor.clone());
            async move {
                match cursor {
                    None => Ok(Page::new(vec![1], Some("c1".to_string()))),
                    Some(_) => Err(ApiError::Server {
                        status: 503,
                        error: "unavailable".into(),
                        message: "down".into(),
                    }),
                }
            }
        });

        let results: Vec<Result<i32>> = paginator.items().collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Ok(1));
        assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::Server);
        assert_eq!(*seen.lock().unwrap(), vec![None, Some("c1".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let paginator = Paginator::new(|_| async { Ok(Page::<u8>::empty()) });
        assert!(paginator.collect_all().await.unwrap().is_empty());
    }
}
