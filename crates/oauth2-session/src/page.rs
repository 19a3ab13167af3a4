//! Page capability: current URL, fragment access, navigation.
//!
//! This is the seam between the session and whatever hosts it. A browser
//! binding clears the fragment through its client-side router when one is
//! active (a raw location rewrite would reload the page and re-run the
//! fragment branch of the login sequence in a loop); the composition root
//! picks the implementation.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Access to the current page URL and navigation primitives.
pub trait Page: Send + Sync + std::fmt::Debug {
    /// Full current URL, used as the `redirect_uri` for interactive logins.
    fn url(&self) -> String;

    /// Portion of the current URL after `#`, without the `#` itself.
    /// Empty when there is no fragment.
    fn fragment(&self) -> String;

    /// Clear the fragment from the visible URL without a full navigation.
    fn clear_fragment(&self);

    /// Navigate away from the page (full load of the given URL).
    fn navigate(&self, url: &str);

    /// Reload the current URL so application state re-initializes.
    fn reload(&self);
}

/// In-memory page for tests and headless embedding. Records navigations and
/// reloads instead of performing them.
#[derive(Debug)]
pub struct StaticPage {
    url: Mutex<String>,
    fragment: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    reloads: AtomicUsize,
}

impl StaticPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Mutex::new(url.into()),
            fragment: Mutex::new(String::new()),
            navigations: Mutex::new(Vec::new()),
            reloads: AtomicUsize::new(0),
        }
    }

    /// Set the fragment, as if the authorization server had just redirected
    /// back with one.
    pub fn with_fragment(self, fragment: impl Into<String>) -> Self {
        *self.fragment.lock() = fragment.into();
        self
    }

    /// URLs passed to [`Page::navigate`], oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    /// Number of [`Page::reload`] calls.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Page for StaticPage {
    fn url(&self) -> String {
        self.url.lock().clone()
    }

    fn fragment(&self) -> String {
        self.fragment.lock().clone()
    }

    fn clear_fragment(&self) {
        self.fragment.lock().clear();
    }

    fn navigate(&self, url: &str) {
        self.navigations.lock().push(url.to_string());
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_page_records_state() {
        let page = StaticPage::new("https://app.example.com/").with_fragment("access_token=t");
        assert_eq!(page.url(), "https://app.example.com/");
        assert_eq!(page.fragment(), "access_token=t");

        page.clear_fragment();
        assert_eq!(page.fragment(), "");

        page.navigate("https://auth.example.com/oauth/authorize");
        assert_eq!(page.navigations().len(), 1);

        page.reload();
        assert_eq!(page.reload_count(), 1);
    }
}
