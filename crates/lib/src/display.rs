//! Display surface: the image element frames are rendered into.
//!
//! The bridge only ever writes the image source. Readers (tests, the browser viewer)
//! observe the element through `image_src` or a watch receiver.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Id of the image element on the demo page.
pub const DEFAULT_ELEMENT_ID: &str = "hl-image";

/// A UI element whose image source can be replaced.
pub trait DisplaySurface: Send + Sync {
    /// Element id (e.g. "hl-image").
    fn id(&self) -> &str;
    /// Replace the image source.
    fn set_image_src(&self, src: String);
    /// Current image source, or None if nothing has been written yet.
    fn image_src(&self) -> Option<String>;
}

/// In-memory image element. Holds the latest source in a watch channel so the viewer can follow it.
pub struct ImageElement {
    id: String,
    src: watch::Sender<Option<String>>,
    writes: AtomicU64,
}

impl ImageElement {
    pub fn new(id: impl Into<String>) -> Self {
        let (src, _) = watch::channel(None);
        Self {
            id: id.into(),
            src,
            writes: AtomicU64::new(0),
        }
    }

    /// Receiver that yields the current source and every later one.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.src.subscribe()
    }

    /// Number of image source writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for ImageElement {
    fn default() -> Self {
        Self::new(DEFAULT_ELEMENT_ID)
    }
}

impl DisplaySurface for ImageElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_image_src(&self, src: String) {
        // Count first: a reader woken by the new source must see it counted.
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.src.send_replace(Some(src));
    }

    fn image_src(&self) -> Option<String> {
        self.src.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_element_is_empty() {
        let el = ImageElement::default();
        assert_eq!(el.id(), "hl-image");
        assert_eq!(el.image_src(), None);
        assert_eq!(el.write_count(), 0);
    }

    #[test]
    fn set_replaces_previous_source() {
        let el = ImageElement::new("frame");
        el.set_image_src("a".to_string());
        el.set_image_src("b".to_string());
        assert_eq!(el.image_src().as_deref(), Some("b"));
        assert_eq!(el.write_count(), 2);
    }

    #[test]
    fn set_without_receivers_still_stores() {
        let el = ImageElement::default();
        let rx = el.subscribe();
        drop(rx);
        el.set_image_src("x".to_string());
        assert_eq!(el.image_src().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let el = ImageElement::default();
        let mut rx = el.subscribe();
        el.set_image_src("first".to_string());
        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow_and_update().as_deref(), Some("first"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn count_covers_every_visible_source() {
        let el = std::sync::Arc::new(ImageElement::default());
        let mut rx = el.subscribe();
        let reader = {
            let el = el.clone();
            tokio::spawn(async move {
                loop {
                    rx.changed().await.expect("sender alive");
                    let seen: u64 = rx
                        .borrow_and_update()
                        .as_deref()
                        .and_then(|s| s.parse().ok())
                        .expect("numbered source");
                    assert!(el.write_count() >= seen, "source {} visible before its count", seen);
                    if seen == 500 {
                        break;
                    }
                }
            })
        };
        for n in 1..=500u64 {
            el.set_image_src(n.to_string());
            tokio::task::yield_now().await;
        }
        reader.await.expect("reader saw consistent counts");
    }
}
