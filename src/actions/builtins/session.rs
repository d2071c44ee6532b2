//! In-memory tab session shared by the built-in navigation actions.
//!
//! Each tab keeps its own history; the last entry is the current page.
//! Access goes through a Tokio mutex so concurrent dispatches touching
//! the same session are serialized by the session, not the dispatcher.

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::actions::ActionContext;

#[derive(Debug, Default)]
struct Tabs {
    tabs: Vec<Vec<String>>,
    active: usize,
}

impl Tabs {
    fn current(&self) -> Option<&String> {
        self.tabs.get(self.active).and_then(|history| history.last())
    }

    fn snapshot(&self) -> Value {
        let tabs: Vec<Value> = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, history)| {
                json!({
                    "index": i,
                    "url": history.last(),
                    "active": i == self.active,
                })
            })
            .collect();
        json!({ "active": self.active, "tabs": tabs })
    }
}

/// A set of browser-like tabs.
#[derive(Debug, Default)]
pub struct TabSession {
    inner: Mutex<Tabs>,
}

impl TabSession {
    /// A session with one tab, optionally already showing `start_url`.
    pub fn new(start_url: Option<&str>) -> Self {
        let first = start_url.map(|u| vec![u.to_string()]).unwrap_or_default();
        Self {
            inner: Mutex::new(Tabs {
                tabs: vec![first],
                active: 0,
            }),
        }
    }

    /// Fetch the session handle from a dispatch context.
    pub fn from_context(ctx: &ActionContext) -> anyhow::Result<std::sync::Arc<TabSession>> {
        ctx.extension::<TabSession>()
            .ok_or_else(|| anyhow::anyhow!("no tab session attached to the action context"))
    }

    pub async fn current_url(&self) -> Option<String> {
        self.inner.lock().await.current().cloned()
    }

    /// Same as [`TabSession::current_url`], for blocking action bodies.
    ///
    /// Must not be called from within an async task.
    pub fn blocking_current_url(&self) -> Option<String> {
        self.inner.blocking_lock().current().cloned()
    }

    pub async fn snapshot(&self) -> Value {
        self.inner.lock().await.snapshot()
    }

    /// Load `url` in the active tab, or in a new tab that becomes active.
    pub async fn navigate(&self, url: &str, new_tab: bool) -> Value {
        let mut tabs = self.inner.lock().await;
        if new_tab || tabs.tabs.is_empty() {
            tabs.tabs.push(vec![url.to_string()]);
            tabs.active = tabs.tabs.len() - 1;
        } else {
            let active = tabs.active;
            tabs.tabs[active].push(url.to_string());
        }
        json!({ "url": url, "tab": tabs.active })
    }

    /// Step back in the active tab's history.
    pub async fn back(&self) -> anyhow::Result<Value> {
        let mut tabs = self.inner.lock().await;
        let active = tabs.active;
        let history = tabs
            .tabs
            .get_mut(active)
            .ok_or_else(|| anyhow::anyhow!("no open tab"))?;
        if history.len() < 2 {
            anyhow::bail!("no earlier page in tab {active}");
        }
        history.pop();
        Ok(json!({ "url": history.last(), "tab": active }))
    }

    pub async fn switch_to(&self, index: usize) -> anyhow::Result<Value> {
        let mut tabs = self.inner.lock().await;
        if index >= tabs.tabs.len() {
            anyhow::bail!("tab {index} does not exist ({} open)", tabs.tabs.len());
        }
        tabs.active = index;
        Ok(json!({ "url": tabs.current(), "tab": index }))
    }

    pub async fn close(&self, index: usize) -> anyhow::Result<Value> {
        let mut tabs = self.inner.lock().await;
        if index >= tabs.tabs.len() {
            anyhow::bail!("tab {index} does not exist ({} open)", tabs.tabs.len());
        }
        let closed = tabs.tabs.remove(index);
        if tabs.active >= index && tabs.active > 0 {
            tabs.active -= 1;
        }
        Ok(json!({
            "closed": closed.last(),
            "active": tabs.active,
            "open": tabs.tabs.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn navigate_and_back() {
        let session = TabSession::new(Some("https://a.test/"));
        session.navigate("https://b.test/", false).await;
        assert_eq!(session.current_url().await.as_deref(), Some("https://b.test/"));

        session.back().await.unwrap();
        assert_eq!(session.current_url().await.as_deref(), Some("https://a.test/"));
        assert!(session.back().await.is_err());
    }

    #[tokio::test]
    async fn tabs_open_switch_close() {
        let session = TabSession::new(Some("https://a.test/"));
        let opened = session.navigate("https://b.test/", true).await;
        assert_eq!(opened["tab"], 1);

        session.switch_to(0).await.unwrap();
        assert_eq!(session.current_url().await.as_deref(), Some("https://a.test/"));
        assert!(session.switch_to(5).await.is_err());

        let closed = session.close(0).await.unwrap();
        assert_eq!(closed["open"], 1);
        assert_eq!(session.current_url().await.as_deref(), Some("https://b.test/"));
    }

    #[tokio::test]
    async fn empty_session_has_no_url() {
        let session = TabSession::new(None);
        assert!(session.current_url().await.is_none());
        assert_eq!(session.snapshot().await["tabs"][0]["url"], Value::Null);
    }
}
