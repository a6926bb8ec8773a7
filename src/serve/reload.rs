// src/serve/reload.rs

//! Live reload: a broadcast hub plus the snippet injected into pages.

use tokio::sync::broadcast;
use tracing::debug;

use crate::engine::ReloadSink;

/// WebSocket endpoint browsers connect to.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Text message pushed to browsers on each reload signal.
pub const RELOAD_MESSAGE: &str = "reload";

const CLIENT_SCRIPT: &str = concat!(
    "<script>(function(){",
    "var p=location.protocol===\"https:\"?\"wss://\":\"ws://\";",
    "var s=new WebSocket(p+location.host+\"/__livereload\");",
    "s.onmessage=function(e){if(e.data===\"reload\")location.reload();};",
    "})();</script>"
);

/// Fan-out of reload signals to every connected browser.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<()>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadSink for ReloadHub {
    fn reload(&self) {
        // No receivers just means no browser is connected.
        match self.tx.send(()) {
            Ok(n) => debug!(clients = n, "reload broadcast"),
            Err(_) => debug!("reload broadcast with no connected clients"),
        }
    }
}

/// Append the live reload client to a page, just before `</body>` when the
/// page has one.
pub fn inject_client(html: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + CLIENT_SCRIPT.len());
            out.push_str(&html[..idx]);
            out.push_str(CLIENT_SCRIPT);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{CLIENT_SCRIPT}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_goes_before_closing_body() {
        let out = inject_client("<body><p>x</p></body></html>");
        assert!(out.starts_with("<body><p>x</p><script>"));
        assert!(out.ends_with("</script></body></html>"));
        assert!(out.contains(LIVERELOAD_PATH));
    }

    #[test]
    fn fragment_gets_client_appended() {
        assert!(inject_client("<p>x</p>").ends_with("</script>"));
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_signal() {
        let hub = ReloadHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.client_count(), 2);

        hub.reload();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn reload_without_clients_is_harmless() {
        ReloadHub::new().reload();
    }
}
