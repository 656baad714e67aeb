use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use super::ClipRect;

/// How long `wait_page_load` waits for `Page.loadEventFired`.
const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Events kept for a later `wait_event`; anything else is dropped on arrival.
const BUFFERED_EVENTS: [&str; 1] = ["Page.loadEventFired"];

/// A CDP event received from the browser.
struct CdpEvent {
    method: String,
    params: Value,
}

/// Per-target WebSocket CDP connection.
///
/// One connection per tab, single owner, reads inline. JavaScript dialogs
/// (`alert`, `confirm`, `prompt`) are accepted as soon as they open so an
/// in-flight `Runtime.evaluate` can complete; their messages are kept until
/// `take_dialogs` is called.
pub struct CdpConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
    event_buffer: Vec<CdpEvent>,
    dialogs: Vec<String>,
}

impl CdpConnection {
    pub async fn connect(url: &str) -> Result<Self> {
        debug!(url, "connecting CDP WebSocket");
        let (ws, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;
        debug!(url, "CDP WebSocket connected");

        Ok(Self {
            ws,
            next_id: 1,
            event_buffer: Vec::new(),
            dialogs: Vec::new(),
        })
    }

    /// Send a CDP command and wait for the matching response (by id).
    /// Events received while waiting are buffered.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.send(method, params).await?;

        loop {
            let parsed = self.next_message().await?;

            if parsed.get("id").and_then(|v| v.as_u64()) == Some(id) {
                if let Some(error) = parsed.get("error") {
                    bail!(
                        "CDP error for {method}: {}",
                        serde_json::to_string(error).unwrap_or_default()
                    );
                }
                return Ok(parsed.get("result").cloned().unwrap_or(Value::Null));
            }

            if let Some((event_method, params)) = split_event(&parsed) {
                self.on_event(event_method, params).await?;
            }
            // Anything else is a reply to a fire-and-forget command.
        }
    }

    /// Wait for a specific CDP event. Checks the buffer first.
    pub async fn wait_event(&mut self, method: &str) -> Result<Value> {
        if let Some(idx) = self.event_buffer.iter().position(|e| e.method == method) {
            return Ok(self.event_buffer.remove(idx).params);
        }

        loop {
            let parsed = self.next_message().await?;
            if let Some((event_method, params)) = split_event(&parsed) {
                if event_method == method {
                    return Ok(params);
                }
                self.on_event(event_method, params).await?;
            }
        }
    }

    /// Wait for the page load event. A timeout is logged, not fatal: SPA
    /// navigations may never fire it.
    pub async fn wait_page_load(&mut self) -> Result<()> {
        match tokio::time::timeout(PAGE_LOAD_TIMEOUT, self.wait_event("Page.loadEventFired")).await
        {
            Ok(Ok(_)) => {
                debug!("page load event received");
                Ok(())
            }
            Ok(Err(e)) => Err(e).context("Error waiting for page load"),
            Err(_) => {
                warn!(
                    timeout_s = PAGE_LOAD_TIMEOUT.as_secs(),
                    "page load timed out, proceeding anyway"
                );
                Ok(())
            }
        }
    }

    /// Navigate and wait for the load event. Stale events from earlier
    /// navigations are dropped first.
    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        let stale = self.event_buffer.len();
        self.event_buffer.clear();
        debug!(url, stale_events_cleared = stale, "navigating");
        let result = self
            .call("Page.navigate", json!({"url": url}))
            .await
            .context("Failed to navigate")?;
        if let Some(err) = result.get("errorText").and_then(|v| v.as_str()) {
            bail!("Navigation to {url} failed: {err}");
        }
        self.wait_page_load().await
    }

    /// Evaluate a synchronous JS expression and return its JSON value.
    pub async fn eval(&mut self, expression: &str) -> Result<Value> {
        let result = self
            .call(
                "Runtime.evaluate",
                json!({"expression": expression, "returnByValue": true}),
            )
            .await
            .context("JS evaluation failed")?;
        check_js_exception(&result)?;
        Ok(unwrap_value(result))
    }

    /// Evaluate a JS expression, await its promise, return the resolved value.
    pub async fn eval_async(&mut self, expression: &str) -> Result<Value> {
        let snippet: String = expression.chars().take(80).collect();
        trace!(snippet, "eval_async");
        let result = self
            .call(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "awaitPromise": true,
                    "returnByValue": true,
                }),
            )
            .await
            .context("JS evaluation failed")?;
        check_js_exception(&result)?;
        Ok(unwrap_value(result))
    }

    /// Capture the given page region (document coordinates) as PNG bytes.
    pub async fn capture_screenshot(&mut self, clip: &ClipRect) -> Result<Vec<u8>> {
        let result = self
            .call(
                "Page.captureScreenshot",
                json!({
                    "format": "png",
                    "captureBeyondViewport": true,
                    "clip": {
                        "x": clip.x,
                        "y": clip.y,
                        "width": clip.w,
                        "height": clip.h,
                        "scale": 1,
                    },
                }),
            )
            .await
            .context("Failed to capture screenshot")?;

        let b64_data = result["data"]
            .as_str()
            .context("No screenshot data in response")?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(b64_data)
            .context("Failed to decode base64 screenshot")
    }

    pub async fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 1,
                "mobile": false,
            }),
        )
        .await
        .context("Failed to set device metrics")?;
        Ok(())
    }

    /// Enable the Page and Runtime domains. Page is required for load and
    /// dialog events.
    pub async fn enable_domains(&mut self) -> Result<()> {
        self.call("Page.enable", json!({}))
            .await
            .context("Failed to enable Page domain")?;
        self.call("Runtime.enable", json!({}))
            .await
            .context("Failed to enable Runtime domain")?;
        Ok(())
    }

    /// Messages of dialogs accepted since the last call, oldest first.
    pub fn take_dialogs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dialogs)
    }

    async fn send(&mut self, method: &str, params: Value) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;

        let msg = json!({
            "id": id,
            "method": method,
            "params": params,
        });

        self.ws
            .send(Message::Text(msg.to_string().into()))
            .await
            .with_context(|| format!("Failed to send CDP command {method}"))?;
        Ok(id)
    }

    /// Next JSON text frame; binary/ping/pong frames are skipped.
    async fn next_message(&mut self) -> Result<Value> {
        loop {
            let raw = self
                .ws
                .next()
                .await
                .context("WebSocket closed while waiting for CDP message")?
                .context("WebSocket error")?;

            let Message::Text(text) = raw else {
                continue;
            };

            return serde_json::from_str(&text).context("Failed to parse CDP message");
        }
    }

    /// Dialogs are handled immediately (the page is blocked until they are);
    /// events in `BUFFERED_EVENTS` are kept for `wait_event`, the rest dropped.
    async fn on_event(&mut self, method: String, params: Value) -> Result<()> {
        if method == "Page.javascriptDialogOpening" {
            let message = params
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            debug!(message = %message, "accepting JS dialog");
            self.dialogs.push(message);
            // The reply is ignored by `call`'s id match.
            self.send("Page.handleJavaScriptDialog", json!({"accept": true}))
                .await?;
            return Ok(());
        }
        if is_buffered(&method) {
            self.event_buffer.push(CdpEvent { method, params });
        } else {
            trace!(method = %method, "dropping event");
        }
        Ok(())
    }
}

fn is_buffered(method: &str) -> bool {
    BUFFERED_EVENTS.contains(&method)
}

fn split_event(parsed: &Value) -> Option<(String, Value)> {
    let method = parsed.get("method").and_then(|v| v.as_str())?;
    let params = parsed.get("params").cloned().unwrap_or(Value::Null);
    Some((method.to_string(), params))
}

/// Bail if a `Runtime.evaluate` result contains an exception.
fn check_js_exception(result: &Value) -> Result<()> {
    let Some(details) = result.get("exceptionDetails") else {
        return Ok(());
    };
    let desc = details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(|d| d.as_str())
        .or_else(|| details.get("text").and_then(|t| t.as_str()))
        .unwrap_or("unknown exception");
    bail!("JS error: {desc}");
}

/// `{"result": {"type": ..., "value": X}}` → `X` (or `null` for `undefined`).
fn unwrap_value(mut result: Value) -> Value {
    result
        .get_mut("result")
        .and_then(|r| r.get_mut("value"))
        .map(Value::take)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_value_extracts_remote_object_value() {
        let v = json!({"result": {"type": "string", "value": "hi"}});
        assert_eq!(unwrap_value(v), json!("hi"));
    }

    #[test]
    fn unwrap_value_maps_undefined_to_null() {
        let v = json!({"result": {"type": "undefined"}});
        assert_eq!(unwrap_value(v), Value::Null);
    }

    #[test]
    fn exception_description_is_reported() {
        let v = json!({
            "result": {"type": "object"},
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": {"description": "Error: no element for #missing"}
            }
        });
        let err = check_js_exception(&v).unwrap_err();
        assert_eq!(err.to_string(), "JS error: Error: no element for #missing");
    }

    #[test]
    fn exception_without_description_falls_back_to_text() {
        let v = json!({"exceptionDetails": {"text": "Uncaught SyntaxError"}});
        let err = check_js_exception(&v).unwrap_err();
        assert_eq!(err.to_string(), "JS error: Uncaught SyntaxError");
    }

    #[test]
    fn plain_result_is_not_an_exception() {
        assert!(check_js_exception(&json!({"result": {"value": 1}})).is_ok());
    }

    #[test]
    fn only_awaited_events_are_buffered() {
        assert!(is_buffered("Page.loadEventFired"));
        assert!(!is_buffered("Runtime.consoleAPICalled"));
        assert!(!is_buffered("Runtime.executionContextCreated"));
        assert!(!is_buffered("Page.frameNavigated"));
    }

    #[test]
    fn split_event_reads_method_and_params() {
        let msg = json!({"method": "Page.javascriptDialogOpening", "params": {"message": "x"}});
        let (method, params) = split_event(&msg).unwrap();
        assert_eq!(method, "Page.javascriptDialogOpening");
        assert_eq!(params["message"], "x");
        assert!(split_event(&json!({"id": 3, "result": {}})).is_none());
    }
}
