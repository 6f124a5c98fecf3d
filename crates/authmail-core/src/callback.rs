//! Transient local endpoint for the authorization redirect.
//!
//! During an authorization attempt the provider sends the operator's
//! browser back to `http://127.0.0.1:<port>/auth/callback` with either a
//! `code` or an `error` query parameter. The listener exists only for that
//! window: it answers every request with a human-readable page so no
//! browser tab is left hanging, but only the first request carrying a code
//! or an error settles the one-shot outcome.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Path the provider redirect must hit.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Per-connection I/O deadline. Bounds `stop` when a client stalls
/// mid-request; unrelated to the unbounded wait for the redirect itself.
const CONNECTION_DEADLINE: Duration = Duration::from_secs(10);

/// What the redirect delivered: an authorization code, or a denial.
///
/// Produced at most once per listener lifetime and consumed exactly once by
/// [`CallbackListener::wait_for_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The provider granted authorization and delivered a one-shot code.
    Code(String),
    /// The provider reported an error (operator denied, etc).
    Denied(String),
}

/// Captures one authorization outcome from a browser redirect.
///
/// Lifecycle: Idle → Listening (`start`) → Resolved (first informative
/// request) → Stopped (`stop`). `wait_for_code` may be called once per
/// listening period and is the flow's single suspension point.
#[async_trait]
pub trait CallbackListener: Send {
    /// Binds the endpoint and begins accepting redirects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListenerBindFailed`] if the port cannot be bound,
    /// which aborts the authorization attempt before any provider contact.
    async fn start(&mut self, port: u16) -> Result<()>;

    /// Suspends until the redirect arrives, then yields its code.
    ///
    /// # Errors
    ///
    /// [`Error::AuthorizationDenied`] if the redirect carried an error
    /// indicator; [`Error::MissingCode`] if the wait ended without a code
    /// (listener stopped, never started, or already consumed).
    async fn wait_for_code(&mut self) -> Result<String>;

    /// Releases the endpoint. Safe without a prior `start`, idempotent,
    /// and invoked unconditionally after the wait settles so no attempt
    /// leaks a bound port.
    async fn stop(&mut self);
}

struct Listening {
    outcome: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    addr: SocketAddr,
}

/// [`CallbackListener`] over a local TCP socket speaking just enough HTTP
/// to answer a browser redirect.
#[derive(Default)]
pub struct HttpCallbackListener {
    listening: Option<Listening>,
}

impl HttpCallbackListener {
    /// Creates an idle listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Address actually bound, if listening. Port 0 requests an ephemeral
    /// port; this is where to learn which one.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listening.as_ref().map(|l| l.addr)
    }
}

#[async_trait]
impl CallbackListener for HttpCallbackListener {
    async fn start(&mut self, port: u16) -> Result<()> {
        if self.listening.is_some() {
            return Err(Error::ListenerBindFailed(io::Error::new(
                io::ErrorKind::AddrInUse,
                "callback listener already started",
            )));
        }

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(Error::ListenerBindFailed)?;
        let addr = listener.local_addr().map_err(Error::ListenerBindFailed)?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(serve(listener, outcome_tx, shutdown_rx));

        debug!(%addr, "callback listener bound");
        self.listening = Some(Listening {
            outcome: Some(outcome_rx),
            shutdown: shutdown_tx,
            task,
            addr,
        });
        Ok(())
    }

    async fn wait_for_code(&mut self) -> Result<String> {
        let outcome = self
            .listening
            .as_mut()
            .and_then(|l| l.outcome.take())
            .ok_or(Error::MissingCode)?;

        match outcome.await {
            Ok(CallbackOutcome::Code(code)) => Ok(code),
            Ok(CallbackOutcome::Denied(reason)) => Err(Error::AuthorizationDenied(reason)),
            // Accept loop went away before any informative request arrived.
            Err(_) => Err(Error::MissingCode),
        }
    }

    async fn stop(&mut self) {
        let Some(listening) = self.listening.take() else {
            return;
        };
        // Dropping the sender wakes the accept loop between connections.
        drop(listening.shutdown);
        let _ = listening.task.await;
        debug!("callback listener stopped");
    }
}

/// Accept loop. Connections are handled one at a time; the outcome sender
/// is consumed by `Option::take`, so a duplicate or retried redirect can
/// never overwrite an already-resolved outcome.
async fn serve(
    listener: TcpListener,
    outcome: oneshot::Sender<CallbackOutcome>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut resolve = Some(outcome);
    loop {
        let stream = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => stream,
                Err(err) => {
                    warn!("callback accept failed: {err}");
                    continue;
                }
            },
        };

        match timeout(CONNECTION_DEADLINE, answer(stream, &mut resolve)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!("callback connection error: {err}"),
            Err(_) => debug!("callback connection timed out"),
        }
    }
}

/// Reads one request, writes the page it deserves, then (for the first
/// informative request) resolves the outcome. The reply goes out before
/// the resolution so the browser is answered even if the orchestrator
/// tears the listener down immediately after the wait settles.
async fn answer(
    stream: TcpStream,
    resolve: &mut Option<oneshot::Sender<CallbackOutcome>>,
) -> io::Result<()> {
    let mut stream = BufReader::new(stream);

    let mut request_line = String::new();
    stream.read_line(&mut request_line).await?;
    loop {
        let mut header = String::new();
        let n = stream.read_line(&mut header).await?;
        if n == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    let (reply, outcome) = route(&request_line);
    stream.write_all(reply.as_bytes()).await?;
    stream.flush().await?;

    if let Some(outcome) = outcome
        && let Some(sender) = resolve.take()
    {
        debug!("authorization redirect resolved");
        let _ = sender.send(outcome);
    }
    Ok(())
}

/// Maps a request line to its HTTP reply and, for an informative redirect,
/// the outcome it carries.
fn route(request_line: &str) -> (String, Option<CallbackOutcome>) {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if method != "GET" || path != CALLBACK_PATH {
        return (
            reply("404 Not Found", "Not Found", "Nothing to see here."),
            None,
        );
    }

    let mut code = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(reason) = error {
        let page = reply(
            "400 Bad Request",
            "Authorization Failed",
            &format!("Error: {reason}"),
        );
        return (page, Some(CallbackOutcome::Denied(reason)));
    }

    if let Some(code) = code {
        let page = reply(
            "200 OK",
            "Authorization Successful!",
            "You can close this window and return to the terminal.",
        );
        return (page, Some(CallbackOutcome::Code(code)));
    }

    // A redirect with neither parameter is answered but never settles the
    // outcome; the wait keeps running for the real redirect.
    (
        reply(
            "400 Bad Request",
            "Authorization Failed",
            "No authorization code received.",
        ),
        None,
    )
}

fn reply(status: &str, heading: &str, detail: &str) -> String {
    let body = format!(
        "<html><body style=\"font-family:sans-serif;text-align:center;padding:50px\">\
         <h2>{heading}</h2><p>{detail}</p><p>You can close this window.</p></body></html>"
    );
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn request(addr: SocketAddr, target: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                format!("GET {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                    .as_bytes(),
            )
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn started() -> (HttpCallbackListener, SocketAddr) {
        let mut listener = HttpCallbackListener::new();
        listener.start(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[tokio::test]
    async fn first_informative_request_wins() {
        let (mut listener, addr) = started().await;

        let uninformative = request(addr, "/favicon.ico").await;
        assert!(uninformative.starts_with("HTTP/1.1 404"));

        let first = request(addr, "/auth/callback?code=A&state=s").await;
        assert!(first.starts_with("HTTP/1.1 200"));
        assert!(first.contains("Authorization Successful!"));

        // A retried redirect is still answered but cannot overwrite
        let second = request(addr, "/auth/callback?code=B").await;
        assert!(second.starts_with("HTTP/1.1 200"));

        assert_eq!(listener.wait_for_code().await.unwrap(), "A");
        listener.stop().await;
    }

    #[tokio::test]
    async fn denied_redirect_fails_the_wait() {
        let (mut listener, addr) = started().await;

        let response = request(addr, "/auth/callback?error=access_denied").await;
        assert!(response.starts_with("HTTP/1.1 400"));
        assert!(response.contains("Authorization Failed"));

        match listener.wait_for_code().await {
            Err(Error::AuthorizationDenied(reason)) => assert_eq!(reason, "access_denied"),
            other => panic!("expected AuthorizationDenied, got {other:?}"),
        }
        listener.stop().await;
    }

    #[tokio::test]
    async fn paramless_redirect_does_not_settle_the_outcome() {
        let (mut listener, addr) = started().await;

        let response = request(addr, "/auth/callback").await;
        assert!(response.starts_with("HTTP/1.1 400"));
        assert!(response.contains("No authorization code received."));

        request(addr, "/auth/callback?code=X").await;
        assert_eq!(listener.wait_for_code().await.unwrap(), "X");
        listener.stop().await;
    }

    #[tokio::test]
    async fn stop_is_safe_without_start_and_idempotent() {
        let mut listener = HttpCallbackListener::new();
        listener.stop().await;
        listener.stop().await;

        listener.start(0).await.unwrap();
        listener.stop().await;
        listener.stop().await;
        assert!(listener.local_addr().is_none());
    }

    #[tokio::test]
    async fn stop_releases_the_port() {
        let (mut listener, addr) = started().await;
        listener.stop().await;

        let mut replacement = HttpCallbackListener::new();
        replacement.start(addr.port()).await.unwrap();
        replacement.stop().await;
    }

    #[tokio::test]
    async fn wait_after_stop_is_missing_code() {
        let (mut listener, _addr) = started().await;
        listener.stop().await;
        assert!(matches!(
            listener.wait_for_code().await,
            Err(Error::MissingCode)
        ));
    }

    #[tokio::test]
    async fn wait_consumes_the_outcome_once() {
        let (mut listener, addr) = started().await;
        request(addr, "/auth/callback?code=only").await;

        assert_eq!(listener.wait_for_code().await.unwrap(), "only");
        assert!(matches!(
            listener.wait_for_code().await,
            Err(Error::MissingCode)
        ));
        listener.stop().await;
    }

    #[tokio::test]
    async fn start_while_listening_fails() {
        let (mut listener, _addr) = started().await;
        assert!(matches!(
            listener.start(0).await,
            Err(Error::ListenerBindFailed(_))
        ));
        listener.stop().await;
    }

    #[tokio::test]
    async fn encoded_query_values_are_decoded() {
        let (mut listener, addr) = started().await;
        request(addr, "/auth/callback?code=4%2FabcDEF").await;
        assert_eq!(listener.wait_for_code().await.unwrap(), "4/abcDEF");
        listener.stop().await;
    }
}
