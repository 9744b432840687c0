//! Blocking REST client over the Firecracker API UNIX socket.
//!
//! Grounded on the teacher's `agent/sync_agent.rs`: a persistent
//! `UnixStream`, an `httparse`-based response parser, and an `fslock` file
//! guarding the request/response pairing so one client instance can be
//! driven from a single caller thread without interleaving writes and
//! reads of two in-flight requests.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use fslock::LockFile;
use log::{error, trace};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

const MAX_BUFFER_SIZE: usize = 4096;

/// A thin, blocking HTTP/1.1-over-UNIX-socket client bound to one
/// Firecracker instance's API socket.
#[derive(Debug)]
pub struct RestClient {
    stream: UnixStream,
    lock: LockFile,
}

impl RestClient {
    pub fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path)
            .map_err(|e| Error::Transport(format!("connecting to {socket_path:?}: {e}")))?;
        stream
            .set_nonblocking(true)
            .map_err(|e| Error::Transport(format!("setting non-blocking mode: {e}")))?;
        let lock_path = lock_path_for(socket_path);
        let lock = LockFile::open(&lock_path)
            .map_err(|e| Error::Transport(format!("opening lock file {lock_path:?}: {e}")))?;
        Ok(Self { stream, lock })
    }

    pub fn describe(&mut self, path: &str) -> Result<Value> {
        self.request("GET", path, None)
    }

    pub fn put(&mut self, path: &str, body: &impl Serialize) -> Result<()> {
        self.request("PUT", path, Some(serde_json::to_value(body)?))
            .map(|_| ())
    }

    pub fn patch(&mut self, path: &str, body: &Value) -> Result<()> {
        self.request("PUT", path, Some(body.clone())).map(|_| ())
    }

    pub fn create_sync_action(&mut self, action_type: &str) -> Result<()> {
        let body = serde_json::json!({ "action_type": action_type });
        self.request("PUT", "/actions", Some(body)).map(|_| ())
    }

    pub fn create_snapshot(&mut self, body: &Value) -> Result<()> {
        self.request("PUT", "/snapshot/create", Some(body.clone()))
            .map(|_| ())
    }

    pub fn load_snapshot(&mut self, body: &Value) -> Result<()> {
        self.request("PUT", "/snapshot/load", Some(body.clone()))
            .map(|_| ())
    }

    pub fn patch_vm(&mut self, state: &str) -> Result<()> {
        let body = serde_json::json!({ "state": state });
        self.request("PATCH", "/vm", Some(body)).map(|_| ())
    }

    fn request(&mut self, method: &str, path: &str, body: Option<Value>) -> Result<Value> {
        self.lock
            .lock()
            .map_err(|e| Error::Transport(format!("locking request channel: {e}")))?;
        let result = self.request_locked(method, path, body);
        let _ = self.lock.unlock();
        result
    }

    fn request_locked(&mut self, method: &str, path: &str, body: Option<Value>) -> Result<Value> {
        self.clear_stream()?;

        let payload = body.map(|v| v.to_string()).unwrap_or_default();
        let mut request = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
            payload.len()
        );
        request.push_str(&payload);
        trace!("firecracker api request: {method} {path}");

        self.stream
            .write_all(request.as_bytes())
            .map_err(|e| Error::Transport(format!("writing request: {e}")))?;
        self.stream
            .flush()
            .map_err(|e| Error::Transport(format!("flushing request: {e}")))?;

        let (status, raw_body) = self.recv_response()?;
        let parsed: Value = if raw_body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw_body)?
        };

        if status == 200 || status == 204 {
            return Ok(parsed);
        }

        if let Some(msg) = parsed.get("fault_message").and_then(Value::as_str) {
            error!("firecracker api error on {method} {path}: {msg}");
            return Err(Error::Api(msg.to_string()));
        }
        Err(Error::Transport(format!(
            "unexpected status {status} from {method} {path}"
        )))
    }

    fn recv_response(&mut self) -> Result<(u16, Vec<u8>)> {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut res = httparse::Response::new(&mut headers);

        let mut buf = [0u8; MAX_BUFFER_SIZE];
        let mut accum: Vec<u8> = Vec::new();

        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    accum.extend_from_slice(&buf[..n]);
                    if n < MAX_BUFFER_SIZE {
                        if let Ok(httparse::Status::Complete(head_len)) = res.parse(&accum) {
                            let total_needed = content_length(&res).unwrap_or(0);
                            if accum.len() >= head_len + total_needed {
                                break;
                            }
                            continue;
                        }
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) => return Err(Error::Transport(format!("reading response: {e}"))),
            }
        }

        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut res = httparse::Response::new(&mut headers);
        let parsed = res
            .parse(&accum)
            .map_err(|e| Error::Transport(format!("parsing response: {e}")))?;
        let head_len = match parsed {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => {
                return Err(Error::Transport("incomplete HTTP response".into()))
            }
        };
        let status = res.code.unwrap_or(0);
        let len = content_length(&res).unwrap_or(0);
        let body = accum
            .get(head_len..head_len + len)
            .map(|s| s.to_vec())
            .unwrap_or_default();
        Ok((status, body))
    }

    fn clear_stream(&mut self) -> Result<()> {
        let mut buf = [0u8; 1024];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(Error::Transport(format!("clearing stream: {e}"))),
            }
        }
        Ok(())
    }
}

fn content_length(res: &httparse::Response) -> Option<usize> {
    res.headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
        .and_then(|h| std::str::from_utf8(h.value).ok())
        .and_then(|s| s.parse().ok())
}

fn lock_path_for(socket_path: &Path) -> PathBuf {
    let mut s = socket_path.as_os_str().to_owned();
    s.push(".lock");
    PathBuf::from(s)
}
