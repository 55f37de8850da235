//! Recognizer connection service.
//!
//! [`IpcService::start`] spawns one task that owns the connection to the recognizer for the life
//! of the process:
//!
//! - connect to `host:port`;
//! - while connected, read one message, handle it completely (a batch runs through the
//!   [`Resolver`], including any chain-break resubmission), write the reply, then read the next;
//! - on disconnect or connect failure, retry with [`Backoff`]; after the last retry publish
//!   [`ConnectionStatus::Unreachable`] and wait for [`IpcHandle::reconnect`].
//!
//! Only one service may run per process. A second `start` fails with
//! [`IpcError::AlreadyRunning`] until the first one is stopped.

use crate::backoff::{Backoff, BackoffConfig};
use crate::error::IpcError;
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::transport::{read_message, write_message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use voxedit_core::{EditorHost, Recognizer, Resolver, ResubmitError};

/// Default recognizer port.
pub const DEFAULT_PORT: u16 = 17373;

static RUNNING: AtomicBool = AtomicBool::new(false);

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Recognizer host.
    pub host: String,
    /// Recognizer port.
    pub port: u16,
    /// Reconnect schedule.
    pub backoff: BackoffConfig,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Connection health as seen by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Trying to connect.
    Connecting,
    /// Connected to the recognizer.
    Connected,
    /// Gave up after `attempts` failed connection attempts.
    Unreachable {
        /// Failed connection attempts.
        attempts: u32,
    },
    /// The service has stopped.
    Stopped,
}

#[derive(Debug)]
enum Control {
    Send(OutboundMessage),
    Reconnect,
    Stop,
}

enum Exit {
    Disconnected,
    Reconnect,
    Stop,
}

enum Wait {
    Elapsed,
    Reconnect,
    Stop,
}

/// Recognizer handle used while a batch runs; resubmissions go out on the live connection.
struct ConnectionRecognizer {
    outbound: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl Recognizer for ConnectionRecognizer {
    async fn resubmit(&mut self, text: &str, chain: bool) -> Result<(), ResubmitError> {
        self.outbound
            .send(OutboundMessage::send_text(text, chain).to_value())
            .map_err(|_| ResubmitError("connection writer stopped".to_string()))
    }
}

/// Releases the process-wide guard when the service task ends.
struct RunningGuard;

impl Drop for RunningGuard {
    fn drop(&mut self) {
        RUNNING.store(false, Ordering::SeqCst);
    }
}

/// Entry point for the recognizer connection.
pub struct IpcService;

impl IpcService {
    /// Start the service on the current tokio runtime.
    ///
    /// The resolver moves into the service; reach it through [`IpcHandle::resolver`].
    pub fn start<H>(config: IpcConfig, resolver: Resolver<H>) -> Result<IpcHandle<H>, IpcError>
    where
        H: EditorHost + 'static,
    {
        if RUNNING.swap(true, Ordering::SeqCst) {
            return Err(IpcError::AlreadyRunning);
        }
        let guard = RunningGuard;

        let resolver = Arc::new(Mutex::new(resolver));
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);

        let task = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                let _guard = guard;
                run(config, resolver, control_rx, status_tx).await;
            })
        };

        Ok(IpcHandle {
            control: control_tx,
            status: status_rx,
            resolver,
            task,
        })
    }
}

/// Handle to a running service.
pub struct IpcHandle<H> {
    control: mpsc::UnboundedSender<Control>,
    status: watch::Receiver<ConnectionStatus>,
    resolver: Arc<Mutex<Resolver<H>>>,
    task: JoinHandle<()>,
}

impl<H> IpcHandle<H> {
    /// Send `{type: kind, data}` to the recognizer.
    ///
    /// Messages sent while disconnected are dropped.
    pub fn send(&self, kind: &str, data: Value) -> Result<(), IpcError> {
        self.control
            .send(Control::Send(OutboundMessage::new(kind, data)))
            .map_err(|_| IpcError::Closed)
    }

    /// Drop the current connection (if any) and start a fresh backoff schedule.
    pub fn reconnect(&self) -> Result<(), IpcError> {
        self.control
            .send(Control::Reconnect)
            .map_err(|_| IpcError::Closed)
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// The resolver the service drives.
    pub fn resolver(&self) -> Arc<Mutex<Resolver<H>>> {
        Arc::clone(&self.resolver)
    }

    /// Stop the service and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.control.send(Control::Stop);
        if let Err(err) = self.task.await {
            warn!(error = %err, "IPC service task failed");
        }
    }
}

async fn run<H>(
    config: IpcConfig,
    resolver: Arc<Mutex<Resolver<H>>>,
    mut control: mpsc::UnboundedReceiver<Control>,
    status: watch::Sender<ConnectionStatus>,
) where
    H: EditorHost + 'static,
{
    let mut backoff = Backoff::new(config.backoff);
    let mut attempts = 0u32;

    loop {
        status.send_replace(ConnectionStatus::Connecting);
        attempts += 1;

        match TcpStream::connect((config.host.as_str(), config.port)).await {
            Ok(stream) => {
                info!(host = %config.host, port = config.port, "connected to recognizer");
                attempts = 0;
                backoff.reset();
                set_connection_failed(&resolver, false).await;
                status.send_replace(ConnectionStatus::Connected);

                match serve(stream, &resolver, &mut control).await {
                    Exit::Stop => break,
                    Exit::Reconnect => continue,
                    Exit::Disconnected => {}
                }
            }
            Err(err) => {
                debug!(port = config.port, attempt = attempts, error = %err, "connect failed");
            }
        }

        match backoff.next_delay() {
            Some(delay) => match wait(delay, &mut control).await {
                Wait::Elapsed => {}
                Wait::Reconnect => {
                    attempts = 0;
                    backoff.reset();
                }
                Wait::Stop => break,
            },
            None => {
                let error = IpcError::Unreachable { attempts };
                warn!(error = %error, "giving up on recognizer");
                set_connection_failed(&resolver, true).await;
                status.send_replace(ConnectionStatus::Unreachable { attempts });

                attempts = 0;
                backoff.reset();
                if !park(&mut control).await {
                    break;
                }
            }
        }
    }

    status.send_replace(ConnectionStatus::Stopped);
    debug!("IPC service stopped");
}

async fn set_connection_failed<H>(resolver: &Mutex<Resolver<H>>, failed: bool)
where
    H: EditorHost,
{
    resolver
        .lock()
        .await
        .dispatcher_mut()
        .session_mut()
        .set_connection_failed(failed);
}

/// Sleep for `delay` unless the caller asks for something sooner.
async fn wait(delay: Duration, control: &mut mpsc::UnboundedReceiver<Control>) -> Wait {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return Wait::Elapsed,
            command = control.recv() => match command {
                Some(Control::Send(message)) => {
                    debug!(kind = %message.kind, "not connected, dropping message");
                }
                Some(Control::Reconnect) => return Wait::Reconnect,
                Some(Control::Stop) | None => return Wait::Stop,
            },
        }
    }
}

/// Wait for a reconnect request. Returns `false` when the service should stop instead.
async fn park(control: &mut mpsc::UnboundedReceiver<Control>) -> bool {
    loop {
        match control.recv().await {
            Some(Control::Send(message)) => {
                debug!(kind = %message.kind, "recognizer unreachable, dropping message");
            }
            Some(Control::Reconnect) => return true,
            Some(Control::Stop) | None => return false,
        }
    }
}

async fn serve<H>(
    stream: TcpStream,
    resolver: &Mutex<Resolver<H>>,
    control: &mut mpsc::UnboundedReceiver<Control>,
) -> Exit
where
    H: EditorHost + 'static,
{
    let (read_half, write_half) = stream.into_split();
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let reader = tokio::spawn(read_loop(read_half, inbound_tx));
    let writer = tokio::spawn(write_loop(write_half, outbound_rx));

    let exit = loop {
        tokio::select! {
            inbound = inbound_rx.recv() => match inbound {
                Some(Ok(value)) => handle_inbound(value, resolver, &outbound_tx).await,
                Some(Err(err)) => {
                    warn!(error = %err, "recognizer connection failed");
                    break Exit::Disconnected;
                }
                None => {
                    info!("recognizer closed the connection");
                    break Exit::Disconnected;
                }
            },
            command = control.recv() => match command {
                Some(Control::Send(message)) => {
                    let _ = outbound_tx.send(message.to_value());
                }
                Some(Control::Reconnect) => break Exit::Reconnect,
                Some(Control::Stop) | None => break Exit::Stop,
            },
        }
    };

    reader.abort();
    drop(outbound_tx);
    if let Err(err) = writer.await {
        debug!(error = %err, "writer task ended abnormally");
    }
    exit
}

async fn handle_inbound<H>(
    value: Value,
    resolver: &Mutex<Resolver<H>>,
    outbound: &mpsc::UnboundedSender<Value>,
) where
    H: EditorHost + 'static,
{
    let message = match InboundMessage::from_value(value) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "ignoring malformed message");
            return;
        }
    };

    match message {
        InboundMessage::Batch { id, batch } => {
            let mut recognizer = ConnectionRecognizer {
                outbound: outbound.clone(),
            };
            let mut resolver = resolver.lock().await;
            let data = match resolver.handle_batch(batch, &mut recognizer).await {
                Ok(outcome) => outcome.payload(),
                Err(err) => {
                    warn!(error = %err, "batch failed");
                    None
                }
            };
            let _ = outbound.send(OutboundMessage::response(id, data).to_value());
        }
        InboundMessage::Status { text } => {
            resolver
                .lock()
                .await
                .dispatcher_mut()
                .session_mut()
                .set_status(text);
        }
        InboundMessage::Volume { volume } => {
            resolver
                .lock()
                .await
                .dispatcher_mut()
                .session_mut()
                .set_volume(volume);
        }
        InboundMessage::Unknown { kind } => {
            debug!(kind = %kind, "ignoring unknown message type");
        }
    }
}

async fn read_loop(read_half: OwnedReadHalf, tx: mpsc::UnboundedSender<Result<Value, IpcError>>) {
    let mut reader = BufReader::new(read_half);
    loop {
        match read_message(&mut reader).await {
            Ok(Some(value)) => {
                if tx.send(Ok(value)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                let _ = tx.send(Err(err));
                break;
            }
        }
    }
}

async fn write_loop(mut write_half: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Value>) {
    while let Some(value) = rx.recv().await {
        if let Err(err) = write_message(&mut write_half, &value).await {
            warn!(error = %err, "failed to write to recognizer");
            break;
        }
    }
}
