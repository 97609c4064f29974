// SPDX-License-Identifier: MIT OR Apache-2.0
//! A single run of a wrapped program.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use cliwrap_args::Command;
use cliwrap_output::{ExecutionContext, ParsedObject, ProcessorError, SharedProcessor, Stream};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::ChildStdin;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace, warn};

use crate::error::ExecError;
use crate::events::{ExecutionEvent, ExitInfo, Subscribers};
use crate::kill::KillSwitch;
use crate::lifecycle::{LifecycleError, LifecycleManager, LifecycleState, LifecycleTransition};

/// One run of a program with one argument string.
///
/// An execution is created in [`LifecycleState::Created`], started once,
/// and moves forward through its states; none is re-enterable. With an
/// output processor attached, the process's standard streams are piped:
/// every stdout line goes to [`parse_output`], every stderr line to
/// [`parse_error`], and each returned object is published as an
/// [`ExecutionEvent::Output`]. Without a processor the streams are
/// inherited and nothing is parsed.
///
/// Starting requires a Tokio runtime. [`parse_as_list_blocking`] brings
/// its own.
///
/// [`parse_output`]: cliwrap_output::OutputProcessor::parse_output
/// [`parse_error`]: cliwrap_output::OutputProcessor::parse_error
/// [`parse_as_list_blocking`]: Execution::parse_as_list_blocking
pub struct Execution {
    ctx: ExecutionContext,
    processor: Option<SharedProcessor>,
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
    throw_on_error_while_parse: bool,
    abort_on_error_while_parse: bool,
    shared: Arc<Shared>,
}

struct Shared {
    lifecycle: Mutex<LifecycleManager>,
    subscribers: Subscribers,
    stdin: tokio::sync::Mutex<Option<ChildStdin>>,
    kill: KillSwitch,
    exit: watch::Sender<Option<ExitInfo>>,
    waiter: Mutex<Option<JoinHandle<()>>>,
    pid: Mutex<Option<u32>>,
}

impl Shared {
    fn transition(&self, to: LifecycleState, reason: &str) -> Result<(), LifecycleError> {
        self.lifecycle
            .lock()
            .expect("lifecycle lock poisoned")
            .transition(to, Some(reason.to_string()))
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle
            .lock()
            .expect("lifecycle lock poisoned")
            .state()
    }

    /// Deliver trailing output and publish the exit.
    fn finish(&self, pump: Option<&Pump>, info: ExitInfo) {
        self.subscribers.emit(&ExecutionEvent::PreExited);
        if let Some(pump) = pump {
            pump.deliver(pump.processor.ended(&pump.ctx));
        }
        if let Err(e) = self.transition(LifecycleState::Exited, "process exited") {
            warn!(target: "cliwrap.exec", error = %e, "unexpected lifecycle state at exit");
        }
        self.exit.send_replace(Some(info));
        self.subscribers.emit(&ExecutionEvent::Exited(&info));
    }
}

/// Per-line plumbing shared by the stream readers and the waiter.
#[derive(Clone)]
struct Pump {
    ctx: ExecutionContext,
    processor: SharedProcessor,
    shared: Arc<Shared>,
}

impl Pump {
    fn line(&self, stream: Stream, line: &str) {
        trace!(target: "cliwrap.exec", %stream, line, "line");
        let result = match stream {
            Stream::Stdout => {
                self.shared
                    .subscribers
                    .emit(&ExecutionEvent::StdoutLine(line));
                self.processor.parse_output(&self.ctx, line)
            }
            Stream::Stderr => {
                self.shared
                    .subscribers
                    .emit(&ExecutionEvent::StderrLine(line));
                self.processor.parse_error(&self.ctx, line)
            }
        };
        self.deliver(result);
    }

    fn deliver(&self, result: Result<Vec<ParsedObject>, ProcessorError>) {
        let (objects, error) = match result {
            Ok(objects) => (objects, None),
            Err(err) => {
                let (objects, err) = err.into_parts();
                (objects, Some(err))
            }
        };
        for object in &objects {
            self.shared.subscribers.emit(&ExecutionEvent::Output(object));
        }
        if let Some(err) = error {
            warn!(
                target: "cliwrap.exec",
                execution = %self.ctx.id(),
                error = %err,
                "processor error"
            );
            self.shared.subscribers.emit(&ExecutionEvent::Error(&err));
        }
    }

    async fn read<R: AsyncRead + Unpin>(self, reader: R, stream: Stream) {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    self.line(stream, text.trim_end_matches(['\n', '\r']));
                }
                Err(e) => {
                    warn!(target: "cliwrap.exec", %stream, error = %e, "stream read failed");
                    break;
                }
            }
        }
    }
}

impl Execution {
    /// Create an execution of `program` with a pre-built argument string.
    pub fn new(program: impl Into<String>, arguments: impl Into<String>) -> Self {
        let (exit, _) = watch::channel(None);
        Self {
            ctx: ExecutionContext::new(program, arguments),
            processor: None,
            working_dir: None,
            env: Vec::new(),
            throw_on_error_while_parse: false,
            abort_on_error_while_parse: false,
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(LifecycleManager::new()),
                subscribers: Subscribers::default(),
                stdin: tokio::sync::Mutex::new(None),
                kill: KillSwitch::new(),
                exit,
                waiter: Mutex::new(None),
                pid: Mutex::new(None),
            }),
        }
    }

    /// Create an execution that inherits `command`'s processor and parse
    /// error policies.
    pub fn from_command(
        program: impl Into<String>,
        command: &Command,
        arguments: impl Into<String>,
    ) -> Self {
        let mut execution = Self::new(program, arguments);
        execution.processor = command.processor().cloned();
        execution.throw_on_error_while_parse = command.throw_on_error_while_parse();
        execution.abort_on_error_while_parse = command.abort_on_error_while_parse();
        execution
    }

    /// Identity passed to the processor on every call.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Program to launch.
    pub fn program(&self) -> &str {
        self.ctx.program()
    }

    /// Argument string, split with POSIX shell rules at start.
    pub fn arguments(&self) -> &str {
        self.ctx.arguments()
    }

    /// Attached processor, if any.
    pub fn processor(&self) -> Option<&SharedProcessor> {
        self.processor.as_ref()
    }

    /// Attach a processor. Has no effect once started.
    pub fn set_processor(&mut self, processor: SharedProcessor) -> &mut Self {
        self.processor = Some(processor);
        self
    }

    /// Working directory for the process.
    pub fn set_working_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add an environment variable for the process.
    pub fn add_env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Re-raise the first parse error when a list consumption completes.
    pub fn set_throw_on_error_while_parse(&mut self, throw: bool) -> &mut Self {
        self.throw_on_error_while_parse = throw;
        self
    }

    /// Kill the process on the first parse error seen by a consumption mode.
    pub fn set_abort_on_error_while_parse(&mut self, abort: bool) -> &mut Self {
        self.abort_on_error_while_parse = abort;
        self
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    /// Transitions so far, oldest first.
    pub fn history(&self) -> Vec<LifecycleTransition> {
        self.shared
            .lifecycle
            .lock()
            .expect("lifecycle lock poisoned")
            .history()
            .to_vec()
    }

    /// OS process id once spawned.
    pub fn pid(&self) -> Option<u32> {
        *self.shared.pid.lock().expect("pid lock poisoned")
    }

    /// Exit information once the process has exited.
    pub fn exit_info(&self) -> Option<ExitInfo> {
        *self.shared.exit.borrow()
    }

    /// Register an event handler. Handlers run on the reader tasks, so they
    /// must not block.
    pub fn subscribe(
        &self,
        handler: impl Fn(&ExecutionEvent<'_>) + Send + Sync + 'static,
    ) -> &Self {
        self.shared.subscribers.push(Arc::new(handler));
        self
    }

    /// Register a handler for parsed objects only.
    pub fn on_output(&self, handler: impl Fn(&ParsedObject) + Send + Sync + 'static) -> &Self {
        self.subscribe(move |event| {
            if let ExecutionEvent::Output(object) = event {
                handler(*object);
            }
        })
    }

    /// Register a handler for processor errors only.
    pub fn on_error(&self, handler: impl Fn(&ProcessorError) + Send + Sync + 'static) -> &Self {
        self.subscribe(move |event| {
            if let ExecutionEvent::Error(err) = event {
                handler(*err);
            }
        })
    }

    /// Launch the process.
    ///
    /// Fires [`ExecutionEvent::PreStarted`], spawns the program and, when a
    /// processor is attached, begins reading stdout and stderr before
    /// firing [`ExecutionEvent::Started`]. A launch failure still completes
    /// the exit path so waiters are released.
    pub fn start(&self) -> Result<(), ExecError> {
        self.shared
            .transition(LifecycleState::Started, "start requested")?;
        if let Some(processor) = &self.processor {
            processor.pre_started(&self.ctx);
        }
        self.shared.subscribers.emit(&ExecutionEvent::PreStarted);

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.shared.finish(
                    self.pump().as_ref(),
                    ExitInfo {
                        code: None,
                        success: false,
                        killed: false,
                    },
                );
                return Err(err);
            }
        };

        let pid = child.id();
        *self.shared.pid.lock().expect("pid lock poisoned") = pid;
        debug!(
            target: "cliwrap.exec",
            program = self.ctx.program(),
            arguments = self.ctx.arguments(),
            ?pid,
            "process spawned"
        );

        if let Some(stdin) = child.stdin.take() {
            // A fresh child has no contention on its stdin slot.
            if let Ok(mut slot) = self.shared.stdin.try_lock() {
                *slot = Some(stdin);
            }
        }

        self.shared
            .subscribers
            .emit(&ExecutionEvent::Started { pid });
        if let Some(processor) = &self.processor {
            processor.started(&self.ctx);
        }
        self.shared
            .transition(LifecycleState::Running, "streams attached")?;

        let pump = self.pump();
        let mut readers = Vec::new();
        if let Some(pump) = &pump {
            if let Some(stdout) = child.stdout.take() {
                readers.push(tokio::spawn(pump.clone().read(stdout, Stream::Stdout)));
            }
            if let Some(stderr) = child.stderr.take() {
                readers.push(tokio::spawn(pump.clone().read(stderr, Stream::Stderr)));
            }
        }

        let shared = Arc::clone(&self.shared);
        let kill = self.shared.kill.clone();
        let waiter = tokio::spawn(async move {
            let mut killed = false;
            let status = tokio::select! {
                status = child.wait() => status,
                () = kill.triggered() => {
                    killed = true;
                    if let Err(e) = child.start_kill() {
                        warn!(target: "cliwrap.exec", error = %e, "kill failed");
                    }
                    child.wait().await
                }
            };
            for reader in readers {
                let _ = reader.await;
            }
            let info = match status {
                Ok(status) => ExitInfo {
                    code: status.code(),
                    success: status.success(),
                    killed,
                },
                Err(e) => {
                    warn!(target: "cliwrap.exec", error = %e, "waiting for process failed");
                    ExitInfo {
                        code: None,
                        success: false,
                        killed,
                    }
                }
            };
            debug!(target: "cliwrap.exec", code = ?info.code, killed, "process exited");
            shared.finish(pump.as_ref(), info);
        });
        *self.shared.waiter.lock().expect("waiter lock poisoned") = Some(waiter);
        Ok(())
    }

    fn pump(&self) -> Option<Pump> {
        self.processor.as_ref().map(|processor| Pump {
            ctx: self.ctx.clone(),
            processor: Arc::clone(processor),
            shared: Arc::clone(&self.shared),
        })
    }

    fn spawn(&self) -> Result<tokio::process::Child, ExecError> {
        let args =
            shell_words::split(self.ctx.arguments()).map_err(|e| ExecError::Arguments {
                arguments: self.ctx.arguments().to_string(),
                reason: e.to_string(),
            })?;

        let mut cmd = tokio::process::Command::new(self.ctx.program());
        cmd.args(&args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if self.processor.is_some() {
            cmd.stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }

        cmd.spawn().map_err(|source| ExecError::Spawn {
            program: self.ctx.program().to_string(),
            source,
        })
    }

    /// Request the process be killed.
    ///
    /// The normal exit path still runs: trailing output is flushed and
    /// consumers complete. Killing before start kills right after launch.
    pub fn kill(&self) {
        debug!(target: "cliwrap.exec", execution = %self.ctx.id(), "kill requested");
        self.shared.kill.trigger();
    }

    /// Wait until the process has exited and all trailing output was
    /// delivered.
    pub async fn wait_for_exit(&self) -> Result<ExitInfo, ExecError> {
        if let Some(info) = self.exit_info() {
            return Ok(info);
        }
        let state = self.state();
        if matches!(state, LifecycleState::Created | LifecycleState::Disposed) {
            return Err(LifecycleError::InvalidTransition {
                from: state,
                to: LifecycleState::Exited,
            }
            .into());
        }
        let mut rx = self.shared.exit.subscribe();
        let info = rx.wait_for(Option::is_some).await.ok().and_then(|info| *info);
        info.ok_or(ExecError::Lifecycle(LifecycleError::InvalidTransition {
            from: state,
            to: LifecycleState::Exited,
        }))
    }

    /// Release the process handles and drop all subscribers.
    ///
    /// Valid before start or after exit. No input can be sent afterwards.
    pub async fn dispose(&self) -> Result<(), ExecError> {
        if self.state() == LifecycleState::Exited {
            let waiter = self.shared.waiter.lock().expect("waiter lock poisoned").take();
            if let Some(waiter) = waiter {
                let _ = waiter.await;
            }
        }
        self.shared
            .transition(LifecycleState::Disposed, "disposed")?;
        self.shared.stdin.lock().await.take();
        self.shared.subscribers.clear();
        Ok(())
    }

    /// Write `text` to the process's standard input.
    pub async fn send_input(&self, text: &str) -> Result<(), ExecError> {
        let mut slot = self.shared.stdin.lock().await;
        let stdin = slot.as_mut().ok_or(ExecError::StdinUnavailable)?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(ExecError::Stdin)?;
        stdin.flush().await.map_err(ExecError::Stdin)
    }

    /// Write `text` followed by a newline.
    pub async fn send_input_line(&self, text: &str) -> Result<(), ExecError> {
        self.send_input(&format!("{text}\n")).await
    }

    /// Close the process's standard input, signalling end of input.
    pub async fn close_input(&self) {
        self.shared.stdin.lock().await.take();
    }

    fn start_if_created(&self) -> Result<(), ExecError> {
        if self.state() == LifecycleState::Created {
            self.start()
        } else {
            Ok(())
        }
    }

    /// Run to completion and collect every parsed object of type `T`.
    ///
    /// Parse errors are dropped unless `throw_on_error_while_parse` or
    /// `abort_on_error_while_parse` is set, in which case the first one is
    /// returned after the process has exited. Abort also kills the process
    /// as soon as that error is seen.
    pub async fn parse_as_list<T>(&self) -> Result<Vec<T>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        let items = Arc::new(Mutex::new(Vec::new()));
        let first_error = Arc::new(Mutex::new(None::<ProcessorError>));
        {
            let items = Arc::clone(&items);
            let first_error = Arc::clone(&first_error);
            let abort = self.abort_on_error_while_parse;
            let kill = self.shared.kill.clone();
            self.subscribe(move |event| match event {
                ExecutionEvent::Output(object) => {
                    if let Some(value) = object.downcast_ref::<T>() {
                        items.lock().expect("items lock poisoned").push(value.clone());
                    }
                }
                ExecutionEvent::Error(err) => {
                    let mut slot = first_error.lock().expect("error lock poisoned");
                    if slot.is_none() {
                        *slot = Some((*err).clone());
                        if abort {
                            kill.trigger();
                        }
                    }
                }
                _ => {}
            });
        }

        self.start_if_created()?;
        self.wait_for_exit().await?;
        self.dispose().await?;

        let error = first_error.lock().expect("error lock poisoned").take();
        if let Some(err) = error {
            if self.throw_on_error_while_parse || self.abort_on_error_while_parse {
                return Err(ExecError::Parse(err));
            }
        }
        let items = std::mem::take(&mut *items.lock().expect("items lock poisoned"));
        Ok(items)
    }

    /// Blocking form of [`parse_as_list`](Self::parse_as_list).
    ///
    /// Runs on a private current-thread runtime, and refuses to run from
    /// inside an existing runtime.
    pub fn parse_as_list_blocking<T>(&self) -> Result<Vec<T>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ExecError::NestedRuntime);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ExecError::Runtime)?;
        runtime.block_on(self.parse_as_list())
    }

    /// Run [`parse_as_list`](Self::parse_as_list) on a background task.
    pub fn spawn_parse_as_list<T>(self) -> JoinHandle<Result<Vec<T>, ExecError>>
    where
        T: Any + Send + Sync + Clone,
    {
        tokio::spawn(async move { self.parse_as_list::<T>().await })
    }

    /// Start the process and stream parsed objects of type `T` as they
    /// arrive.
    ///
    /// The stream ends once the process has exited, trailing output has
    /// been delivered and the execution is disposed. Parse errors are not
    /// part of the stream; subscribe beforehand to observe them.
    pub fn parse_as_stream<T>(self) -> Result<UnboundedReceiverStream<T>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = Arc::new(Mutex::new(Some(tx)));
        {
            let sender = Arc::clone(&sender);
            let abort = self.abort_on_error_while_parse;
            let kill = self.shared.kill.clone();
            self.subscribe(move |event| match event {
                ExecutionEvent::Output(object) => {
                    if let Some(value) = object.downcast_ref::<T>() {
                        if let Some(tx) = sender.lock().expect("sender lock poisoned").as_ref() {
                            let _ = tx.send(value.clone());
                        }
                    }
                }
                ExecutionEvent::Error(_) if abort => kill.trigger(),
                _ => {}
            });
        }

        self.start_if_created()?;
        tokio::spawn(async move {
            if let Err(e) = self.wait_for_exit().await {
                warn!(target: "cliwrap.exec", error = %e, "stream ended without exit");
            }
            if let Err(e) = self.dispose().await {
                debug!(target: "cliwrap.exec", error = %e, "dispose after stream failed");
            }
            sender.lock().expect("sender lock poisoned").take();
        });
        Ok(UnboundedReceiverStream::new(rx))
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("id", &self.ctx.id())
            .field("program", &self.ctx.program())
            .field("arguments", &self.ctx.arguments())
            .field("has_processor", &self.processor.is_some())
            .field("state", &self.state())
            .finish()
    }
}
