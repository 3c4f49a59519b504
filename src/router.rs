//! Request routing between front ends and the data layer.
//!
//! A single actor task owns the [`AppContext`] and handles one request at a
//! time. Callers talk to it through a cloneable [`RouterHandle`]; each request
//! carries a fresh [`RequestId`] and gets its reply on a oneshot channel.

use crate::app::AppContext;
use crate::db::QueryResult;
use crate::error::{FarmError, Result};
use crate::paging::PageResult;
use crate::registry::Route;
use crate::session::{Credentials, User};
use crate::store::{Fields, Table};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maximum number of requests waiting for the actor.
pub const CHANNEL_CAPACITY: usize = 32;

/// Unique identifier for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Generates a new unique request ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operations a front end can ask for.
#[derive(Debug, Clone)]
pub enum Request {
    /// One page of a route for the signed-in user.
    Page { route: Route, page_number: i64 },
    Insert { table: Table, entity: Fields },
    Update {
        table: Table,
        identifying: Fields,
        changes: Fields,
    },
    Delete { table: Table, identifying: Fields },
    SignIn(Credentials),
    /// Registers a user; `profile` holds extra `users` columns.
    SignUp {
        credentials: Credentials,
        profile: Fields,
    },
    SignOut,
    CurrentUser,
}

impl Request {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Page { .. } => "page",
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::SignIn(_) => "sign-in",
            Self::SignUp { .. } => "sign-up",
            Self::SignOut => "sign-out",
            Self::CurrentUser => "current-user",
        }
    }
}

/// Successful replies.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Response {
    Page(PageResult),
    Written(QueryResult),
    SignedIn(User),
    SignedOut,
    CurrentUser(Option<User>),
}

enum RouterCommand {
    Dispatch {
        id: RequestId,
        request: Request,
        cancel: CancellationToken,
        reply: oneshot::Sender<Result<Response>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// The actor that owns the application context.
pub struct RouterActor {
    ctx: AppContext,
    receiver: mpsc::Receiver<RouterCommand>,
}

impl RouterActor {
    /// Creates an actor and the handle used to reach it. Call [`run`](Self::run)
    /// (or use [`spawn`](Self::spawn)) to start processing.
    pub fn new(ctx: AppContext) -> (RouterHandle, Self) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        (RouterHandle { sender }, Self { ctx, receiver })
    }

    /// Starts the actor on the current runtime.
    pub fn spawn(ctx: AppContext) -> (RouterHandle, JoinHandle<()>) {
        let (handle, actor) = Self::new(ctx);
        let task = tokio::spawn(actor.run());
        (handle, task)
    }

    /// Processes commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            match command {
                RouterCommand::Dispatch {
                    id,
                    request,
                    cancel,
                    reply,
                } => {
                    let kind = request.kind();
                    debug!("Request {id} ({kind}) started");
                    let result = self.dispatch(request, &cancel).await;
                    if let Err(e) = &result {
                        warn!("Request {id} ({kind}) failed: {e}");
                    }
                    if reply.send(result).is_err() {
                        debug!("Request {id} ({kind}) finished after its caller went away");
                    }
                }
                RouterCommand::Shutdown { reply } => {
                    self.close().await;
                    let _ = reply.send(());
                    return;
                }
            }
        }
        self.close().await;
    }

    async fn close(&mut self) {
        info!("Router shutting down");
        self.ctx.sign_out();
        if let Err(e) = self.ctx.db().close().await {
            warn!("Error closing database: {e}");
        }
    }

    async fn dispatch(&mut self, request: Request, cancel: &CancellationToken) -> Result<Response> {
        if cancel.is_cancelled() {
            return Err(FarmError::Cancelled);
        }

        match request {
            Request::Page { route, page_number } => self
                .ctx
                .page(route, page_number, cancel)
                .await
                .map(Response::Page),
            Request::Insert { table, entity } => {
                self.ctx.insert(table, &entity).await.map(Response::Written)
            }
            Request::Update {
                table,
                identifying,
                changes,
            } => self
                .ctx
                .update(table, &identifying, &changes)
                .await
                .map(Response::Written),
            Request::Delete { table, identifying } => self
                .ctx
                .delete(table, &identifying)
                .await
                .map(Response::Written),
            Request::SignIn(credentials) => {
                let user = self.ctx.sign_in(&credentials).await?;
                Ok(Response::SignedIn(user.clone()))
            }
            Request::SignUp {
                credentials,
                profile,
            } => {
                let user = self.ctx.sign_up(&credentials, profile).await?;
                Ok(Response::SignedIn(user.clone()))
            }
            Request::SignOut => {
                self.ctx.sign_out();
                Ok(Response::SignedOut)
            }
            Request::CurrentUser => Ok(Response::CurrentUser(self.ctx.current_user().cloned())),
        }
    }
}

/// Cloneable handle for sending requests to the router.
#[derive(Clone)]
pub struct RouterHandle {
    sender: mpsc::Sender<RouterCommand>,
}

impl RouterHandle {
    /// Sends a request and waits for its reply.
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.send_with_cancel(request, CancellationToken::new()).await
    }

    /// Sends a request that can be abandoned through `cancel`.
    pub async fn send_with_cancel(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> Result<Response> {
        let id = RequestId::new();
        let (reply, response) = oneshot::channel();
        debug!("Queueing request {id} ({})", request.kind());

        self.sender
            .send(RouterCommand::Dispatch {
                id,
                request,
                cancel,
                reply,
            })
            .await
            .map_err(|_| FarmError::internal("Router actor closed"))?;

        response
            .await
            .map_err(|_| FarmError::internal(format!("Router dropped request {id}")))?
    }

    /// Stops the actor after it finishes the request in hand.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.sender
            .send(RouterCommand::Shutdown { reply })
            .await
            .map_err(|_| FarmError::internal("Router actor closed"))?;
        done.await
            .map_err(|_| FarmError::internal("Router actor exited before acknowledging shutdown"))
    }
}
