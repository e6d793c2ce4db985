use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::Key;
use diesel::{
    SqliteConnection,
    connection::TransactionManager,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};
use tokio::sync::broadcast::Sender;

use crate::msg::Msg;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub key: Key,
    pub msgs: Sender<Msg>,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

impl FromRef<AppState> for Sender<Msg> {
    fn from_ref(state: &AppState) -> Self {
        state.msgs.clone()
    }
}

/// Per-request cache for the request's database connection. Installed into
/// the request extensions by [`tx_commit_middleware`], filled in lazily by
/// the [`ThreadSafeConn`] extractor, and inspected again by the middleware
/// once the handler has produced a response.
#[derive(Clone, Default)]
pub struct TxSlot<const TX: bool> {
    inner: Arc<std::sync::Mutex<Option<ThreadSafeConn<TX>>>>,
}

/// Commits the transaction opened for this request when the handler
/// succeeded, and rolls it back otherwise.
pub async fn tx_commit_middleware(mut req: Request, next: Next) -> Response {
    let tx_slot = TxSlot::<true>::default();
    let plain_slot = TxSlot::<false>::default();
    req.extensions_mut().insert(tx_slot.clone());
    req.extensions_mut().insert(plain_slot.clone());

    let res = next.run(req).await;

    let conn = tx_slot.inner.lock().unwrap().take();
    if let Some(conn) = conn {
        let mut conn = conn.inner.try_lock().unwrap();

        if res.status().is_success()
            || res.status().is_redirection()
            || res.status().is_informational()
        {
            <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
                ::TransactionManager
                ::commit_transaction(&mut conn)
                .unwrap();
        } else {
            <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
                ::TransactionManager
                ::rollback_transaction(&mut conn)
                .unwrap();
        }
    }

    res
}

#[derive(Clone)]
pub struct ThreadSafeConn<const TX: bool> {
    pub inner: Arc<
        tokio::sync::Mutex<
            PooledConnection<ConnectionManager<SqliteConnection>>,
        >,
    >,
}

#[async_trait]
impl<S, const TX: bool> FromRequestParts<S> for ThreadSafeConn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let slot = parts.extensions.get::<TxSlot<TX>>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "transaction middleware not installed",
        ))?;

        let cached = slot.inner.lock().unwrap().clone();
        if let Some(conn) = cached {
            return Ok(conn);
        }

        let pool = DbPool::from_ref(state);
        let mut conn = tokio::task::spawn_blocking(move || pool.get().unwrap())
            .await
            .unwrap();

        if TX {
            <PooledConnection<ConnectionManager<SqliteConnection>> as diesel::Connection>
                ::TransactionManager
                ::begin_transaction(&mut conn)
                .unwrap();
        }

        let wrapped = ThreadSafeConn {
            inner: Arc::new(tokio::sync::Mutex::new(conn)),
        };
        *slot.inner.lock().unwrap() = Some(wrapped.clone());

        Ok(wrapped)
    }
}

pub struct Conn<const TX: bool> {
    inner: tokio::sync::OwnedMutexGuard<
        PooledConnection<ConnectionManager<SqliteConnection>>,
    >,
}

impl<const TX: bool> Deref for Conn<TX> {
    type Target = PooledConnection<ConnectionManager<SqliteConnection>>;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl<const TX: bool> DerefMut for Conn<TX> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.deref_mut()
    }
}

#[async_trait]
impl<S, const TX: bool> FromRequestParts<S> for Conn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let conn = ThreadSafeConn::<TX>::from_request_parts(parts, state).await?;

        Ok(Conn {
            inner: conn.inner.clone().try_lock_owned().unwrap(),
        })
    }
}
