//! Single-writer actor for SQLite.
//!
//! All mutations funnel through one background task holding one dedicated
//! connection, so every write runs inside an immediate transaction and
//! concurrent callers never contend on the SQLite write lock.

use diesel::connection::Connection;
use diesel::SqliteConnection;
use log::error;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use memberledger_core::errors::{DatabaseError, Error, Result};

use super::DbPool;
use crate::errors::StorageError;

/// A queued write job. Every mutation in this crate resolves to a row
/// count, so the channel carries plain `usize` results.
type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) -> Result<usize> + Send + 'static>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(WriteJob, oneshot::Sender<Result<usize>>)>,
}

impl WriteHandle {
    /// Runs a write job on the actor's dedicated connection.
    ///
    /// The job executes inside an immediate transaction; returning an error
    /// rolls the whole job back. Returns the number of rows the job touched.
    pub async fn exec<F>(&self, job: F) -> Result<usize>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<usize> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send((Box::new(job), reply_tx))
            .await
            .map_err(|_| writer_stopped())?;

        reply_rx.await.map_err(|_| writer_stopped())?
    }
}

fn writer_stopped() -> Error {
    Error::Database(DatabaseError::Internal(
        "database writer task is no longer running".to_string(),
    ))
}

/// Spawns the background task that serializes all writes onto one pooled
/// connection. Jobs are processed in submission order.
pub fn spawn_writer(pool: Arc<DbPool>) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(WriteJob, oneshot::Sender<Result<usize>>)>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                // Pending exec() calls observe the closed channel as an error.
                error!("Writer task could not acquire a pooled connection: {}", e);
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            // StorageError carries the From<diesel::result::Error> impl the
            // transaction wrapper needs; convert back at the boundary.
            let result = conn
                .immediate_transaction::<_, StorageError, _>(|c| {
                    job(c).map_err(StorageError::from)
                })
                .map_err(Error::from);

            // A dropped receiver means the caller gave up on the reply.
            let _ = reply_tx.send(result);
        }
        // rx.recv() returning None means every WriteHandle was dropped.
    });

    WriteHandle { tx }
}
