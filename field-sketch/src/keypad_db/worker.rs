//! Accès au keypad hors du thread appelant
//!
//! La base est possédée par une tâche bloquante qui traite les requêtes une
//! par une. Chaque requête porte son canal de réponse.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sketch::{Category, KeypadStore};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{KeypadDb, SelectedItem};

type Reply<T> = oneshot::Sender<Result<T>>;

enum Request {
    Load(Reply<Vec<Category>>),
    Save(Vec<Category>, Reply<Vec<Category>>),
    SelectedItems(Reply<Vec<SelectedItem>>),
    Seed(Reply<Vec<Category>>),
}

/// Poignée asynchrone vers la base du keypad
///
/// Doit être créée dans un runtime tokio.
pub struct KeypadWorker {
    tx: mpsc::Sender<Request>,
    handle: JoinHandle<()>,
}

impl KeypadWorker {
    /// Ouvre la base (keypad par défaut si vide) et démarre la tâche
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::spawn(KeypadDb::open_or_seed(path)?))
    }

    pub fn spawn(db: KeypadDb) -> Self {
        let (tx, mut rx) = mpsc::channel::<Request>(16);

        let handle = tokio::task::spawn_blocking(move || {
            while let Some(request) = rx.blocking_recv() {
                let delivered = match request {
                    Request::Load(reply) => reply.send(db.load()).is_ok(),
                    Request::Save(categories, reply) => {
                        reply.send(db.reset_and_update(&categories)).is_ok()
                    }
                    Request::SelectedItems(reply) => reply.send(db.selected_items()).is_ok(),
                    Request::Seed(reply) => reply.send(db.seed_defaults()).is_ok(),
                };
                if !delivered {
                    warn!("Keypad reply dropped, caller went away");
                }
            }
            debug!("Keypad worker stopped");
        });

        Self { tx, handle }
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| anyhow!("Keypad worker is not running"))?;
        response.await.context("Keypad worker dropped the request")?
    }

    pub async fn load(&self) -> Result<Vec<Category>> {
        self.request(Request::Load).await
    }

    /// Charge un store depuis la base
    pub async fn load_store(&self) -> Result<KeypadStore> {
        Ok(KeypadStore::new(self.load().await?))
    }

    pub async fn selected_items(&self) -> Result<Vec<SelectedItem>> {
        self.request(Request::SelectedItems).await
    }

    /// Remet la base au keypad par défaut
    pub async fn seed_defaults(&self) -> Result<Vec<Category>> {
        self.request(Request::Seed).await
    }

    /// Persiste la copie de travail du store puis la promeut
    ///
    /// Le store reste emprunté jusqu'à la réponse : une seule application
    /// à la fois. En cas d'échec, le store est inchangé.
    pub async fn apply(&self, store: &mut KeypadStore) -> Result<()> {
        let Some(working) = store.working_copy() else {
            return Ok(());
        };
        let snapshot = working.to_vec();
        let persisted = self
            .request(|reply| Request::Save(snapshot, reply))
            .await?;
        store.promote(persisted);
        Ok(())
    }

    /// Ferme le canal et attend la fin de la tâche
    pub async fn shutdown(self) -> Result<()> {
        drop(self.tx);
        self.handle.await.context("Keypad worker panicked")
    }
}
