use crl_types::ActorId;
use tokio::sync::watch;

/// The identity a request acts as.
///
/// Sessions are explicit and passed per request — there is no shared
/// account singleton. A session does not prove anything by itself; the
/// gate decides what the identity may do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    actor: ActorId,
}

impl Session {
    pub fn new(actor: ActorId) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }
}

/// "Current identity changed" notifications from the external signing
/// collaborator.
///
/// The core only consumes the notification, not the wallet callback
/// mechanism: the collaborator pushes the new identity (or `None` on
/// disconnect) and interested tasks observe it through a watch channel.
pub struct IdentityWatch {
    tx: watch::Sender<Option<ActorId>>,
}

impl IdentityWatch {
    /// Create a watch with no identity connected.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Publish an identity change.
    pub fn set(&self, actor: Option<ActorId>) {
        self.tx.send_replace(actor);
    }

    /// The currently connected identity, if any.
    pub fn current(&self) -> Option<ActorId> {
        *self.tx.borrow()
    }

    /// A session for the current identity, if one is connected.
    pub fn session(&self) -> Option<Session> {
        self.current().map(Session::new)
    }

    /// Subscribe to identity changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<ActorId>> {
        self.tx.subscribe()
    }
}

impl Default for IdentityWatch {
    fn default() -> Self {
        Self::new()
    }
}
