use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::error::CompareError;
use crate::domain::value_objects::Side;
use crate::infrastructure::config::DbConfig;

/// Lifecycle of one side's database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Opens and closes connections for a [`Session`].
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Clone + Send + Sync;

    async fn open(&self, cfg: &DbConfig) -> Result<Self::Connection>;
    async fn close(&self, conn: &Self::Connection);
}

/// One side's connection, owned for the duration of a run.
pub struct Session<C: Connector> {
    side: Side,
    state: ConnectionState,
    conn: Option<C::Connection>,
}

impl<C: Connector> Session<C> {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            state: ConnectionState::Disconnected,
            conn: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The open connection, or `None` while disconnected.
    pub fn connection(&self) -> Option<&C::Connection> {
        self.conn.as_ref()
    }

    /// Connect; a second call while connected is a no-op.
    pub async fn connect(&mut self, connector: &C, cfg: &DbConfig) -> Result<(), CompareError> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        self.state = ConnectionState::Connecting;
        match connector.open(cfg).await {
            Ok(conn) => {
                info!(side = %self.side, host = %cfg.host, db = %cfg.dbname, "connected");
                self.conn = Some(conn);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                Err(CompareError::connection(self.side, &err))
            }
        }
    }

    /// Release the connection. Safe to call in any state.
    pub async fn disconnect(&mut self, connector: &C) {
        if let Some(conn) = self.conn.take() {
            connector.close(&conn).await;
            info!(side = %self.side, "disconnected");
        }
        self.state = ConnectionState::Disconnected;
    }
}

/// Both sides connected.
pub struct SessionPair<C: Connector> {
    a: Session<C>,
    b: Session<C>,
}

impl<C: Connector> SessionPair<C> {
    pub fn a(&self) -> &Session<C> {
        &self.a
    }

    pub fn b(&self) -> &Session<C> {
        &self.b
    }

    pub async fn disconnect(mut self, connector: &C) {
        self.a.disconnect(connector).await;
        self.b.disconnect(connector).await;
    }
}

/// Connect A, then B. If B fails, A is released before the error is returned.
pub async fn connect_pair<C: Connector>(
    connector: &C,
    cfg_a: &DbConfig,
    cfg_b: &DbConfig,
) -> Result<SessionPair<C>, CompareError> {
    let mut a = Session::new(Side::A);
    a.connect(connector, cfg_a).await?;

    let mut b = Session::new(Side::B);
    if let Err(err) = b.connect(connector, cfg_b).await {
        warn!(error = %err, "releasing database A");
        a.disconnect(connector).await;
        return Err(err);
    }

    Ok(SessionPair { a, b })
}
