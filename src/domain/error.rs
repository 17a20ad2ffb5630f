use thiserror::Error;

use crate::domain::value_objects::{Category, Side};

/// Failures a schema comparison can surface.
///
/// `Connection` is fatal to the whole run. `Fetch` is recovered by the
/// snapshot service, which substitutes an empty collection and records the
/// failure on the snapshot. `InvalidTable` rejects a malformed snapshot before
/// any reconciliation starts.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to connect to database {side}: {message}")]
    Connection { side: Side, message: String },

    #[error("failed to fetch {category} for {object}: {message}")]
    Fetch {
        category: Category,
        object: String,
        message: String,
    },

    #[error("invalid table record #{index} in snapshot {side}: {reason}")]
    InvalidTable {
        side: Side,
        index: usize,
        reason: String,
    },
}

impl CompareError {
    /// Build a `Connection` error from any error, keeping its full context chain.
    pub fn connection(side: Side, err: &anyhow::Error) -> Self {
        CompareError::Connection {
            side,
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = CompareError::Fetch {
            category: Category::Triggers,
            object: "dbo.Users".into(),
            message: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch triggers for dbo.Users: permission denied"
        );

        let err = CompareError::InvalidTable {
            side: Side::B,
            index: 3,
            reason: "missing table name".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid table record #3 in snapshot B: missing table name"
        );
    }

    #[test]
    fn connection_keeps_context_chain() {
        let inner = anyhow::anyhow!("timed out").context("Failed to connect to shop");
        let err = CompareError::connection(Side::A, &inner);
        assert_eq!(
            err.to_string(),
            "failed to connect to database A: Failed to connect to shop: timed out"
        );
    }
}
