//! Broadcast Engine.
//!
//! Turns a set of changed cells into one outbound frame and hands it to
//! each recipient's outbound queue. Delivery never waits: a full or closed
//! queue drops the frame for that recipient only.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use collabadoku_core::{Cell, ServerMessage, SessionId};

/// An encoded JSON frame, shared between recipients.
pub type Outbound = Arc<str>;
pub type ClientSender = mpsc::Sender<Outbound>;
/// Sessions currently attached to a room, keyed by id.
pub type Members = HashMap<SessionId, ClientSender>;

/// Outcome of a fan-out, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Sends `cells` to every member except `exclude`.
///
/// An empty cell list sends nothing.
pub fn fanout(members: &Members, cells: &[Cell], exclude: SessionId) -> FanoutReport {
    let mut report = FanoutReport::default();
    if cells.is_empty() {
        return report;
    }

    let Some(frame) = encode(&ServerMessage::updates(cells)) else {
        return report;
    };

    for (&session_id, sender) in members {
        if session_id == exclude {
            continue;
        }
        if deliver(session_id, sender, Arc::clone(&frame)) {
            report.delivered += 1;
        } else {
            report.dropped += 1;
        }
    }

    debug!(
        cells = cells.len(),
        delivered = report.delivered,
        dropped = report.dropped,
        "Fan-out complete"
    );
    report
}

/// Sends one message to exactly one session.
pub fn send_to(session_id: SessionId, sender: &ClientSender, message: &ServerMessage) -> bool {
    match encode(message) {
        Some(frame) => deliver(session_id, sender, frame),
        None => false,
    }
}

fn encode(message: &ServerMessage) -> Option<Outbound> {
    match message.encode() {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            error!(error = %e, "Failed to encode outbound message");
            None
        }
    }
}

fn deliver(session_id: SessionId, sender: &ClientSender, frame: Outbound) -> bool {
    match sender.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(session_id, "Outbound queue full, dropping frame");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(session_id, "Outbound queue closed, dropping frame");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabadoku_core::{Grid, Position, Selection};

    const PUZZLE: &str =
        "53--7----6--195----98----6-8---6---34--8-3--17---2---6-6----28----419--5----8--79";

    fn cells() -> Vec<Cell> {
        let mut grid = Grid::initialize(PUZZLE).unwrap();
        let pos = Position::new(1, 3).unwrap();
        grid.select(
            pos,
            Selection {
                session_id: 1,
                name: Some("a".into()),
                color: None,
            },
        );
        vec![grid.cell(pos).clone()]
    }

    #[tokio::test]
    async fn fanout_skips_excluded_session() {
        let mut members = Members::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        members.insert(1, tx1);
        members.insert(2, tx2);

        let report = fanout(&members, &cells(), 1);
        assert_eq!(report, FanoutReport { delivered: 1, dropped: 0 });
        assert!(rx1.try_recv().is_err());

        let frame = rx2.try_recv().unwrap();
        let message: ServerMessage = serde_json::from_str(&frame).unwrap();
        let ServerMessage::Updates { updates } = message else {
            panic!("expected updates");
        };
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].selected_by_name.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn full_queue_does_not_block_others() {
        let mut members = Members::new();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(4);
        let (closed_tx, closed_rx) = mpsc::channel(4);
        drop(closed_rx);
        slow_tx.try_send(Arc::from("backlog")).unwrap();
        members.insert(10, slow_tx);
        members.insert(11, fast_tx);
        members.insert(12, closed_tx);

        let report = fanout(&members, &cells(), 99);
        assert_eq!(report, FanoutReport { delivered: 1, dropped: 2 });
        assert!(fast_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn empty_cell_list_sends_nothing() {
        let mut members = Members::new();
        let (tx, mut rx) = mpsc::channel(4);
        members.insert(1, tx);
        assert_eq!(fanout(&members, &[], 0), FanoutReport::default());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_targets_one_session() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(send_to(5, &tx, &ServerMessage::error("join_failed", "nope")));
        let frame = rx.try_recv().unwrap();
        assert!(frame.contains("join_failed"));
    }
}
