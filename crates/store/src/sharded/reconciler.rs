// SPDX-License-Identifier: MIT

//! Leader's reconciliation pass (spec §4.4 sharded variant): the Leader
//! (lowest online id) walks every online shard's `outbox` in id order and
//! moves each row into its recipient's `inbox`. Fan-out into concrete
//! per-recipient records already happened at send time (spec §4.5), so
//! this pass never re-expands `"all"` — every `to` here already names one
//! shard.

use super::{inbox, outbox, self_state, shard, status_result};
use crate::error::StoreError;
use crate::paths::shard_db_path;
use abus_core::{AgentId, Peer};
use std::path::Path;
use std::time::Duration;

pub fn run_pass(
    root: &Path,
    online_ids: &[AgentId],
    batch_size: usize,
    busy_timeout: Duration,
) -> Result<(), StoreError> {
    for id in online_ids {
        let path = shard_db_path(root, id);
        let conn = match shard::open_existing(&path, busy_timeout) {
            Ok(conn) => conn,
            Err(_) => continue,
        };
        let batch = outbox::take_batch(&conn, batch_size)?;
        if batch.is_empty() {
            continue;
        }

        let mut delivered = Vec::new();
        for msg in &batch {
            let target_path = shard_db_path(root, &msg.to);
            if target_path.exists() {
                if let Ok(target_conn) = shard::open_existing(&target_path, busy_timeout) {
                    inbox::insert(
                        &target_conn,
                        msg.msg_id.as_str(),
                        msg.ts,
                        &msg.ts_str,
                        &msg.from,
                        &msg.to,
                        &msg.content,
                        msg.attempt,
                    )?;
                }
            }
            // A recipient whose shard vanished between send and reconcile
            // has no inbox to deliver to; the record is dropped either way.
            delivered.push(msg.msg_id.clone());
        }
        outbox::delete_delivered(&conn, &delivered)?;
    }
    Ok(())
}

pub fn fulfill_status_requests(
    root: &Path,
    online: &[Peer],
    render: &dyn Fn(&[Peer]) -> String,
    busy_timeout: Duration,
) -> Result<(), StoreError> {
    for peer in online {
        let path = shard_db_path(root, &peer.id);
        let conn = match shard::open_existing(&path, busy_timeout) {
            Ok(conn) => conn,
            Err(_) => continue,
        };
        if self_state::take_pending_status_request(&conn)? {
            let rendered = render(online);
            status_result::publish_result(&conn, &rendered)?;
        }
    }
    Ok(())
}
