// SPDX-License-Identifier: MIT

use crate::error::StoreError;
use rusqlite::Connection;

pub fn ensure(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS peers (
            id                 TEXT PRIMARY KEY,
            pid                INTEGER NOT NULL,
            hostname           TEXT NOT NULL,
            last_seen          REAL NOT NULL,
            cwd                TEXT NOT NULL,
            mode               TEXT,
            mode_since         REAL,
            recv_started       REAL,
            recv_deadline      REAL,
            recv_wait_seconds  REAL,
            active_last_touch  REAL
        );

        CREATE TABLE IF NOT EXISTS messages (
            msg_id        TEXT PRIMARY KEY,
            ts            REAL NOT NULL,
            ts_str        TEXT NOT NULL,
            from_id       TEXT NOT NULL,
            to_id         TEXT NOT NULL,
            content       TEXT NOT NULL,
            state         TEXT NOT NULL,
            lease_owner   TEXT,
            lease_until   REAL,
            attempt       INTEGER NOT NULL DEFAULT 0,
            delivered_at  REAL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_to_state_ts
            ON messages (to_id, state, ts);
        ",
    )?;
    Ok(())
}
