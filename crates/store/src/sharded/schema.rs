// SPDX-License-Identifier: MIT

use crate::error::StoreError;
use rusqlite::Connection;

pub fn ensure(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS self_state (
            rowid              INTEGER PRIMARY KEY CHECK (rowid = 1),
            pid                INTEGER NOT NULL,
            hostname           TEXT NOT NULL,
            cwd                TEXT NOT NULL,
            last_heartbeat     REAL NOT NULL,
            mode               TEXT,
            mode_since         REAL,
            recv_started       REAL,
            recv_deadline      REAL,
            recv_wait_seconds  REAL,
            active_last_touch  REAL,
            status_request     INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS inbox (
            msg_id    TEXT PRIMARY KEY,
            ts        REAL NOT NULL,
            ts_str    TEXT NOT NULL,
            from_id   TEXT NOT NULL,
            to_id     TEXT NOT NULL,
            content   TEXT NOT NULL,
            attempt   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS outbox (
            msg_id    TEXT PRIMARY KEY,
            ts        REAL NOT NULL,
            ts_str    TEXT NOT NULL,
            from_id   TEXT NOT NULL,
            to_id     TEXT NOT NULL,
            content   TEXT NOT NULL,
            attempt   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS status_result (
            rowid     INTEGER PRIMARY KEY CHECK (rowid = 1),
            ready     INTEGER NOT NULL DEFAULT 0,
            rendered  TEXT
        );
        ",
    )?;
    Ok(())
}
