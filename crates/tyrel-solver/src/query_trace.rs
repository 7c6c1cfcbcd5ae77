//! Machine-readable start/end events for analyzer queries.
//!
//! Emitted on target `tyrel::query_json` only when that target is enabled
//! at trace level, e.g. `TYREL_LOG=tyrel::query_json=trace TYREL_LOG_FORMAT=json`.
//! Start and end events of one query share a `query_id`; `TYREL_QUERY_RUN_ID`
//! tags every event of a run (default `default`).

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;
use tyrel_model::TypeId;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static RUN_ID: OnceLock<String> = OnceLock::new();

macro_rules! query_event {
    ($phase:literal, $query_id:expr, $op:expr, $($field:tt)*) => {
        tracing::trace!(
            target: "tyrel::query_json",
            event = "query",
            phase = $phase,
            run_id = run_id(),
            query_id = $query_id,
            op = $op,
            $($field)*
        )
    };
}

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "tyrel::query_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

fn run_id() -> &'static str {
    RUN_ID.get_or_init(|| std::env::var("TYREL_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string()))
}

/// Query over one type (analyzer lookup).
pub(crate) fn unary_start(query_id: u64, op: &'static str, input: TypeId) {
    query_event!("start", query_id, op, input_type_id = input.0);
}

/// Query relating two types (assignability, constraint checks, completion).
pub(crate) fn relation_start(query_id: u64, op: &'static str, source: TypeId, target: TypeId) {
    query_event!("start", query_id, op, source_type_id = source.0, target_type_id = target.0);
}

/// Query over an argument vector of a definition.
pub(crate) fn vector_start(query_id: u64, op: &'static str, owner: TypeId, arity: usize) {
    query_event!("start", query_id, op, owner_type_id = owner.0, arity);
}

/// `result_type_id` is -1 when the query failed.
pub(crate) fn type_end(query_id: u64, op: &'static str, result_type: Option<TypeId>, cache_hit: bool) {
    let result_type_id = result_type.map_or(-1, |ty| i64::from(ty.0));
    query_event!("end", query_id, op, result_type_id, cache_hit);
}

pub(crate) fn bool_end(query_id: u64, op: &'static str, result: bool) {
    query_event!("end", query_id, op, result);
}
