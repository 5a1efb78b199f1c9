//! Audit Store - 인메모리 감사 로그 + 비동기 미러
//!
//! 엔트리는 하나의 mutex 아래에서 순서대로 추가되고, `max_memory`를 넘으면
//! 가장 오래된 것부터 제거됩니다. 미러가 설정되어 있으면 같은 lock 안에서
//! 채널에 넣기 때문에 미러 순서는 항상 추가 순서와 같습니다.
//!
//! 미러 채널은 `mirror_capacity` 크기의 bounded 채널입니다. `append`는
//! `try_send`만 하므로 싱크가 느려도 막히지 않고, 채널이 가득 차면 그 엔트리는
//! 미러에서 빠집니다 (메모리에는 남고 `mirror_dropped`에 집계).
//!
//! ```text
//! append() ──► [Mutex<VecDeque>] ──► mpsc(capacity) ──► "audit-mirror" thread ──► AuditSink
//! ```

use super::sink::{AuditSink, JsonlFileSink};
use super::types::{AuditEntry, AuditId, AuditQuery, AuditStatistics, EventType};
use crate::config::AuditConfig;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, error::TrySendError, Sender};
use tracing::{debug, info, warn};

struct StoreState {
    entries: VecDeque<AuditEntry>,
    mirror: Option<Sender<AuditEntry>>,
}

/// 감사 로그 저장소
///
/// 프로세스당 하나를 만들어 `Arc<AuditStore>`로 공유합니다.
///
/// ## 사용법
///
/// ```ignore
/// use steward_foundation::audit::{AuditStore, EventType};
/// use steward_foundation::config::AuditConfig;
///
/// let store = AuditStore::new(&AuditConfig::default().with_mirror("audit.jsonl"))?;
/// store.append("payment_failed", EventType::TOOL_CALL, json!({"tool": "get_payment_exception"}));
///
/// let recent = store.list_entries(Some("payment_failed"), 10);
/// ```
pub struct AuditStore {
    state: Mutex<StoreState>,
    writer: Mutex<Option<JoinHandle<()>>>,
    mirror_dropped: AtomicU64,
    max_memory: usize,
    retention_days: u32,
}

impl AuditStore {
    /// 설정으로 생성 (`mirror_path`가 있으면 JSONL 미러 사용)
    pub fn new(config: &AuditConfig) -> Result<Self> {
        match config.mirror_path {
            Some(ref path) => {
                info!(path = %path.display(), "Audit mirror enabled");
                Self::with_sink(config, Box::new(JsonlFileSink::new(path)))
            }
            None => Ok(Self::without_mirror(config)),
        }
    }

    /// 메모리 전용 저장소 (기본 설정)
    pub fn in_memory() -> Self {
        Self::without_mirror(&AuditConfig::default())
    }

    fn without_mirror(config: &AuditConfig) -> Self {
        Self {
            state: Mutex::new(StoreState {
                entries: VecDeque::new(),
                mirror: None,
            }),
            writer: Mutex::new(None),
            mirror_dropped: AtomicU64::new(0),
            max_memory: config.max_memory.max(1),
            retention_days: config.retention_days,
        }
    }

    /// 임의의 싱크로 미러링하는 저장소
    pub fn with_sink(config: &AuditConfig, sink: Box<dyn AuditSink>) -> Result<Self> {
        let (tx, handle) = spawn_mirror(sink, config.mirror_capacity)?;
        let store = Self::without_mirror(config);
        store.state.lock().mirror = Some(tx);
        *store.writer.lock() = Some(handle);
        Ok(store)
    }

    // ========================================================================
    // Append
    // ========================================================================

    /// 엔트리 추가
    ///
    /// 메모리에는 항상 성공하며 미러 때문에 막히지 않습니다. 미러 쓰기는
    /// writer 스레드에서 일어나며 실패해도 여기로 전파되지 않습니다.
    pub fn append(
        &self,
        agent_id: &str,
        event_type: impl Into<EventType>,
        payload: Value,
    ) -> AuditEntry {
        let entry = AuditEntry::new(agent_id, event_type, payload);

        let mut state = self.state.lock();
        state.entries.push_back(entry.clone());
        while state.entries.len() > self.max_memory {
            state.entries.pop_front();
        }

        if let Some(ref tx) = state.mirror {
            match tx.try_send(entry.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    let dropped = self.mirror_dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(entry_id = %entry.id, dropped, "Audit mirror is backed up, entry kept in memory only");
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(entry_id = %entry.id, "Audit mirror is closed, entry kept in memory only");
                }
            }
        }
        drop(state);

        debug!(
            entry_id = %entry.id,
            agent_id = %entry.agent_id,
            event_type = %entry.event_type,
            "Audit entry appended"
        );
        entry
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// 최근 엔트리 (최신순), 에이전트 필터 선택
    pub fn list_entries(&self, agent_id: Option<&str>, limit: usize) -> Vec<AuditEntry> {
        let state = self.state.lock();
        state
            .entries
            .iter()
            .rev()
            .filter(|e| agent_id.map_or(true, |id| e.agent_id == id))
            .take(limit)
            .cloned()
            .collect()
    }

    /// 쿼리 조회 (최신순)
    pub fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        let state = self.state.lock();
        state
            .entries
            .iter()
            .rev()
            .filter(|e| query.matches(e))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// ID로 조회
    pub fn get(&self, id: &AuditId) -> Option<AuditEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .find(|e| &e.id == id)
            .cloned()
    }

    pub fn statistics(&self) -> AuditStatistics {
        AuditStatistics::from_entries(self.state.lock().entries.iter())
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn max_memory(&self) -> usize {
        self.max_memory
    }

    /// 미러 채널이 가득 차서 미러에 쓰지 못한 엔트리 수
    pub fn mirror_dropped(&self) -> u64 {
        self.mirror_dropped.load(Ordering::Relaxed)
    }

    /// 설정된 보관 기간 (일)
    ///
    /// 자동 제거는 개수 기준이며 이 값으로는 아무것도 지우지 않습니다.
    /// 시간 기준 제거는 `purge_older_than`을 명시적으로 호출해야 합니다.
    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// `now - days`보다 오래된 인메모리 엔트리 제거, 제거된 개수 반환
    ///
    /// 미러 파일은 append-only이므로 건드리지 않습니다.
    pub fn purge_older_than(&self, days: u32, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(i64::from(days));
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|e| e.timestamp >= cutoff);
        let removed = before - state.entries.len();
        drop(state);

        if removed > 0 {
            info!(removed, days, "Purged old audit entries");
        }
        removed
    }

    /// 기존 JSONL 미러에서 메모리를 복원, 읽어들인 개수 반환
    ///
    /// 복원된 엔트리는 다시 미러링하지 않습니다. 파일의 엔트리는 이미 메모리에
    /// 있는 엔트리보다 앞(더 오래된 쪽)에 놓이며, `max_memory`를 넘으면
    /// 가장 오래된 것부터 버립니다.
    pub fn replay(&self, path: impl AsRef<Path>) -> Result<usize> {
        let loaded = JsonlFileSink::read_entries(path.as_ref())?;
        let count = loaded.len();

        let mut state = self.state.lock();
        let live = std::mem::take(&mut state.entries);
        let mut entries: VecDeque<AuditEntry> = loaded.into();
        entries.extend(live);
        while entries.len() > self.max_memory {
            entries.pop_front();
        }
        state.entries = entries;
        drop(state);

        info!(path = %path.as_ref().display(), count, "Replayed audit log");
        Ok(count)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// 미러 채널을 닫고 writer 스레드가 남은 엔트리를 다 쓸 때까지 기다린다
    ///
    /// 여러 번 호출해도 안전하며 `Drop`에서도 호출됩니다. 이후의 `append`는
    /// 메모리에만 기록됩니다.
    pub fn shutdown(&self) {
        let sender = self.state.lock().mirror.take();
        drop(sender);

        if let Some(handle) = self.writer.lock().take() {
            if handle.join().is_err() {
                warn!("Audit mirror thread panicked");
            }
        }
    }
}

impl Drop for AuditStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AuditStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AuditStore")
            .field("entries", &state.entries.len())
            .field("mirrored", &state.mirror.is_some())
            .field("mirror_dropped", &self.mirror_dropped())
            .field("max_memory", &self.max_memory)
            .field("retention_days", &self.retention_days)
            .finish()
    }
}

/// writer는 런타임 밖의 전용 스레드에서 `blocking_recv`로 돕니다.
/// 동기 호출자와 tokio 호출자 모두에서 같은 방식으로 동작합니다.
fn spawn_mirror(
    mut sink: Box<dyn AuditSink>,
    capacity: usize,
) -> Result<(Sender<AuditEntry>, JoinHandle<()>)> {
    let (tx, mut rx) = mpsc::channel::<AuditEntry>(capacity.max(1));

    let handle = std::thread::Builder::new()
        .name("audit-mirror".to_string())
        .spawn(move || {
            while let Some(entry) = rx.blocking_recv() {
                if let Err(e) = sink.write(&entry) {
                    warn!(entry_id = %entry.id, error = %e, "Audit mirror write failed");
                }
            }
            if let Err(e) = sink.flush() {
                warn!(error = %e, "Audit mirror flush failed");
            }
            debug!("Audit mirror stopped");
        })?;

    Ok((tx, handle))
}
