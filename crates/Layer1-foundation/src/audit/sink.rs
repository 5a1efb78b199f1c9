//! Audit Sink - 감사 로그 영구 미러
//!
//! 인메모리 저장소와 별도로 엔트리를 append-only로 기록하는 대상입니다.
//! 미러 쓰기 실패는 호출자에게 전파되지 않습니다 (AuditStore 참고).

use super::types::AuditEntry;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// 감사 로그 미러 대상
///
/// 전용 writer 스레드 하나가 소유하므로 `Sync`는 필요 없습니다.
pub trait AuditSink: Send {
    /// 엔트리 하나 기록
    fn write(&mut self, entry: &AuditEntry) -> Result<()>;

    /// 버퍼 비우기
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// JsonlFileSink
// ============================================================================

/// 한 줄에 엔트리 하나씩 JSON으로 기록하는 파일 싱크
pub struct JsonlFileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 첫 쓰기 시점에 파일을 연다 (상위 디렉토리 생성)
    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.writer = Some(BufWriter::new(file));
        }

        self.writer
            .as_mut()
            .ok_or_else(|| Error::Internal("audit mirror writer unavailable".to_string()))
    }

    /// JSONL 파일의 엔트리를 순서대로 읽는다
    ///
    /// 파싱할 수 없는 줄은 건너뛰고 `warn!`으로 남깁니다.
    pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<AuditEntry>> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed audit line"
                ),
            }
        }

        Ok(entries)
    }
}

impl AuditSink for JsonlFileSink {
    fn write(&mut self, entry: &AuditEntry) -> Result<()> {
        let line = serde_json::to_string(entry)?;
        let writer = self.writer()?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        // 프로세스가 죽어도 이미 기록된 줄은 남도록 매번 flush
        writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
