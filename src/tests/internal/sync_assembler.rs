//! 同步组装器测试
//!
//! 测试项：
//! - 乱序写入后内容与日志一致
//! - 多线程并发写入
//! - 失败写入的计数与最近错误槽位（后写覆盖先写）
//! - 偏移溢出时拒绝写入

use std::sync::Arc;
use std::thread;

use bytes::Bytes;

use crate::assembler::{FileAssembler, SyncFileAssembler};
use crate::assembly_log::AssemblyLog;
use crate::errors::AssemblyError;
use crate::range::RangeStore;
use crate::tests::{random_payload, shuffled_chunks, workspace};

fn open_assembler(part: &std::path::Path, size: i64) -> SyncFileAssembler {
    let log = Arc::new(AssemblyLog::new(part.with_extension("binlog")));
    log.init_file(0, size - 1, b"sync").unwrap();
    let mut assembler = SyncFileAssembler::new(part, log);
    assembler.init().unwrap();
    assembler
}

#[test]
fn out_of_order_writes_complete_file() {
    let ws = workspace("data.part");
    let payload = random_payload(1000, 1);
    let assembler = open_assembler(&ws.target, 1000);

    for (offset, len) in shuffled_chunks(1000, 64, 2) {
        assembler.write(
            Bytes::copy_from_slice(&payload[offset..offset + len]),
            offset as i64,
        );
    }

    let result = assembler.result().unwrap();
    assert!(result.is_complete());
    assert!(result.is_drained());
    assert_eq!(result.submitted, 16);
    assert_eq!(result.completed, 16);
    assert!(result.last_error.is_none());

    assembler.flush().unwrap();
    assembler.close().unwrap();
    assert_eq!(std::fs::read(&ws.target).unwrap(), payload);
}

#[test]
fn partial_writes_leave_gaps() {
    let ws = workspace("data.part");
    let assembler = open_assembler(&ws.target, 100);

    assembler.write(Bytes::from(vec![1u8; 10]), 0);
    assembler.write(Bytes::from(vec![2u8; 10]), 50);

    let result = assembler.result().unwrap();
    assert_eq!(result.missing_ranges.get_ranges(), "10-49,60-99");
    assert!(!result.is_complete());
}

#[test]
fn empty_chunk_is_ignored() {
    let ws = workspace("data.part");
    let assembler = open_assembler(&ws.target, 10);

    assembler.write(Bytes::new(), 0);
    let result = assembler.result().unwrap();
    assert_eq!(result.submitted, 0);
    assert_eq!(result.missing_ranges.get_ranges(), "0-9");
}

#[test]
fn concurrent_writers() {
    let ws = workspace("data.part");
    let payload = Arc::new(random_payload(4096, 3));
    let assembler = Arc::new(open_assembler(&ws.target, 4096));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let assembler = Arc::clone(&assembler);
            let payload = Arc::clone(&payload);
            thread::spawn(move || {
                for (offset, len) in shuffled_chunks(4096, 128, worker) {
                    // 各线程只写自己负责的块
                    if (offset / 128) % 4 != worker as usize {
                        continue;
                    }
                    assembler.write(
                        Bytes::copy_from_slice(&payload[offset..offset + len]),
                        offset as i64,
                    );
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let result = assembler.result().unwrap();
    assert!(result.is_complete());
    assert_eq!(result.completed, 32);
    assert_eq!(assembler.progress().bytes_written, 4096);
    assembler.close().unwrap();
    assert_eq!(std::fs::read(&ws.target).unwrap(), *payload);
}

#[test]
fn failed_write_is_reported_once() {
    let ws = workspace("data.part");
    let assembler = open_assembler(&ws.target, 10);

    assembler.write(Bytes::from_static(b"abc"), -3);

    let result = assembler.result().unwrap();
    assert!(matches!(
        result.last_error,
        Some(AssemblyError::InvalidRange { low: -3, high: -1 })
    ));
    assert_eq!(result.submitted, 0);
    assert_eq!(result.completed, 0);
    assert_eq!(assembler.progress().failed, 1);

    // result() 取走错误后槽位清空
    assert!(assembler.result().unwrap().last_error.is_none());
}

#[test]
fn later_failure_overwrites_earlier() {
    let ws = workspace("data.part");
    let assembler = open_assembler(&ws.target, 10);
    assembler.close().unwrap();

    assembler.write(Bytes::from_static(b"abc"), -3);
    assembler.write(Bytes::from_static(b"abc"), 0);

    let result = assembler.result().unwrap();
    assert!(matches!(
        result.last_error,
        Some(AssemblyError::AssemblerClosed)
    ));
    // 槽位只保留一个错误，计数仍然完整
    assert_eq!(assembler.progress().failed, 2);
}

#[test]
fn resume_keeps_existing_bytes() {
    let ws = workspace("data.part");
    let payload = random_payload(200, 4);
    {
        let assembler = open_assembler(&ws.target, 200);
        assembler.write(Bytes::copy_from_slice(&payload[..100]), 0);
        assembler.close().unwrap();
    }

    let assembler = open_assembler(&ws.target, 200);
    assert_eq!(
        assembler.result().unwrap().missing_ranges.get_ranges(),
        "100-199"
    );
    assembler.write(Bytes::copy_from_slice(&payload[100..]), 100);
    assert!(assembler.result().unwrap().is_complete());
    assembler.close().unwrap();
    assert_eq!(std::fs::read(&ws.target).unwrap(), payload);
}

#[test]
fn chunk_past_integer_edge_is_rejected() {
    let ws = workspace("data.part");
    let assembler = open_assembler(&ws.target, 10);

    assembler.write(Bytes::from_static(b"ab"), i64::MAX);

    let result = assembler.result().unwrap();
    assert_eq!(result.submitted, 0);
    assert!(matches!(
        result.last_error,
        Some(AssemblyError::InvalidRange {
            low: i64::MAX,
            high: i64::MAX
        })
    ));
    assert_eq!(result.missing_ranges.get_ranges(), "0-9");
}
