//! Mock 串口
//!
//! 每次写入都交给脚本化的应答函数，应答字节进入待读缓冲区；
//! `MockHandle` 与传输共享状态，测试可在传输被会话拿走后检查写入内容。

use crate::{Transport, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

struct MockState {
    writes: Vec<Vec<u8>>,
    pending: VecDeque<u8>,
    responder: Option<Responder>,
    /// 每次 read_available 最多返回的字节数（模拟分段到达）
    chunk_size: Option<usize>,
    closed: bool,
}

/// 模拟串口
pub struct MockTransport {
    name: String,
    state: Arc<Mutex<MockState>>,
}

/// 共享句柄，用于检查/注入
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// 创建不应答的模拟串口
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState {
                writes: Vec::new(),
                pending: VecDeque::new(),
                responder: None,
                chunk_size: None,
                closed: false,
            })),
        }
    }

    /// 设置应答函数：参数为写入的完整帧，返回值进入待读缓冲区
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        self.state.lock().responder = Some(Box::new(responder));
        self
    }

    /// 每次读取最多返回 `n` 字节
    pub fn with_chunk_size(self, n: usize) -> Self {
        self.state.lock().chunk_size = Some(n.max(1));
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl MockHandle {
    /// 所有写入的帧（按顺序）
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// 写入的帧按 UTF-8（有损）转换，便于断言 ASCII 协议
    pub fn writes_lossy(&self) -> Vec<String> {
        self.state
            .lock()
            .writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// 注入设备主动发送的字节
    pub fn push_input(&self, bytes: &[u8]) {
        self.state.lock().pending.extend(bytes.iter().copied());
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed(self.name.clone()));
        }
        state.writes.push(bytes.to_vec());
        if let Some(responder) = state.responder.as_mut() {
            let reply = responder(bytes);
            state.pending.extend(reply);
        }
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed(self.name.clone()));
        }
        let n = state
            .chunk_size
            .map_or(state.pending.len(), |c| c.min(state.pending.len()));
        Ok(state.pending.drain(..n).collect())
    }

    fn close(&mut self) {
        self.state.lock().closed = true;
    }
}
