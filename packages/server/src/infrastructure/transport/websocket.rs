//! WebSocket を使った PusherChannel 実装
//!
//! axum の WebSocket を分割した送信側（`SplitSink`）を保持し、
//! テキストフレームの書き込みとクローズを行います。
//! 受信側は UI 層のハンドラーが読み込みループで使用します。

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, stream::SplitSink};

use crate::domain::{MessagePushError, PusherChannel};

pub struct WebSocketChannel {
    sink: SplitSink<WebSocket, Message>,
}

impl WebSocketChannel {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl PusherChannel for WebSocketChannel {
    async fn send_text(&mut self, text: &str) -> Result<(), MessagePushError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    async fn close(&mut self) {
        // 既に切断されている場合のエラーは無視する
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            tracing::debug!("Close frame not sent: {}", e);
        }
        let _ = self.sink.close().await;
    }
}
