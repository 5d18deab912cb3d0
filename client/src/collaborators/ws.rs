//! WebSocket feed gateway
//!
//! Opens the push subscription for one feed and forwards parsed entries and
//! connection-status transitions into a [`FeedSignal`] channel. The history
//! fetch and read receipts go through the notification REST endpoints.

use chrono::Utc;
use futures_util::StreamExt;
use shared::{ConnectionStatus, FeedEntry, FeedKind};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::http::NotificationApi;
use super::{FeedCollaborator, FeedConnection, FeedSignal};
use crate::error::{AppError, AppResult};

/// Some brokers frame pushes as `ALERT [farm-id]: {json}`; cut to the JSON
fn strip_channel_prefix(text: &str) -> &str {
    if text.starts_with('{') {
        return text;
    }
    match text.find('{') {
        Some(idx) => &text[idx..],
        None => text,
    }
}

/// Push gateway for one feed kind
pub struct WsFeedGateway {
    ws_uri: String,
    rest: NotificationApi,
    kind: FeedKind,
}

impl WsFeedGateway {
    pub fn new(ws_uri: impl Into<String>, rest: NotificationApi, kind: FeedKind) -> Self {
        Self {
            ws_uri: ws_uri.into(),
            rest,
            kind,
        }
    }
}

impl<E: FeedEntry> FeedCollaborator<E> for WsFeedGateway {
    async fn connect(&self, user_id: &str, farm_id: &str) -> AppResult<FeedConnection<E>> {
        let url = format!(
            "{}/{}/{}/{}",
            self.ws_uri,
            self.kind.as_str(),
            user_id,
            farm_id
        );
        let (mut socket, _) = connect_async(url)
            .await
            .map_err(|e| AppError::Connectivity(format!("feed connect failed: {e}")))?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            while let Some(message) = socket.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        let payload = strip_channel_prefix(&text);
                        match serde_json::from_str::<E>(payload) {
                            Ok(mut entry) => {
                                entry.stamp_received(Utc::now());
                                if tx.send(FeedSignal::Entry(entry)).await.is_err() {
                                    return;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "discarding malformed feed payload");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "feed socket error");
                        let _ = tx.send(FeedSignal::Status(ConnectionStatus::Error)).await;
                        break;
                    }
                }
            }
            let _ = tx
                .send(FeedSignal::Status(ConnectionStatus::Disconnected))
                .await;
        });

        Ok(FeedConnection { signals: rx })
    }

    async fn history(&self, farm_id: &str) -> AppResult<Vec<E>> {
        match self.kind {
            FeedKind::Weather => Ok(self
                .rest
                .latest_weather(farm_id)
                .await?
                .into_iter()
                .collect()),
            FeedKind::Alerts | FeedKind::Recommendations => {
                self.rest.alert_history(farm_id).await
            }
        }
    }

    async fn mark_read(&self, entry_id: &str) -> AppResult<()> {
        self.rest.mark_read(entry_id).await
    }
}
