//! UseCase: チャット行のブロードキャスト
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastUseCase::execute() メソッド
//! - 送信者の表示名で整形した行を、送信者を含む全接続へ配信する処理
//!
//! ### なぜこのテストが必要か
//! - 送信者にもエコーされることを保証
//! - 一部の接続への配信失敗が他の接続への配信を妨げないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 接続への配信
//! - 異常系：送信者が登録されていない
//! - エッジケース：配信先の一部が切断済み

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionRegistry, MessageContent},
    infrastructure::dto::websocket::chat_line,
};

use super::error::BroadcastError;

/// 配信結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// キューへの投入に成功した接続数
    pub delivered: usize,
    /// 配信に失敗した接続
    pub failed: Vec<ConnectionId>,
}

/// ブロードキャストのユースケース
#[derive(Clone)]
pub struct BroadcastUseCase {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastUseCase {
    /// 新しい BroadcastUseCase を作成
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// ブロードキャストを実行
    ///
    /// レジストリのスナップショットはロック内で一度だけ取得し、
    /// 配信自体はロック解放後に行います。
    ///
    /// # Returns
    ///
    /// * `Ok(BroadcastReport)` - 配信結果（部分的な失敗を含む）
    /// * `Err(BroadcastError)` - 送信者が登録されていない
    pub fn execute(
        &self,
        content: &MessageContent,
        origin: &ConnectionId,
    ) -> Result<BroadcastReport, BroadcastError> {
        let Some(snapshot) = self.registry.broadcast_snapshot(origin) else {
            tracing::error!("Error: sender {} not found in registry", origin);
            return Err(BroadcastError::OriginNotRegistered(*origin));
        };

        let line = chat_line(snapshot.origin_username.as_str(), content.as_str());
        tracing::info!(
            "Broadcasting message. sender: {}, total clients: {}",
            snapshot.origin_username,
            snapshot.recipients.len()
        );

        let mut report = BroadcastReport::default();
        for recipient in snapshot.recipients {
            match recipient.handle.send_text(line.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        "Error broadcasting message to {} ({}): {}",
                        recipient.username,
                        recipient.id,
                        e
                    );
                    report.failed.push(recipient.id);
                }
            }
        }
        Ok(report)
    }
}
