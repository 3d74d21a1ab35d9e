//! エラー型の定義

use thiserror::Error;

/// アダプタのエラー型
#[derive(Error, Debug)]
pub enum Error {
    /// 無効なリクエストボディ（Base64デコード失敗やJSONパース失敗）
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    /// リクエストオブジェクトの構築エラー
    #[error("Failed to build request: {0}")]
    RequestConstruction(String),

    /// ステータスコードが未設定のままレスポンスを確定しようとした
    #[error("response status code not set")]
    StatusNotSet,
}
