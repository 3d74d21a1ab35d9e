//! GateBridge: マネージドHTTPゲートウェイ（AWS Lambda Function URL /
//! API Gateway HTTP API）の背後で素のHTTPハンドラーを動かすためのアダプタ
//!
//! ゲートウェイが届けるイベントペイロードから標準的なHTTPリクエストを復元し、
//! ハンドラーが書き込んだステータス・ヘッダー・ボディをゲートウェイの
//! レスポンス形式へ再変換する。ルーティングや業務ロジックはハンドラー側の責務。

pub mod common;
pub mod error;
pub mod lambda;
pub mod writer;

pub use common::*;
pub use error::*;
pub use writer::*;
