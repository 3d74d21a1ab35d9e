//! 共通の型定義とユーティリティ

pub mod http;
pub mod traits;
pub mod utils;

pub use self::http::*;
pub use self::traits::*;
