//! HTTP関連の基本型

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Deserialize;

use super::utils::parse_query_string;
use crate::error::Error;

/// ゲートウェイイベントから復元されたHTTPリクエスト
///
/// 1回の呼び出しが専有し、ハンドラーの実行が終われば破棄される。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTPメソッド
    pub method: Method,
    /// 絶対URI（スキーム・ホスト・パス・クエリ）
    pub uri: Uri,
    /// HTTPヘッダー（同名ヘッダーは複数値を保持）
    pub headers: HeaderMap,
    /// リクエストボディ
    pub body: Bytes,
    /// 呼び出し元のIPアドレス
    pub remote_addr: String,
    /// リクエストラインに現れるターゲット文字列
    pub raw_target: String,
}

impl Request {
    /// 新しいリクエストを作成
    pub fn new(method: Method, uri: Uri) -> Self {
        let raw_target = uri.to_string();
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: String::new(),
            raw_target,
        }
    }

    /// ヘッダーを追加（同名ヘッダーには値を追記）
    pub fn with_header(mut self, key: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(key, value);
        self
    }

    /// ボディを設定
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// リクエストパスを取得
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// 指定ヘッダーの最初の値を取得
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    /// クエリ文字列をデコード済みのマップとして取得
    pub fn query_params(&self) -> HashMap<String, String> {
        parse_query_string(self.uri.query().unwrap_or(""))
    }

    /// ボディをJSONとしてパース
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, Error> {
        if self.body.is_empty() {
            return Err(Error::InvalidRequestBody("No request body".to_string()));
        }
        serde_json::from_slice(&self.body).map_err(|e| Error::InvalidRequestBody(e.to_string()))
    }
}
