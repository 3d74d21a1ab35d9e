//! ハンドラーの書き込みを呼び出し単位で記録するResponseWriter実装

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::ApiGatewayV2httpResponse;
use bytes::BytesMut;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use log::debug;

use crate::common::traits::ResponseWriter;
use crate::common::utils::detect_content_type;
use crate::error::Error;

/// ステータス・ヘッダー・ボディをバッファし、最後にゲートウェイ形式の
/// レスポンスへ変換するライター
///
/// 呼び出しごとに新規作成し、複数の呼び出しで共有してはならない。
#[derive(Debug, Default)]
pub struct CaptureWriter {
    status: Option<u16>,
    headers: HeaderMap,
    body: BytesMut,
}

impl CaptureWriter {
    /// 新しいCaptureWriterを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録済みの状態からゲートウェイレスポンスを構築する
    ///
    /// ステータスが一度も設定されていない場合はエラー。ボディがUTF-8として
    /// 妥当ならそのままテキスト、そうでなければBase64エンコードして返す。
    pub fn into_response(self) -> Result<ApiGatewayV2httpResponse, Error> {
        let status = self.status.ok_or(Error::StatusNotSet)?;

        let body_bytes = self.body.freeze();
        let (body, is_base64_encoded) = match std::str::from_utf8(&body_bytes) {
            Ok(text) => (Body::Text(text.to_string()), false),
            Err(_) => (Body::Text(base64::encode(&body_bytes)), true),
        };

        Ok(ApiGatewayV2httpResponse {
            status_code: status as i64,
            headers: HeaderMap::new(),
            multi_value_headers: self.headers,
            body: Some(body),
            is_base64_encoded,
            cookies: Vec::new(),
        })
    }
}

impl ResponseWriter for CaptureWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        // ステータス未設定のままの書き込みは200とみなす
        if self.status.is_none() {
            self.status = Some(200);
        }

        // Content-Typeの推定は最初の書き込みでのみ行う
        if self.body.is_empty() && !self.headers.contains_key(CONTENT_TYPE) {
            let detected = detect_content_type(buf);
            debug!("Detected content type: {}", detected);
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(detected));
        }

        self.body.extend_from_slice(buf);
        buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_defaults_status_to_200() {
        let mut w = CaptureWriter::new();
        assert_eq!(w.write(b"hello"), 5);

        let res = w.into_response().unwrap();
        assert_eq!(res.status_code, 200);
        assert_eq!(res.body, Some(Body::Text("hello".to_string())));
        assert!(!res.is_base64_encoded);
    }

    #[test]
    fn test_explicit_status_preserved() {
        let mut w = CaptureWriter::new();
        w.set_status(404);
        w.write(b"Not Found");

        let res = w.into_response().unwrap();
        assert_eq!(res.status_code, 404);
    }

    #[test]
    fn test_set_status_overwrites_previous_value() {
        let mut w = CaptureWriter::new();
        w.set_status(200);
        w.set_status(503);

        let res = w.into_response().unwrap();
        assert_eq!(res.status_code, 503);
    }

    #[test]
    fn test_content_type_sniffed_on_first_write_only() {
        let mut w = CaptureWriter::new();
        w.write(b"plain text body");
        // 2回目の書き込みがPNGでも判定はやり直されない
        w.write(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

        let res = w.into_response().unwrap();
        let content_types: Vec<_> = res.multi_value_headers.get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(content_types, vec!["text/plain; charset=utf-8"]);
    }

    #[test]
    fn test_preset_content_type_not_overwritten() {
        let mut w = CaptureWriter::new();
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        w.write(br#"{"ok":true}"#);

        let res = w.into_response().unwrap();
        assert_eq!(
            res.multi_value_headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_binary_body_is_base64_encoded() {
        let payload: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0xC3, 0x28];
        let mut w = CaptureWriter::new();
        w.write(payload);

        let res = w.into_response().unwrap();
        assert!(res.is_base64_encoded);
        assert_eq!(
            res.multi_value_headers.get(CONTENT_TYPE).unwrap(),
            "image/png"
        );
        // Base64をデコードすると元のバイト列へ戻る
        match res.body.unwrap() {
            Body::Text(encoded) => assert_eq!(base64::decode(&encoded).unwrap(), payload),
            other => panic!("unexpected body variant: {:?}", other),
        }
    }

    #[test]
    fn test_finalize_without_any_write_fails() {
        let w = CaptureWriter::new();
        assert!(matches!(w.into_response(), Err(Error::StatusNotSet)));
    }

    #[test]
    fn test_custom_headers_become_multi_value_headers() {
        let mut w = CaptureWriter::new();
        w.headers_mut().append(
            "x-request-id".parse::<http::HeaderName>().unwrap(),
            HeaderValue::from_static("abc-123"),
        );
        w.set_status(204);

        let res = w.into_response().unwrap();
        assert_eq!(
            res.multi_value_headers.get("x-request-id").unwrap(),
            "abc-123"
        );
        assert!(res.headers.is_empty());
    }
}
