//! ゲートウェイイベントと標準リクエスト/レスポンスの相互変換

use std::sync::Arc;

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method, Uri};
use lambda_runtime::{service_fn, Error as LambdaError, LambdaEvent};
use log::{error, info, warn};

use crate::common::traits::Handler;
use crate::common::utils::encode_query;
use crate::common::Request;
use crate::error::Error;
use crate::writer::CaptureWriter;

/// 内部失敗時に返す固定の500レスポンス
pub fn internal_server_error_response() -> ApiGatewayV2httpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    ApiGatewayV2httpResponse {
        status_code: 500,
        headers: HeaderMap::new(),
        multi_value_headers: headers,
        body: Some(Body::Text(r#"{"errorCode":"500"}"#.to_string())),
        is_base64_encoded: false,
        cookies: Vec::new(),
    }
}

/// ゲートウェイイベントから標準のRequestへ変換
pub fn request_for_event(event: ApiGatewayV2httpRequest) -> Result<Request, Error> {
    // ボディの変換（Base64指定時はデコード必須、失敗なら呼び出しを中断）
    let body = match event.body {
        Some(body_str) => {
            if event.is_base64_encoded {
                match base64::decode(&body_str) {
                    Ok(bytes) => Bytes::from(bytes),
                    Err(e) => {
                        warn!("Base64 decode error: {}", e);
                        return Err(Error::InvalidRequestBody(format!(
                            "invalid base64-encoded body: {}",
                            e
                        )));
                    }
                }
            } else {
                Bytes::from(body_str.into_bytes())
            }
        }
        None => Bytes::new(),
    };

    // パスの解決（rawPath優先、なければコンテキスト側のパス）
    let mut path = match event.raw_path {
        Some(ref p) if !p.is_empty() => p.clone(),
        _ => event.request_context.http.path.clone().unwrap_or_default(),
    };
    if !path.starts_with('/') {
        path.insert(0, '/');
    }

    // ホストの解決（スキームは常にhttps、ドメイン名が空ならlocalhost）
    let mut host = event.request_context.domain_name.clone().unwrap_or_default();
    if host.is_empty() {
        host = "localhost".to_string();
    }
    if let Some(port) = event
        .headers
        .get("x-forwarded-port")
        .and_then(|v| v.to_str().ok())
    {
        host = format!("{}:{}", host, port);
    }

    // クエリの解決（rawQueryString優先、なければデコード済みパラメータを再エンコード）
    let mut path_and_query = path;
    if let Some(raw_query) = event.raw_query_string.as_deref().filter(|q| !q.is_empty()) {
        path_and_query.push('?');
        path_and_query.push_str(raw_query);
    } else {
        let encoded = encode_query(event.query_string_parameters.iter());
        if !encoded.is_empty() {
            path_and_query.push('?');
            path_and_query.push_str(&encoded);
        }
    }

    let uri = Uri::builder()
        .scheme("https")
        .authority(host.as_str())
        .path_and_query(path_and_query.as_str())
        .build()
        .map_err(|e| Error::RequestConstruction(e.to_string()))?;

    // メソッドは元の大文字小文字に関わらず大文字へ正規化
    let method = Method::from_bytes(
        event
            .request_context
            .http
            .method
            .as_str()
            .to_uppercase()
            .as_bytes(),
    )
    .map_err(|e| Error::RequestConstruction(e.to_string()))?;

    // ヘッダーの変換
    // ゲートウェイは同名ヘッダーをカンマ連結した単一値で届けるため分割して復元する。
    // User-Agentだけは値自体にカンマを含み得るので分割しない。
    let mut headers = HeaderMap::new();
    for (name, value) in event.headers.iter() {
        if let Ok(value_str) = value.to_str() {
            if *name == USER_AGENT {
                headers.append(name.clone(), value.clone());
            } else {
                for part in value_str.split(',') {
                    if let Ok(v) = HeaderValue::from_str(part.trim_matches(' ')) {
                        headers.append(name.clone(), v);
                    }
                }
            }
        }
    }

    let mut request = Request::new(method, uri);
    request.headers = headers;
    request.body = body;
    request.remote_addr = event
        .request_context
        .http
        .source_ip
        .clone()
        .unwrap_or_default();

    Ok(request)
}

/// イベント1件を処理してレスポンスペイロードを生成する
///
/// 変換または確定に失敗した場合も常に利用可能なペイロードを返し、
/// 失敗原因はエラー値として併せて返す（破棄しない）。
pub fn handle_event<H>(
    handler: &H,
    event: ApiGatewayV2httpRequest,
) -> (ApiGatewayV2httpResponse, Option<Error>)
where
    H: Handler + ?Sized,
{
    let req = match request_for_event(event) {
        Ok(req) => req,
        Err(e) => {
            error!("Request conversion error: {}", e);
            return (internal_server_error_response(), Some(e));
        }
    };
    info!("Received request: {} {}", req.method, req.path());

    let mut writer = CaptureWriter::new();
    handler.serve(req, &mut writer);

    match writer.into_response() {
        Ok(response) => (response, None),
        Err(e) => {
            error!("Response finalization error: {}", e);
            (internal_server_error_response(), Some(e))
        }
    }
}

/// ハンドラーをLambda関数として実行
pub async fn run_lambda<H>(handler: H) -> Result<(), LambdaError>
where
    H: Handler + 'static,
{
    info!("Starting Lambda handler");

    let handler = Arc::new(handler);

    let service = service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| {
        let handler = handler.clone();
        async move {
            let (event, _context) = event.into_parts();
            match handle_event(handler.as_ref(), event) {
                (response, None) => Ok(response),
                (_, Some(e)) => Err(LambdaError::from(e)),
            }
        }
    });

    lambda_runtime::run(service).await?;

    Ok(())
}
