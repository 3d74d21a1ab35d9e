use http::header::CONTENT_TYPE;
use http::HeaderValue;
use log::info;

use gatebridge::common::{Request, ResponseWriter};

// サンプルのハンドラー
// ルーティングはアダプタの責務ではないため、ハンドラー内でパスを見て分岐する
fn sample_handler(req: Request, w: &mut dyn ResponseWriter) {
    match req.path() {
        "/health" => {
            let body = serde_json::json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
            });
            w.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            w.write(body.to_string().as_bytes());
        }
        "/echo" => {
            info!("Echoing {} bytes from {}", req.body.len(), req.remote_addr);
            if let Some(content_type) = req.header("content-type") {
                if let Ok(value) = HeaderValue::from_str(content_type) {
                    w.headers_mut().insert(CONTENT_TYPE, value);
                }
            }
            w.write(&req.body);
        }
        _ => {
            w.set_status(404);
            w.write(b"Not Found");
        }
    }
}

#[tokio::main]
async fn main() {
    // ロガーの初期化
    env_logger::init();

    info!("Starting gatebridge application");

    if let Err(e) = gatebridge::lambda::run_lambda(sample_handler).await {
        eprintln!("Lambda error: {}", e);
        std::process::exit(1);
    }
}
