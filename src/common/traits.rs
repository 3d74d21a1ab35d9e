//! コアトレイト定義（Handler、ResponseWriter）

use http::HeaderMap;

use super::http::Request;

/// ハンドラーの特性
///
/// 呼び出し1回につきRequestを1つ受け取り、ResponseWriterへ書き込む。
/// ハンドラーは確定まで同期的に実行され、中断点を持たない。
pub trait Handler: Send + Sync {
    /// リクエストを処理し、レスポンスをwへ書き込む
    fn serve(&self, req: Request, w: &mut dyn ResponseWriter);
}

/// 関数・クロージャをそのままハンドラーとして扱えるようにする
impl<F> Handler for F
where
    F: Fn(Request, &mut dyn ResponseWriter) + Send + Sync,
{
    fn serve(&self, req: Request, w: &mut dyn ResponseWriter) {
        self(req, w)
    }
}

/// レスポンス書き込みの特性
///
/// ヘッダー取得・ステータス設定・ボディ書き込みの3操作のみを公開する。
pub trait ResponseWriter {
    /// レスポンスヘッダーの可変参照を取得（確定前であればいつでも変更可能）
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// ステータスコードを設定（以前の値は上書きされる）
    fn set_status(&mut self, status: u16);

    /// ボディへ追記し、書き込んだバイト数を返す
    fn write(&mut self, buf: &[u8]) -> usize;
}
