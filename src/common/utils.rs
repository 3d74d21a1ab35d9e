//! 共通ユーティリティ関数群（URLエンコード/デコード、クエリ変換、Content-Type判定）

use std::collections::{BTreeMap, HashMap};

/// URLエンコーディングのデコード関数
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (from_hex(bytes[i + 1]), from_hex(bytes[i + 2])) {
                result.push(h * 16 + l);
                i += 3;
                continue;
            }
        } else if bytes[i] == b'+' {
            result.push(b' ');
            i += 1;
            continue;
        }
        result.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&result).into_owned()
}

/// 16進数文字をバイト値に変換するヘルパー関数
fn from_hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// クエリ文字列をパースしてURLデコードを行う共通関数
pub fn parse_query_string(query_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if query_string.is_empty() {
        return params;
    }

    for pair in query_string.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let Some(key) = parts.next() {
            let value = parts.next().unwrap_or("");
            params.insert(percent_decode(key), percent_decode(value));
        }
    }

    params
}

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// クエリコンポーネント向けのURLエンコード
/// 非予約文字（英数字と`-_.~`）はそのまま、スペースは`+`、他は`%XX`
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(UPPER_HEX[(b >> 4) as usize] as char);
                out.push(UPPER_HEX[(b & 0x0F) as usize] as char);
            }
        }
    }
    out
}

/// キーと値のペアを正規形のクエリ文字列へエンコードする
/// キーは昇順、同一キーの複数値は出現順を保って`key=value`を繰り返す
pub fn encode_query<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut sorted: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in pairs {
        sorted.entry(key).or_default().push(value);
    }

    let mut out = String::new();
    for (key, values) in sorted {
        for value in values {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&percent_encode(key));
            out.push('=');
            out.push_str(&percent_encode(value));
        }
    }
    out
}

/// 書き込まれたボディの先頭（最大512バイト）からContent-Typeを推定する
///
/// Unicode BOM、マークアップタグ、既知のマジックナンバーを順に照合し、
/// どれにも該当しなければ制御バイトの有無でテキストかバイナリかを決める。
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(512)];

    // Unicode BOM
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return "text/plain; charset=utf-8";
    }
    if data.starts_with(&[0xFE, 0xFF]) {
        return "text/plain; charset=utf-16be";
    }
    if data.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16le";
    }

    // 先頭の空白を読み飛ばしてマークアップを判定
    let ws_len = data
        .iter()
        .take_while(|&&b| matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .count();
    let trimmed = &data[ws_len..];

    const HTML_SIGS: &[&[u8]] = &[
        b"<!DOCTYPE HTML",
        b"<HTML",
        b"<HEAD",
        b"<SCRIPT",
        b"<IFRAME",
        b"<H1",
        b"<DIV",
        b"<FONT",
        b"<TABLE",
        b"<A",
        b"<STYLE",
        b"<TITLE",
        b"<B",
        b"<BODY",
        b"<BR",
        b"<P",
        b"<!--",
    ];
    for sig in HTML_SIGS {
        if matches_html_sig(trimmed, sig) {
            return "text/html; charset=utf-8";
        }
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    // 既知のマジックナンバー
    if data.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if data.starts_with(b"%!PS-Adobe-") {
        return "application/postscript";
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return "image/png";
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.len() >= 14 && data.starts_with(b"RIFF") && &data[8..14] == b"WEBPVP" {
        return "image/webp";
    }
    if data.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        return "application/zip";
    }
    if data.starts_with(&[0x1F, 0x8B, 0x08]) {
        return "application/x-gzip";
    }

    // 制御バイト（HT/LF/FF/CR/ESC以外）を含まなければテキストとみなす
    for &b in data {
        if b <= 0x08 || b == 0x0B || (0x0E..=0x1A).contains(&b) || (0x1C..=0x1F).contains(&b) {
            return "application/octet-stream";
        }
    }
    "text/plain; charset=utf-8"
}

/// HTMLシグネチャとの前方一致（英字は大文字小文字を無視、直後はタグ終端文字）
fn matches_html_sig(data: &[u8], sig: &[u8]) -> bool {
    if data.len() <= sig.len() {
        return false;
    }
    for (i, &s) in sig.iter().enumerate() {
        let mut b = data[i];
        if s.is_ascii_alphabetic() {
            b = b.to_ascii_uppercase();
        }
        if b != s {
            return false;
        }
    }
    matches!(data[sig.len()], b' ' | b'>')
}
