//! 失敗の分類
//!
//! 型ではなくエラーの *文字列* で分類する。sender ごとに元のエラー型は
//! 違っても、最終的にはタスクレコード上の説明文字列になるため。
//!
//! 1. 小文字化
//! 2. terminal indicator を含む -> `Terminal`（先に判定）
//! 3. retryable indicator を含む -> `Retryable`
//! 4. それ以外 -> `Retryable`

use serde::{Deserialize, Serialize};

/// Substrings that mark an error as permanent. Retrying cannot help.
pub const TERMINAL_INDICATORS: &[&str] = &[
    "authentication failed",
    "invalid credentials",
    "permission denied",
    "invalid email",
    "malformed",
    "configuration error",
    "not found",
];

/// Substrings that mark an error as transient.
pub const RETRYABLE_INDICATORS: &[&str] = &[
    "timeout",
    "connection",
    "temporary",
    "network",
    "unavailable",
    "server not ready",
    "try again",
    "rate limit",
    "throttled",
];

/// Operational class of an execution error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient; another attempt may succeed.
    Retryable,

    /// Permanent; stop now.
    Terminal,
}

/// Classify an error description. Pure and deterministic.
pub fn classify(error_description: &str) -> ErrorKind {
    let text = error_description.to_lowercase();

    if TERMINAL_INDICATORS.iter().any(|i| text.contains(i)) {
        return ErrorKind::Terminal;
    }
    if RETRYABLE_INDICATORS.iter().any(|i| text.contains(i)) {
        return ErrorKind::Retryable;
    }
    // 未知のエラーは再試行扱い
    ErrorKind::Retryable
}
