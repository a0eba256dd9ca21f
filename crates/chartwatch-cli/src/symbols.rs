//! Stock symbol loading
//!
//! Symbols come from `stock_symbols.txt` (one per line), then the
//! `STOCK_SYMBOLS` env var (comma-separated), then the built-in default.

use std::path::Path;
use tracing::{info, warn};

/// Symbols file read when present
pub const SYMBOLS_FILE: &str = "stock_symbols.txt";

/// Symbol used when nothing else is configured
const DEFAULT_SYMBOL: &str = "QBTS";

/// Load the symbol list
pub fn load_symbols(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let symbols: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            if symbols.is_empty() {
                warn!("no symbols found in {}, using default {DEFAULT_SYMBOL}", path.display());
                vec![DEFAULT_SYMBOL.to_string()]
            } else {
                info!(
                    "loaded {} symbols from {}: {}",
                    symbols.len(),
                    path.display(),
                    symbols.join(", ")
                );
                symbols
            }
        }
        Err(_) => {
            warn!(
                "{} not found, falling back to STOCK_SYMBOLS env var",
                path.display()
            );
            from_env()
        }
    }
}

fn from_env() -> Vec<String> {
    let symbols: Vec<String> = std::env::var("STOCK_SYMBOLS")
        .unwrap_or_else(|_| DEFAULT_SYMBOL.to_string())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if symbols.is_empty() {
        vec![DEFAULT_SYMBOL.to_string()]
    } else {
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SYMBOLS_FILE);
        std::fs::write(&path, "QBTS\n\n  AAPL  \nTSLA\n").unwrap();

        let symbols = load_symbols(&path);
        assert_eq!(symbols, vec!["QBTS", "AAPL", "TSLA"]);
    }

    #[test]
    fn test_empty_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SYMBOLS_FILE);
        std::fs::write(&path, "\n\n").unwrap();

        assert_eq!(load_symbols(&path), vec!["QBTS"]);
    }

    #[test]
    fn test_missing_file_uses_env() {
        // SAFETY: test-only env mutation
        unsafe {
            std::env::set_var("STOCK_SYMBOLS", "NVDA, AMD");
        }
        let dir = tempfile::tempdir().unwrap();
        let symbols = load_symbols(&dir.path().join(SYMBOLS_FILE));
        assert_eq!(symbols, vec!["NVDA", "AMD"]);
        // SAFETY: test-only env mutation
        unsafe {
            std::env::remove_var("STOCK_SYMBOLS");
        }
    }
}
