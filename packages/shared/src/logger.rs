//! Logger setup shared by the Campfire binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for a binary.
///
/// Binary names use hyphens while tracing targets use the crate path,
/// so `campfire-server` becomes `campfire_server`.
pub fn default_directive(bin_name: &str, level: &str) -> String {
    let target = bin_name.replace('-', "_");
    if target == "campfire_server" {
        format!("{target}={level},tower_http={level}")
    } else {
        format!("{target}={level},campfire_server={level},tower_http={level}")
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the default directive.
pub fn setup_logger(bin_name: &str, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(bin_name, level)));

    // A second initialization (e.g. from tests) is not an error worth reporting.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_for_server_binary() {
        // テスト項目: サーバーバイナリ名からフィルタ指定を組み立てられる
        // when (操作):
        let directive = default_directive("campfire-server", "debug");

        // then (期待する結果):
        assert_eq!(directive, "campfire_server=debug,tower_http=debug");
    }

    #[test]
    fn test_default_directive_for_other_binary() {
        // テスト項目: 他のバイナリでもサーバークレートのログが出力される
        // when (操作):
        let directive = default_directive("campfire-tool", "info");

        // then (期待する結果):
        assert_eq!(
            directive,
            "campfire_tool=info,campfire_server=info,tower_http=info"
        );
    }
}
