use colored::Colorize;
use fleetpush_build::BuildError;
use fleetpush_config::ConfigError;
use fleetpush_core::{CatalogError, PlanError};
use thiserror::Error;

/// 使い方の1行表示
pub const USAGE: &str = "Usage: fleetpush [--<SERVICE>]... [--target <PLATFORM>] [--local <HOST> <PORT> [--create-registry]]";

/// 実行全体のエラー。終了コードはここでのみ決める。
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl AppError {
    /// プロセスの終了コード
    ///
    /// - 0: `--help` / `--version`
    /// - 2: 使い方・カタログ・設定の誤り（エンジンは未実行）
    /// - 3: レジストリへのログイン失敗
    /// - 1: エンジンのコマンド失敗
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Usage(e) => u8::try_from(e.exit_code()).unwrap_or(2),
            AppError::Plan(_) | AppError::Catalog(_) | AppError::Config(_) => 2,
            AppError::Build(BuildError::LoginFailed { .. }) => 3,
            AppError::Build(_) => 1,
        }
    }

    /// エラーをオペレーター向けに表示
    pub fn report(&self) {
        match self {
            AppError::Usage(e) => {
                // clap 自身の書式（help/version は stdout、エラーは stderr）
                let _ = e.print();
            }
            AppError::Plan(e) => {
                eprintln!("{} {}", "✗".red().bold(), e);
                eprintln!();
                eprintln!("{}", USAGE);
            }
            AppError::Build(e) => {
                eprintln!();
                eprintln!("{} {}", "✗".red().bold(), e.user_message());
            }
            other => {
                eprintln!("{} {}", "✗".red().bold(), other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn test_exit_codes() {
        let usage = crate::cli::Cli::command().error(ErrorKind::InvalidValue, "bad");
        assert_eq!(AppError::from(usage).exit_code(), 2);

        let plan = PlanError::UnknownSelectors(vec!["typo".to_string()]);
        assert_eq!(AppError::from(plan).exit_code(), 2);

        assert_eq!(
            AppError::from(ConfigError::CredentialsNotFound).exit_code(),
            2
        );

        let login = BuildError::LoginFailed {
            registry: "r".to_string(),
            message: "denied".to_string(),
        };
        assert_eq!(AppError::from(login).exit_code(), 3);

        let failed = BuildError::CommandFailed {
            command: "docker push r/x".to_string(),
            code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(AppError::from(failed).exit_code(), 1);
    }
}
