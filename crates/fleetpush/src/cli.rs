//! コマンドライン引数のパース
//!
//! 固定オプション（`--target`, `--local` など）は clap で、
//! カタログのエントリを指定する `--<name>` フラグはセレクタとして分離して扱う。
//! 引数列は起動時に一度だけ走査する。

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use fleetpush_core::Platform;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fleetpush", version)]
#[command(
    about = "サービスのイメージをまとめてビルドし、レジストリに公開する",
    long_about = None
)]
#[command(
    override_usage = "fleetpush [--<SERVICE>]... [--target <PLATFORM>] [--local <HOST> <PORT> [--create-registry]]"
)]
#[command(
    after_help = "カタログのエントリは --<SERVICE> で個別に指定できます（複数可）。\n\
                  一致するエントリがなければカタログ全体をビルドします。"
)]
pub struct Cli {
    /// クロスビルド対象のプラットフォーム（省略時はホストのアーキテクチャでネイティブビルド）
    #[arg(long, value_name = "PLATFORM", value_parser = parse_platform)]
    pub target: Option<Platform>,

    /// 認証なしのローカルレジストリ <HOST> <PORT> に公開する
    #[arg(long, num_args = 2, value_names = ["HOST", "PORT"])]
    pub local: Option<Vec<String>>,

    /// ローカルレジストリコンテナを作り直してから公開する
    #[arg(long, requires = "local")]
    pub create_registry: bool,

    /// 認証情報ファイル (環境変数 FLEETPUSH_CREDENTIALS でも指定可)
    #[arg(long, value_name = "PATH", conflicts_with = "local")]
    pub credentials: Option<PathBuf>,

    /// カタログファイル (環境変数 FLEETPUSH_CATALOG でも指定可)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// docker 互換のコンテナエンジン
    #[arg(long, value_name = "PROGRAM", env = "FLEETPUSH_ENGINE", default_value = "docker")]
    pub engine: String,

    /// カタログに存在しない --<SERVICE> フラグをエラーにする
    #[arg(long)]
    pub strict: bool,

    /// コマンドを実行せずに表示する
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    value.parse::<Platform>().map_err(|e| e.to_string())
}

impl Cli {
    /// `--local <HOST> <PORT>` を取り出す
    pub fn local_registry(&self) -> Result<Option<(String, u16)>, clap::Error> {
        let Some(values) = &self.local else {
            return Ok(None);
        };

        match values.as_slice() {
            [host, port] => {
                let port = port.parse::<u16>().map_err(|_| {
                    Cli::command().error(
                        ErrorKind::InvalidValue,
                        format!("--local のポート番号が不正です: '{}'", port),
                    )
                })?;
                if host.is_empty() {
                    return Err(Cli::command().error(
                        ErrorKind::InvalidValue,
                        "--local のホストが空です",
                    ));
                }
                Ok(Some((host.clone(), port)))
            }
            _ => Err(Cli::command().error(
                ErrorKind::WrongNumberOfValues,
                "--local には <HOST> <PORT> の2つが必要です",
            )),
        }
    }
}

/// パース済みの起動引数
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    /// `--<name>` で指定された名前（`--` を除いたもの、指定順）
    pub selectors: Vec<String>,
}

/// 宣言済みオプションの long 名 → 取る値の数
fn declared_options() -> HashMap<String, usize> {
    let mut command = Cli::command();
    command.build();

    command
        .get_arguments()
        .filter_map(|arg| {
            let long = arg.get_long()?;
            let values = arg
                .get_num_args()
                .map(|range| range.max_values())
                .unwrap_or(0);
            Some((long.to_string(), values))
        })
        .collect()
}

/// 引数列を clap 向けの引数とセレクタに分離してパース
///
/// `args` の先頭はプログラム名。
pub fn parse_invocation<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let options = declared_options();

    let mut args = args.into_iter().map(Into::into);
    let mut clap_args: Vec<String> = args.next().into_iter().collect();
    let mut selectors = Vec::new();

    // 直前のオプションがまだ受け取る値の数
    let mut pending_values = 0usize;

    for token in args {
        let Some(flag) = token.strip_prefix("--").filter(|f| !f.is_empty()) else {
            pending_values = pending_values.saturating_sub(1);
            clap_args.push(token);
            continue;
        };

        let (name, inline_value) = match flag.split_once('=') {
            Some((name, _)) => (name, true),
            None => (flag, false),
        };

        if let Some(&values) = options.get(name) {
            pending_values = if inline_value { 0 } else { values };
            clap_args.push(token);
        } else if pending_values > 0 {
            // 値の位置に現れたフラグは clap にエラーとして報告させる
            pending_values = 0;
            clap_args.push(token);
        } else {
            selectors.push(name.to_string());
        }
    }

    tracing::debug!("Selectors: {:?}", selectors);

    let cli = Cli::try_parse_from(clap_args)?;
    Ok(Invocation { cli, selectors })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Invocation, clap::Error> {
        parse_invocation(std::iter::once("fleetpush").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_declared_options_are_reserved_catalog_names() {
        for name in declared_options().keys() {
            assert!(
                fleetpush_core::RESERVED_NAMES.contains(&name.as_str()),
                "--{} must be listed in RESERVED_NAMES",
                name
            );
        }
    }

    #[test]
    fn test_no_arguments() {
        let invocation = parse(&[]).unwrap();
        assert!(invocation.selectors.is_empty());
        assert_eq!(invocation.cli.target, None);
        assert!(invocation.cli.local.is_none());
        assert_eq!(invocation.cli.engine, "docker");
    }

    #[test]
    fn test_selectors_are_separated() {
        let invocation = parse(&[
            "--item_tracker",
            "--local",
            "127.0.0.1",
            "9999",
            "--postgres",
            "--target",
            "linux/arm64",
        ])
        .unwrap();

        assert_eq!(invocation.selectors, vec!["item_tracker", "postgres"]);
        assert_eq!(invocation.cli.target, Some(Platform::LinuxArm64));
        assert_eq!(
            invocation.cli.local_registry().unwrap(),
            Some(("127.0.0.1".to_string(), 9999))
        );
        assert!(!invocation.cli.create_registry);
    }

    #[test]
    fn test_inline_option_value() {
        let invocation = parse(&["--target=linux/arm/v6", "--viz_server"]).unwrap();
        assert_eq!(invocation.cli.target, Some(Platform::LinuxArmV6));
        assert_eq!(invocation.selectors, vec!["viz_server"]);
    }

    #[test]
    fn test_unsupported_platform() {
        let err = parse(&["--target", "windows/amd64"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        let message = err.to_string();
        assert!(message.contains("windows/amd64"));
        assert!(message.contains("linux/arm/v7"));
    }

    #[test]
    fn test_local_requires_host_and_port() {
        let err = parse(&["--local", "127.0.0.1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongNumberOfValues);
    }

    #[test]
    fn test_local_flag_in_value_position_is_error() {
        assert!(parse(&["--local", "127.0.0.1", "--item_tracker", "5000"]).is_err());
    }

    #[test]
    fn test_local_invalid_port() {
        let invocation = parse(&["--local", "127.0.0.1", "http"]).unwrap();
        let err = invocation.cli.local_registry().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_create_registry_requires_local() {
        let err = parse(&["--create-registry"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let invocation = parse(&["--local", "0.0.0.0", "5000", "--create-registry"]).unwrap();
        assert!(invocation.cli.create_registry);
    }

    #[test]
    fn test_credentials_conflicts_with_local() {
        let err = parse(&["--local", "h", "1", "--credentials", "c.json"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_help_is_reported_as_error_kind() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }
}
