//! コンテナエンジン (docker CLI) の呼び出し
//!
//! エンジンは外部コマンドとして扱う。1コマンドずつ同期的に完了を待ち、
//! 終了ステータスが 0 以外なら失敗とする。

use crate::error::{BuildError, BuildResult};
use colored::Colorize;
use fleetpush_core::{BuildArg, Platform};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

/// ローカルレジストリコンテナの予約名
pub const REGISTRY_CONTAINER_NAME: &str = "registry";

/// ローカルレジストリのイメージ
pub const REGISTRY_IMAGE: &str = "registry:2";

/// レジストリコンテナ内部の待ち受けポート
pub const REGISTRY_INTERNAL_PORT: u16 = 5000;

/// ログやDebug出力に載せない文字列
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"***\"")
    }
}

/// エンジンに発行する1コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// ネイティブビルド（タグ付けまで）
    Build {
        image: String,
        context: PathBuf,
        dockerfile: Option<PathBuf>,
        build_args: Vec<BuildArg>,
    },
    /// buildx によるクロスビルドとプッシュを1回で行う
    BuildxPush {
        image: String,
        platform: Platform,
        context: PathBuf,
        dockerfile: Option<PathBuf>,
        build_args: Vec<BuildArg>,
    },
    Push {
        image: String,
    },
    Pull {
        image: String,
    },
    Tag {
        source: String,
        target: String,
    },
    /// パスワードは標準入力から渡す (--password-stdin)
    Login {
        registry: String,
        username: String,
        password: Secret,
    },
    RemoveContainer {
        name: String,
    },
    RunRegistry {
        name: String,
        host: String,
        port: u16,
    },
}

impl EngineCommand {
    /// エンジンに渡す引数列
    pub fn args(&self) -> Vec<String> {
        match self {
            EngineCommand::Build {
                image,
                context,
                dockerfile,
                build_args,
            } => {
                let mut args = vec!["build".to_string(), "-t".to_string(), image.clone()];
                push_build_options(&mut args, dockerfile, build_args);
                args.push(context.display().to_string());
                args
            }
            EngineCommand::BuildxPush {
                image,
                platform,
                context,
                dockerfile,
                build_args,
            } => {
                let mut args = vec![
                    "buildx".to_string(),
                    "build".to_string(),
                    "--platform".to_string(),
                    platform.to_string(),
                    "-t".to_string(),
                    image.clone(),
                ];
                push_build_options(&mut args, dockerfile, build_args);
                args.push("--push".to_string());
                args.push(context.display().to_string());
                args
            }
            EngineCommand::Push { image } => vec!["push".to_string(), image.clone()],
            EngineCommand::Pull { image } => vec!["pull".to_string(), image.clone()],
            EngineCommand::Tag { source, target } => {
                vec!["tag".to_string(), source.clone(), target.clone()]
            }
            EngineCommand::Login {
                registry, username, ..
            } => vec![
                "login".to_string(),
                registry.clone(),
                "--username".to_string(),
                username.clone(),
                "--password-stdin".to_string(),
            ],
            EngineCommand::RemoveContainer { name } => {
                vec!["rm".to_string(), "-f".to_string(), name.clone()]
            }
            EngineCommand::RunRegistry { name, host, port } => vec![
                "run".to_string(),
                "-d".to_string(),
                "-p".to_string(),
                format!("{}:{}:{}", host, port, REGISTRY_INTERNAL_PORT),
                "--restart=always".to_string(),
                "--name".to_string(),
                name.clone(),
                "-e".to_string(),
                "REGISTRY_STORAGE_DELETE_ENABLED=true".to_string(),
                REGISTRY_IMAGE.to_string(),
            ],
        }
    }

    /// 標準入力に渡す内容
    pub fn stdin(&self) -> Option<&str> {
        match self {
            EngineCommand::Login { password, .. } => Some(password.expose()),
            _ => None,
        }
    }

    /// 出力をキャプチャしてエラー時に表示するコマンドか
    ///
    /// ビルド・プッシュ・プルは進捗をそのまま端末に流す。
    pub fn captures_output(&self) -> bool {
        matches!(
            self,
            EngineCommand::Login { .. }
                | EngineCommand::RemoveContainer { .. }
                | EngineCommand::RunRegistry { .. }
        )
    }
}

fn push_build_options(
    args: &mut Vec<String>,
    dockerfile: &Option<PathBuf>,
    build_args: &[BuildArg],
) {
    if let Some(dockerfile) = dockerfile {
        args.push("-f".to_string());
        args.push(dockerfile.display().to_string());
    }
    for arg in build_args {
        args.push("--build-arg".to_string());
        args.push(arg.to_string());
    }
}

/// 表示用のコマンドライン（パスワードは含まれない）
impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

/// コンテナエンジンのトレイト
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// コマンドを実行し、完了まで待つ
    async fn run(&self, command: &EngineCommand) -> BuildResult<()>;
}

/// docker 互換CLIを子プロセスとして呼び出すエンジン
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    dry_run: bool,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            dry_run: false,
        }
    }

    /// 実行せずにコマンドラインを表示するだけにする
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_line(&self, command: &EngineCommand) -> String {
        format!("{} {}", self.program, command)
    }

    async fn run_captured(&self, command: &EngineCommand, line: &str) -> BuildResult<()> {
        let spawn_error = |source| BuildError::Spawn {
            command: line.to_string(),
            source,
        };

        let mut child = tokio::process::Command::new(&self.program)
            .args(command.args())
            .stdin(if command.stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(input) = command.stdin() {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(input.as_bytes())
                    .await
                    .map_err(spawn_error)?;
                // stdin を閉じて EOF を伝える
                drop(stdin);
            }
        }

        let output = child.wait_with_output().await.map_err(spawn_error)?;

        if !output.status.success() {
            return Err(BuildError::CommandFailed {
                command: line.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }

    async fn run_inherited(&self, command: &EngineCommand, line: &str) -> BuildResult<()> {
        let status = tokio::process::Command::new(&self.program)
            .args(command.args())
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| BuildError::Spawn {
                command: line.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(BuildError::CommandFailed {
                command: line.to_string(),
                code: status.code(),
                stderr: String::new(),
            });
        }

        Ok(())
    }
}

impl ContainerEngine for DockerCli {
    async fn run(&self, command: &EngineCommand) -> BuildResult<()> {
        let line = self.command_line(command);

        if self.dry_run {
            println!("  {} {}", "[dry-run]".yellow(), line);
            return Ok(());
        }

        tracing::debug!("Running: {}", line);

        if command.captures_output() {
            self.run_captured(command, &line).await
        } else {
            self.run_inherited(command, &line).await
        }
    }
}
