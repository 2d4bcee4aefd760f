use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("コマンドの起動に失敗しました: {command}\n理由: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("コマンドが失敗しました (exit {}): {command}{}", display_code(.code), display_stderr(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("レジストリへのログインに失敗しました: {registry}\n{message}")]
    LoginFailed { registry: String, message: String },

    #[error("ローカルレジストリの起動に失敗しました: {0}")]
    RegistryBootstrap(String),
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

fn display_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Spawn { command, .. } => {
                format!(
                    "{}\n\
                     \n\
                     解決方法:\n\
                     1. docker (または --engine で指定したコマンド) がインストールされているか確認してください\n\
                     2. PATH が通っているか確認してください\n\
                     \n\
                     実行しようとしたコマンド: {}",
                    self, command
                )
            }
            BuildError::LoginFailed { .. } => {
                format!(
                    "{}\n\
                     \n\
                     acr_credentials.json の Ip / Username / Password を確認してください。",
                    self
                )
            }
            BuildError::RegistryBootstrap(_) => {
                format!(
                    "{}\n\
                     \n\
                     指定したポートが他のプロセスで使われていないか確認してください。",
                    self
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
