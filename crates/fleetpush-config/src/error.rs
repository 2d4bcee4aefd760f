use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "認証情報ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: acr_credentials.json\n\
        - ./.fleetpush/ ディレクトリ\n\
        - ~/.config/fleetpush/acr_credentials.json\n\
        または --credentials / FLEETPUSH_CREDENTIALS で直接指定できます。\n\
        ローカルレジストリを使う場合は --local <host> <port> を指定してください"
    )]
    CredentialsNotFound,

    #[error("指定されたファイルが存在しません: {0}")]
    ExplicitPathNotFound(PathBuf),

    #[error("認証情報ファイルの形式が不正です: {path}\n理由: {message}")]
    InvalidCredentials { path: PathBuf, message: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
