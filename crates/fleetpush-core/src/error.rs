use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("無効なカタログ定義: {0}")]
    InvalidConfig(String),

    #[error("エントリ名が重複しています: {0}")]
    DuplicateName(String),

    #[error("エントリ名 '{0}' は予約済みのオプション名と衝突します")]
    ReservedName(String),

    #[error("無効なビルド引数 '{arg}' (サービス '{service}'): KEY=VALUE 形式で指定してください")]
    InvalidBuildArg { service: String, arg: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    #[error("サポートされていないプラットフォーム: {value}\nサポート対象: {supported}")]
    UnsupportedPlatform { value: String, supported: String },

    #[error("カタログに存在しないフラグが指定されました: {}", .0.iter().map(|s| format!("--{}", s)).collect::<Vec<_>>().join(", "))]
    UnknownSelectors(Vec<String>),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
