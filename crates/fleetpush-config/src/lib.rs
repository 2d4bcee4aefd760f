pub mod error;

pub use error::*;

use fleetpush_core::Credentials;
use std::path::{Path, PathBuf};

/// 認証情報ファイル名
pub const CREDENTIALS_FILE: &str = "acr_credentials.json";

/// カタログファイル名
pub const CATALOG_FILE: &str = "fleetpush.kdl";

/// 認証情報ファイルのパスを直接指定する環境変数
pub const CREDENTIALS_ENV: &str = "FLEETPUSH_CREDENTIALS";

/// カタログファイルのパスを直接指定する環境変数
pub const CATALOG_ENV: &str = "FLEETPUSH_CATALOG";

/// プロジェクトローカルの設定ディレクトリ名
const PROJECT_CONFIG_DIR: &str = ".fleetpush";

/// fleetpushのグローバル設定ディレクトリ (~/.config/fleetpush)
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("fleetpush"))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// 認証情報ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. `--credentials` で明示されたパス
/// 2. 環境変数 FLEETPUSH_CREDENTIALS
/// 3. カレントディレクトリ: acr_credentials.json
/// 4. ./.fleetpush/acr_credentials.json
/// 5. ~/.config/fleetpush/acr_credentials.json
pub fn find_credentials_file(explicit: Option<&Path>) -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    find_file(explicit, CREDENTIALS_ENV, CREDENTIALS_FILE, &current_dir)?
        .ok_or(ConfigError::CredentialsNotFound)
}

/// カタログファイルを探す
///
/// 検索順序は認証情報ファイルと同じ（FLEETPUSH_CATALOG, fleetpush.kdl）。
/// 見つからない場合は None を返し、呼び出し側は組み込みカタログを使う。
pub fn find_catalog_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let current_dir = std::env::current_dir()?;
    find_file(explicit, CATALOG_ENV, CATALOG_FILE, &current_dir)
}

fn find_file(
    explicit: Option<&Path>,
    env_key: &str,
    filename: &str,
    base_dir: &Path,
) -> Result<Option<PathBuf>> {
    // 1. 明示的な指定（存在しなければエラー）
    if let Some(path) = explicit {
        return existing(path.to_path_buf()).map(Some);
    }

    // 2. 環境変数
    if let Ok(value) = std::env::var(env_key) {
        if !value.is_empty() {
            return existing(PathBuf::from(value)).map(Some);
        }
    }

    // 3. カレントディレクトリ
    let path = base_dir.join(filename);
    if path.is_file() {
        return Ok(Some(path));
    }

    // 4. ./.fleetpush/ ディレクトリ
    let path = base_dir.join(PROJECT_CONFIG_DIR).join(filename);
    if path.is_file() {
        return Ok(Some(path));
    }

    // 5. グローバル設定ディレクトリ
    if let Ok(config_dir) = get_config_dir() {
        let path = config_dir.join(filename);
        if path.is_file() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::ExplicitPathNotFound(path))
    }
}

/// 認証情報ファイルを読み込む
///
/// `{"Ip": ..., "Username": ..., "Password": ...}` 形式のJSON。
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let content = std::fs::read_to_string(path)?;
    let credentials: Credentials =
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidCredentials {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if credentials.ip.trim().is_empty() {
        return Err(ConfigError::InvalidCredentials {
            path: path.to_path_buf(),
            message: "Ip が空です".to_string(),
        });
    }

    tracing::debug!(
        "Loaded credentials for {} from {}",
        credentials.ip,
        path.display()
    );

    Ok(credentials)
}
