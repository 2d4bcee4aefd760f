//! カタログのデータモデル

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// CLIオプションとして予約されている名前
///
/// カタログのエントリ名は `--<name>` フラグになるため、これらとは衝突させない。
pub const RESERVED_NAMES: &[&str] = &[
    "target",
    "local",
    "create-registry",
    "credentials",
    "catalog",
    "engine",
    "strict",
    "dry-run",
    "help",
    "version",
];

/// ビルド引数 (KEY=VALUE)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArg {
    pub key: String,
    pub value: String,
}

impl BuildArg {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// "KEY=VALUE" 形式の文字列をパース
    ///
    /// 値側の `=` はそのまま保持する（`A=b=c` -> key `A`, value `b=c`）。
    pub fn parse(raw: &str) -> Option<Self> {
        let (key, value) = raw.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, value))
    }
}

impl fmt::Display for BuildArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// ソースからビルドするサービス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,

    /// ビルドコンテキスト（実行時のカレントディレクトリ基準）
    pub context: PathBuf,

    /// Dockerfileのパス（省略時はエンジンの既定: `<context>/Dockerfile`）
    pub dockerfile: Option<PathBuf>,

    /// 宣言順を保持したビルド引数
    pub build_args: Vec<BuildArg>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, context: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            context: context.into(),
            dockerfile: None,
            build_args: Vec::new(),
        }
    }

    pub fn with_dockerfile(mut self, dockerfile: impl Into<PathBuf>) -> Self {
        self.dockerfile = Some(dockerfile.into());
        self
    }

    pub fn with_build_arg(mut self, arg: BuildArg) -> Self {
        self.build_args.push(arg);
        self
    }

    /// レジストリ込みの完全なイメージ名
    pub fn image_reference(&self, registry_address: &str) -> String {
        format!("{}/{}", registry_address, self.name)
    }
}

/// 公開レジストリから取得して再公開するイメージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImageSpec {
    /// カタログ上の名前（`--<name>` フラグ）
    pub name: String,

    /// pull 元のイメージ (例: "postgres:latest")
    pub source_image: String,

    /// 再公開時のリポジトリ名
    pub target_name: String,
}

impl RemoteImageSpec {
    /// target 名を省略した場合はソースイメージのベース名から導出する
    pub fn new(
        name: impl Into<String>,
        source_image: impl Into<String>,
        target_name: Option<String>,
    ) -> Self {
        let source_image = source_image.into();
        let target_name = target_name.unwrap_or_else(|| default_target_name(&source_image));
        Self {
            name: name.into(),
            source_image,
            target_name,
        }
    }

    /// ソースイメージのタグ（省略時は "latest"）
    pub fn source_tag(&self) -> &str {
        split_reference(&self.source_image).1.unwrap_or("latest")
    }

    /// 再公開先の完全なイメージ名
    pub fn target_reference(&self, registry_address: &str) -> String {
        format!(
            "{}/{}:{}",
            registry_address,
            self.target_name,
            self.source_tag()
        )
    }
}

/// イメージ参照をリポジトリとタグに分離
///
/// ダイジェスト (`@sha256:...`) は取り除く。レジストリのポート番号はタグとみなさない。
///
/// # Examples
/// - `postgres:latest` -> `("postgres", Some("latest"))`
/// - `localhost:5000/app` -> `("localhost:5000/app", None)`
/// - `bitnami/redis@sha256:abc` -> `("bitnami/redis", None)`
pub fn split_reference(image: &str) -> (&str, Option<&str>) {
    let image = image.split_once('@').map(|(name, _)| name).unwrap_or(image);
    let name_start = image.rfind('/').map(|pos| pos + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(pos) => {
            let split = name_start + pos;
            (&image[..split], Some(&image[split + 1..]))
        }
        None => (image, None),
    }
}

/// ソースイメージから既定の target 名を導出
///
/// 最後のパス要素をベース名とし、`_` を `-` に正規化する。
pub fn default_target_name(source_image: &str) -> String {
    let (repository, _) = split_reference(source_image);
    let base = repository.rsplit('/').next().unwrap_or(repository);
    base.replace('_', "-")
}

/// ビルド・再公開対象のカタログ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub services: Vec<ServiceSpec>,
    pub remote_images: Vec<RemoteImageSpec>,
}

impl Catalog {
    /// 全エントリ名（サービス → リモートイメージの宣言順）
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.services
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.remote_images.iter().map(|r| r.name.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry_names().any(|n| n == name)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn remote_image(&self, name: &str) -> Option<&RemoteImageSpec> {
        self.remote_images.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.remote_images.is_empty()
    }

    /// エントリ名の一意性と予約名との衝突を検証
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for name in self.entry_names() {
            if name.is_empty() {
                return Err(CatalogError::InvalidConfig(
                    "エントリ名が空です".to_string(),
                ));
            }

            if !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            {
                return Err(CatalogError::InvalidConfig(format!(
                    "エントリ名 '{}' に使用できない文字が含まれています",
                    name
                )));
            }

            if RESERVED_NAMES.contains(&name) {
                return Err(CatalogError::ReservedName(name.to_string()));
            }

            if !seen.insert(name) {
                return Err(CatalogError::DuplicateName(name.to_string()));
            }
        }

        for remote in &self.remote_images {
            if remote.source_image.is_empty() {
                return Err(CatalogError::InvalidConfig(format!(
                    "remote '{}' に image が指定されていません",
                    remote.name
                )));
            }
            if remote.target_name.is_empty() {
                return Err(CatalogError::InvalidConfig(format!(
                    "remote '{}' の target 名を導出できません",
                    remote.name
                )));
            }
        }

        Ok(())
    }
}
