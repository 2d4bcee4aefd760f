//! ビルドプラン
//!
//! CLI の入力とカタログから、1回の実行で何をどこへ公開するかを決定する。

use crate::error::PlanError;
use crate::model::{Catalog, RemoteImageSpec, ServiceSpec};
use crate::platform::Platform;
use serde::Deserialize;
use std::fmt;

/// レジストリ認証情報ファイル (`acr_credentials.json`) の内容
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub ip: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ip", &self.ip)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 公開先レジストリ
#[derive(Clone, PartialEq, Eq)]
pub enum RegistryTarget {
    /// 認証なしのローカルレジストリ
    Local {
        host: String,
        port: u16,
        create_registry: bool,
    },
    /// ログインが必要なリモートレジストリ
    Remote {
        address: String,
        username: String,
        password: String,
    },
}

impl RegistryTarget {
    /// イメージ名の接頭辞になるレジストリアドレス
    pub fn address(&self) -> String {
        match self {
            RegistryTarget::Local { host, port, .. } => format!("{}:{}", host, port),
            RegistryTarget::Remote { address, .. } => address.clone(),
        }
    }

    pub fn requires_login(&self) -> bool {
        matches!(self, RegistryTarget::Remote { .. })
    }
}

impl From<Credentials> for RegistryTarget {
    fn from(credentials: Credentials) -> Self {
        RegistryTarget::Remote {
            address: credentials.ip,
            username: credentials.username,
            password: credentials.password,
        }
    }
}

impl fmt::Debug for RegistryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryTarget::Local {
                host,
                port,
                create_registry,
            } => f
                .debug_struct("Local")
                .field("host", host)
                .field("port", port)
                .field("create_registry", create_registry)
                .finish(),
            RegistryTarget::Remote {
                address, username, ..
            } => f
                .debug_struct("Remote")
                .field("address", address)
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// 1回の実行で処理する内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// None の場合はホストのアーキテクチャでネイティブビルド
    pub platform: Option<Platform>,
    pub services: Vec<ServiceSpec>,
    pub remote_images: Vec<RemoteImageSpec>,
    pub registry: RegistryTarget,
}

impl BuildPlan {
    pub fn new(platform: Option<Platform>, selection: Selection, registry: RegistryTarget) -> Self {
        Self {
            platform,
            services: selection.services,
            remote_images: selection.remote_images,
            registry,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.remote_images.is_empty()
    }
}

/// フラグで絞り込んだカタログの部分集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub services: Vec<ServiceSpec>,
    pub remote_images: Vec<RemoteImageSpec>,
    /// 1つ以上のフラグがカタログに一致した場合 true
    pub filtered: bool,
}

/// `--<name>` フラグ（名前部分のみ）からビルド対象を選択
///
/// カタログに一致するフラグが1つでもあれば、一致したエントリのみを宣言順で返す。
/// 一致しなければカタログ全体を返す。
/// 一致しないフラグは `strict` の場合エラー、そうでなければ警告のみ。
pub fn select(catalog: &Catalog, selectors: &[String], strict: bool) -> Result<Selection, PlanError> {
    let is_selected = |name: &str| selectors.iter().any(|s| s == name);

    let unknown: Vec<String> = selectors
        .iter()
        .filter(|s| !catalog.contains(s))
        .cloned()
        .collect();

    if !unknown.is_empty() {
        if strict {
            return Err(PlanError::UnknownSelectors(unknown));
        }
        for name in &unknown {
            tracing::warn!("Ignoring flag --{} (not in catalog)", name);
        }
    }

    let services: Vec<ServiceSpec> = catalog
        .services
        .iter()
        .filter(|s| is_selected(&s.name))
        .cloned()
        .collect();
    let remote_images: Vec<RemoteImageSpec> = catalog
        .remote_images
        .iter()
        .filter(|r| is_selected(&r.name))
        .cloned()
        .collect();

    if services.is_empty() && remote_images.is_empty() {
        return Ok(Selection {
            services: catalog.services.clone(),
            remote_images: catalog.remote_images.clone(),
            filtered: false,
        });
    }

    Ok(Selection {
        services,
        remote_images,
        filtered: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        Catalog {
            services: vec![
                ServiceSpec::new("rfid_database", "."),
                ServiceSpec::new("item_tracker", "."),
                ServiceSpec::new("viz_server", "."),
            ],
            remote_images: vec![
                RemoteImageSpec::new("postgres", "postgres:latest", None),
                RemoteImageSpec::new("redis", "redis:7-alpine", None),
            ],
        }
    }

    fn names(selection: &Selection) -> Vec<&str> {
        selection
            .services
            .iter()
            .map(|s| s.name.as_str())
            .chain(selection.remote_images.iter().map(|r| r.name.as_str()))
            .collect()
    }

    fn selectors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_without_flags_returns_full_catalog() {
        let catalog = sample_catalog();
        let selection = select(&catalog, &[], false).unwrap();
        assert!(!selection.filtered);
        assert_eq!(selection.services, catalog.services);
        assert_eq!(selection.remote_images, catalog.remote_images);
    }

    #[test]
    fn test_select_every_subset() {
        let catalog = sample_catalog();
        let all: Vec<&str> = catalog.entry_names().collect();

        // 空でない全ての部分集合について、指定した名前と完全に一致する
        for mask in 1u32..(1 << all.len()) {
            let subset: Vec<&str> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, n)| *n)
                .collect();

            // フラグの順序はカタログ順に影響しない
            let mut flags = selectors(&subset);
            flags.reverse();

            let selection = select(&catalog, &flags, false).unwrap();
            assert!(selection.filtered);
            assert_eq!(names(&selection), subset);
        }
    }

    #[test]
    fn test_select_unknown_flags_fall_back_to_full_catalog() {
        let catalog = sample_catalog();
        let selection = select(&catalog, &selectors(&["item_trackr"]), false).unwrap();
        assert!(!selection.filtered);
        assert_eq!(names(&selection).len(), 5);
    }

    #[test]
    fn test_select_unknown_flags_are_ignored_when_another_matches() {
        let catalog = sample_catalog();
        let selection =
            select(&catalog, &selectors(&["typo", "postgres"]), false).unwrap();
        assert_eq!(names(&selection), vec!["postgres"]);
    }

    #[test]
    fn test_select_strict_rejects_unknown_flags() {
        let catalog = sample_catalog();
        let err = select(&catalog, &selectors(&["item_trackr", "postgres"]), true).unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownSelectors(vec!["item_trackr".to_string()])
        );
        assert!(err.to_string().contains("--item_trackr"));
    }

    #[test]
    fn test_select_duplicate_flags() {
        let catalog = sample_catalog();
        let selection =
            select(&catalog, &selectors(&["viz_server", "viz_server"]), true).unwrap();
        assert_eq!(names(&selection), vec!["viz_server"]);
    }

    #[test]
    fn test_registry_target_address() {
        let local = RegistryTarget::Local {
            host: "127.0.0.1".to_string(),
            port: 9999,
            create_registry: false,
        };
        assert_eq!(local.address(), "127.0.0.1:9999");
        assert!(!local.requires_login());

        let credentials: Credentials = serde_json::from_str(
            r#"{"Ip": "myregistry.azurecr.io", "Username": "bot", "Password": "s3cret"}"#,
        )
        .unwrap();
        let remote = RegistryTarget::from(credentials);
        assert_eq!(remote.address(), "myregistry.azurecr.io");
        assert!(remote.requires_login());
    }

    #[test]
    fn test_debug_redacts_password() {
        let remote = RegistryTarget::Remote {
            address: "r.example.com".to_string(),
            username: "bot".to_string(),
            password: "s3cret".to_string(),
        };
        let debug = format!("{:?}", remote);
        assert!(debug.contains("bot"));
        assert!(!debug.contains("s3cret"));
    }
}
