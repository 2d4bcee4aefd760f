//! カタログKDLパーサー
//!
//! ```kdl
//! service "item_tracker" {
//!     context "."
//!     dockerfile "rfid_inventory/services/item_tracker/Dockerfile"
//!     build-args {
//!         arg "PYTHON_VERSION=3.12"
//!     }
//! }
//!
//! remote "postgres" image="postgres:latest"
//! ```

use crate::error::{CatalogError, Result};
use crate::model::{BuildArg, Catalog, RemoteImageSpec, ServiceSpec};
use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};

/// 組み込みカタログ
const BUILTIN_CATALOG: &str = include_str!("../catalog.kdl");

impl Catalog {
    /// バイナリに埋め込まれたカタログを読み込む
    pub fn builtin() -> Result<Self> {
        parse_catalog(BUILTIN_CATALOG)
    }
}

/// KDLファイルを Catalog にパース
pub fn parse_catalog_file(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)?;
    tracing::debug!("Loading catalog from {}", path.display());
    parse_catalog(&content)
}

/// KDL文字列を Catalog にパース
pub fn parse_catalog(content: &str) -> Result<Catalog> {
    let doc: KdlDocument = content.parse()?;

    let mut catalog = Catalog::default();

    for node in doc.nodes() {
        match node.name().value() {
            "service" => catalog.services.push(parse_service(node)?),
            "remote" => catalog.remote_images.push(parse_remote(node)?),
            other => {
                tracing::debug!("Skipping unknown catalog node: {}", other);
            }
        }
    }

    catalog.validate()?;

    Ok(catalog)
}

/// 最初の位置引数を文字列として取得
fn first_argument(node: &KdlNode) -> Option<&str> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
}

fn entry_name(node: &KdlNode, kind: &str) -> Result<String> {
    first_argument(node)
        .map(|s| s.to_string())
        .ok_or_else(|| CatalogError::InvalidConfig(format!("{} には名前が必要です", kind)))
}

/// service ノードをパース
fn parse_service(node: &KdlNode) -> Result<ServiceSpec> {
    let name = entry_name(node, "service")?;
    let mut service = ServiceSpec::new(name, ".");

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "context" => {
                    if let Some(path) = first_argument(child) {
                        service.context = PathBuf::from(path);
                    }
                }
                "dockerfile" => {
                    service.dockerfile = first_argument(child).map(PathBuf::from);
                }
                "build-args" | "build_args" => {
                    if let Some(args) = child.children() {
                        for arg_node in args.nodes() {
                            let arg = parse_build_arg(&service.name, arg_node)?;
                            service.build_args.push(arg);
                        }
                    }
                }
                other => {
                    tracing::debug!(
                        "Skipping unknown field '{}' in service '{}'",
                        other,
                        service.name
                    );
                }
            }
        }
    }

    Ok(service)
}

/// ビルド引数ノードをパース
///
/// `arg "KEY=VALUE"` と `KEY "VALUE"` の両方を受け付ける。
fn parse_build_arg(service: &str, node: &KdlNode) -> Result<BuildArg> {
    let key = node.name().value();
    let value = first_argument(node);

    let invalid = || CatalogError::InvalidBuildArg {
        service: service.to_string(),
        arg: match value {
            Some(v) => format!("{} {}", key, v),
            None => key.to_string(),
        },
    };

    if key == "arg" {
        value.and_then(BuildArg::parse).ok_or_else(invalid)
    } else {
        value.map(|v| BuildArg::new(key, v)).ok_or_else(invalid)
    }
}

/// remote ノードをパース
fn parse_remote(node: &KdlNode) -> Result<RemoteImageSpec> {
    let name = entry_name(node, "remote")?;
    let mut image = None;
    let mut target = None;

    for entry in node.entries() {
        if let Some(key) = entry.name() {
            match key.value() {
                "image" => image = entry.value().as_string().map(|s| s.to_string()),
                "target" => target = entry.value().as_string().map(|s| s.to_string()),
                _ => {}
            }
        }
    }

    let image = image.ok_or_else(|| {
        CatalogError::InvalidConfig(format!("remote '{}' に image が必要です", name))
    })?;

    Ok(RemoteImageSpec::new(name, image, target))
}
