//! 起動引数からビルドプランを組み立てる
//!
//! プラットフォーム → 対象の絞り込み → 公開先レジストリ の順に解決する。
//! どの段階で失敗しても、エンジンのコマンドは1つも実行されない。

use crate::cli::{Cli, Invocation};
use crate::error::AppError;
use colored::Colorize;
use fleetpush_core::{BuildPlan, Catalog, RegistryTarget, parse_catalog_file, select};

/// カタログを読み込む（ファイルがなければ組み込みカタログ）
pub fn load_catalog(cli: &Cli) -> Result<Catalog, AppError> {
    match fleetpush_config::find_catalog_file(cli.catalog.as_deref())? {
        Some(path) => {
            println!("カタログ: {}", path.display().to_string().cyan());
            Ok(parse_catalog_file(&path)?)
        }
        None => {
            tracing::debug!("Using built-in catalog");
            Ok(Catalog::builtin()?)
        }
    }
}

/// 公開先レジストリを解決
///
/// `--local` がなければ認証情報ファイルを読み込む（ログイン自体は実行時に行う）。
pub fn resolve_registry(cli: &Cli) -> Result<RegistryTarget, AppError> {
    if let Some((host, port)) = cli.local_registry()? {
        return Ok(RegistryTarget::Local {
            host,
            port,
            create_registry: cli.create_registry,
        });
    }

    let path = fleetpush_config::find_credentials_file(cli.credentials.as_deref())?;
    let credentials = fleetpush_config::load_credentials(&path)?;
    println!("認証情報: {}", path.display().to_string().cyan());

    Ok(RegistryTarget::from(credentials))
}

/// ビルドプランを解決
pub fn resolve_plan(invocation: &Invocation, catalog: &Catalog) -> Result<BuildPlan, AppError> {
    let platform = invocation.cli.target;
    let selection = select(catalog, &invocation.selectors, invocation.cli.strict)?;
    let registry = resolve_registry(&invocation.cli)?;

    let plan = BuildPlan::new(platform, selection, registry);
    tracing::debug!("Resolved plan: {:?}", plan);
    Ok(plan)
}
