//! 公開先レジストリの準備
//!
//! ローカルレジストリの起動と、リモートレジストリへのログインを行う。

use crate::engine::{ContainerEngine, EngineCommand, REGISTRY_CONTAINER_NAME, Secret};
use crate::error::{BuildError, BuildResult};
use colored::Colorize;

/// 使い捨てのローカルレジストリを起動する
///
/// 同名のコンテナが残っていれば先に強制削除する。削除の失敗（コンテナが存在しない等）は無視するが、
/// 新しいレジストリの起動失敗はエラーにする。
pub async fn bootstrap_local_registry<E: ContainerEngine>(
    engine: &E,
    host: &str,
    port: u16,
) -> BuildResult<()> {
    let remove = EngineCommand::RemoveContainer {
        name: REGISTRY_CONTAINER_NAME.to_string(),
    };

    match engine.run(&remove).await {
        Ok(()) => {}
        Err(BuildError::CommandFailed { stderr, .. }) => {
            if stderr.contains("No such container") {
                tracing::debug!("No stale registry container to remove");
            } else {
                tracing::warn!("Failed to remove stale registry container: {}", stderr.trim());
            }
        }
        Err(e) => return Err(e),
    }

    println!("{}", "レジストリコンテナを作成・起動中...".blue());

    let run = EngineCommand::RunRegistry {
        name: REGISTRY_CONTAINER_NAME.to_string(),
        host: host.to_string(),
        port,
    };

    engine.run(&run).await.map_err(|e| match e {
        BuildError::CommandFailed { command, stderr, .. } => {
            BuildError::RegistryBootstrap(format!("{}\n{}", command, stderr.trim()))
        }
        other => other,
    })?;

    tracing::info!("Local registry started on {}:{}", host, port);
    Ok(())
}

/// レジストリにログインする
pub async fn login<E: ContainerEngine>(
    engine: &E,
    registry: &str,
    username: &str,
    password: &str,
) -> BuildResult<()> {
    println!("🔑 {} に {} としてログイン中", registry.cyan(), username.cyan());

    let command = EngineCommand::Login {
        registry: registry.to_string(),
        username: username.to_string(),
        password: Secret::new(password),
    };

    engine.run(&command).await.map_err(|e| match e {
        BuildError::CommandFailed { stderr, .. } => BuildError::LoginFailed {
            registry: registry.to_string(),
            message: stderr.trim().to_string(),
        },
        other => other,
    })?;

    tracing::info!("Logged in to {}", registry);
    Ok(())
}
