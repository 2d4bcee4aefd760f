//! ビルドプランの実行
//!
//! サービスをカタログ順に1つずつビルド・プッシュし、その後リモートイメージを再公開する。
//! 最初に失敗したコマンドで実行全体を中断する（リトライ・ロールバックなし）。

use crate::engine::{ContainerEngine, EngineCommand};
use crate::error::BuildResult;
use crate::registry;
use colored::Colorize;
use fleetpush_core::{BuildPlan, Platform, RegistryTarget, RemoteImageSpec, ServiceSpec};

/// 公開したイメージの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishKind {
    /// ソースからビルド
    Built,
    /// 公開レジストリから再公開
    Republished,
}

/// 公開済みイメージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedImage {
    pub name: String,
    pub reference: String,
    pub kind: PublishKind,
}

/// 1回の実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub registry: String,
    pub published: Vec<PublishedImage>,
}

pub struct Orchestrator<E> {
    engine: E,
}

impl<E: ContainerEngine> Orchestrator<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// 公開先レジストリを準備し、イメージ名の接頭辞になるアドレスを返す
    ///
    /// - Local + create_registry: レジストリコンテナを作り直す
    /// - Local: 何もしない
    /// - Remote: 1回だけログインする
    pub async fn prepare_registry(&self, target: &RegistryTarget) -> BuildResult<String> {
        match target {
            RegistryTarget::Local {
                host,
                port,
                create_registry,
            } => {
                if *create_registry {
                    registry::bootstrap_local_registry(&self.engine, host, *port).await?;
                }
            }
            RegistryTarget::Remote {
                address,
                username,
                password,
            } => {
                registry::login(&self.engine, address, username, password).await?;
            }
        }

        Ok(target.address())
    }

    /// サービスをビルドしてレジストリにプッシュ
    ///
    /// プラットフォーム指定時は buildx でビルドとプッシュを1コマンドで行う。
    /// 未指定時はネイティブビルドの後に別途プッシュする。
    pub async fn build_and_push(
        &self,
        service: &ServiceSpec,
        registry_address: &str,
        platform: Option<Platform>,
    ) -> BuildResult<String> {
        let image = service.image_reference(registry_address);

        println!();
        println!(
            "{}",
            format!("🔨 {} をビルド中...", service.name).green().bold()
        );
        if let Some(dockerfile) = &service.dockerfile {
            println!("  → Dockerfile: {}", dockerfile.display().to_string().cyan());
        }
        println!(
            "  → Context: {}",
            service.context.display().to_string().cyan()
        );
        println!("  → Image: {}", image.cyan());
        if !service.build_args.is_empty() {
            tracing::debug!("Build args for {}: {:?}", service.name, service.build_args);
        }

        match platform {
            Some(platform) => {
                println!("  → Platform: {}", platform.to_string().cyan());
                self.engine
                    .run(&EngineCommand::BuildxPush {
                        image: image.clone(),
                        platform,
                        context: service.context.clone(),
                        dockerfile: service.dockerfile.clone(),
                        build_args: service.build_args.clone(),
                    })
                    .await?;
            }
            None => {
                self.engine
                    .run(&EngineCommand::Build {
                        image: image.clone(),
                        context: service.context.clone(),
                        dockerfile: service.dockerfile.clone(),
                        build_args: service.build_args.clone(),
                    })
                    .await?;

                println!("  {} {} をプッシュ中", "↑".blue(), image.cyan());
                self.engine
                    .run(&EngineCommand::Push {
                        image: image.clone(),
                    })
                    .await?;
            }
        }

        tracing::info!("Published {}", image);
        println!("  {} {}", "✓".green(), image.cyan());
        Ok(image)
    }

    /// 公開レジストリから pull し、公開先レジストリ用にタグ付けしてプッシュ
    pub async fn pull_and_republish(
        &self,
        remote: &RemoteImageSpec,
        registry_address: &str,
    ) -> BuildResult<String> {
        let target = remote.target_reference(registry_address);

        println!();
        println!(
            "{}",
            format!("📦 {} を再公開中...", remote.name).green().bold()
        );

        println!("  {} {} をプル中", "↓".blue(), remote.source_image.cyan());
        self.engine
            .run(&EngineCommand::Pull {
                image: remote.source_image.clone(),
            })
            .await?;

        println!("  → Tag: {}", target.cyan());
        self.engine
            .run(&EngineCommand::Tag {
                source: remote.source_image.clone(),
                target: target.clone(),
            })
            .await?;

        println!("  {} {} をプッシュ中", "↑".blue(), target.cyan());
        self.engine
            .run(&EngineCommand::Push {
                image: target.clone(),
            })
            .await?;

        tracing::info!("Republished {} as {}", remote.source_image, target);
        println!("  {} {}", "✓".green(), target.cyan());
        Ok(target)
    }

    /// プラン全体を実行
    ///
    /// レジストリ準備 → サービス（カタログ順）→ リモートイメージ（カタログ順）。
    pub async fn execute(&self, plan: &BuildPlan) -> BuildResult<PublishReport> {
        let address = self.prepare_registry(&plan.registry).await?;

        let mut report = PublishReport {
            registry: address.clone(),
            published: Vec::new(),
        };

        for service in &plan.services {
            let reference = self
                .build_and_push(service, &address, plan.platform)
                .await?;
            report.published.push(PublishedImage {
                name: service.name.clone(),
                reference,
                kind: PublishKind::Built,
            });
        }

        for remote in &plan.remote_images {
            let reference = self.pull_and_republish(remote, &address).await?;
            report.published.push(PublishedImage {
                name: remote.name.clone(),
                reference,
                kind: PublishKind::Republished,
            });
        }

        Ok(report)
    }
}
