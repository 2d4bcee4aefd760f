//! fleetpush のイメージビルド・公開処理
//!
//! コンテナエンジン (docker CLI) を外部コマンドとして呼び出し、
//! サービスのビルドとプッシュ、リモートイメージの再公開、
//! 公開先レジストリの準備（ローカルレジストリの起動・ログイン）を行います。

pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod registry;

#[cfg(test)]
mod testing;

pub use engine::{ContainerEngine, DockerCli, EngineCommand, Secret};
pub use error::{BuildError, BuildResult};
pub use orchestrator::{Orchestrator, PublishKind, PublishReport, PublishedImage};
