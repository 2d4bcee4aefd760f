//! fleetpush コア
//!
//! サービスカタログ（ソースからビルドするサービスと再公開するリモートイメージ）、
//! クロスビルド対象プラットフォーム、そして1回の実行内容を表すビルドプランを提供します。

pub mod error;
pub mod model;
pub mod parser;
pub mod plan;
pub mod platform;

pub use error::*;
pub use model::*;
pub use parser::*;
pub use plan::*;
pub use platform::*;
