//! クロスビルド対象プラットフォーム

use crate::error::PlanError;
use std::fmt;
use std::str::FromStr;

/// buildx に渡せる OS/アーキテクチャの組み合わせ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LinuxAmd64,
    LinuxArm64,
    LinuxArmV7,
    LinuxArmV6,
    Linux386,
    LinuxPpc64le,
    LinuxS390x,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::LinuxAmd64,
        Platform::LinuxArm64,
        Platform::LinuxArmV7,
        Platform::LinuxArmV6,
        Platform::Linux386,
        Platform::LinuxPpc64le,
        Platform::LinuxS390x,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinuxAmd64 => "linux/amd64",
            Platform::LinuxArm64 => "linux/arm64",
            Platform::LinuxArmV7 => "linux/arm/v7",
            Platform::LinuxArmV6 => "linux/arm/v6",
            Platform::Linux386 => "linux/386",
            Platform::LinuxPpc64le => "linux/ppc64le",
            Platform::LinuxS390x => "linux/s390x",
        }
    }

    /// エラーメッセージ用のサポート対象一覧
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PlanError::UnsupportedPlatform {
                value: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_platforms() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
        assert_eq!(
            "linux/arm/v7".parse::<Platform>().unwrap(),
            Platform::LinuxArmV7
        );
    }

    #[test]
    fn test_parse_unsupported_platform_lists_all() {
        let err = "windows/amd64".parse::<Platform>().unwrap_err();
        match err {
            PlanError::UnsupportedPlatform { value, supported } => {
                assert_eq!(value, "windows/amd64");
                assert!(supported.contains("linux/amd64"));
                assert!(supported.contains("linux/arm/v6"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_is_exact_match() {
        assert!("linux/ARM64".parse::<Platform>().is_err());
        assert!("arm64".parse::<Platform>().is_err());
        assert!("".parse::<Platform>().is_err());
    }
}
