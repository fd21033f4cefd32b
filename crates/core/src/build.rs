/// Build metadata captured at compile time and injected into anything that
/// reports it. Values the build pipeline does not provide render as
/// `"unknown"` rather than failing the build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub os_arch: &'static str,
    pub rustc_version: &'static str,
    pub build_date: &'static str,
}

const UNKNOWN: &str = "unknown";

impl BuildInfo {
    /// Capture build metadata from compile-time environment. The commit,
    /// target, compiler, and date values are injected by CI through
    /// `SCHEMAWATCH_*` env vars at build time.
    pub fn capture() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("SCHEMAWATCH_COMMIT").unwrap_or(UNKNOWN),
            os_arch: option_env!("SCHEMAWATCH_OS_ARCH").unwrap_or(UNKNOWN),
            rustc_version: option_env!("SCHEMAWATCH_RUSTC_VERSION").unwrap_or(UNKNOWN),
            build_date: option_env!("SCHEMAWATCH_BUILD_DATE").unwrap_or(UNKNOWN),
        }
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "version={} commit={} os-arch={} rustc={} build-date={}",
            self.version, self.commit, self.os_arch, self.rustc_version, self.build_date
        )
    }
}

#[cfg(test)]
mod tests {
    use super::BuildInfo;

    #[test]
    fn capture_always_has_a_package_version() {
        let info = BuildInfo::capture();
        assert!(!info.version.is_empty());
    }

    #[test]
    fn display_includes_every_field() {
        let info = BuildInfo {
            version: "1.2.3",
            commit: "abc1234",
            os_arch: "linux/amd64",
            rustc_version: "1.75.0",
            build_date: "2026-08-01",
        };
        let rendered = info.to_string();
        assert!(rendered.contains("version=1.2.3"));
        assert!(rendered.contains("commit=abc1234"));
        assert!(rendered.contains("build-date=2026-08-01"));
    }
}
