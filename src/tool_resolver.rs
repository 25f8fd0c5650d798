//! # Tool Path Resolver
//!
//! Trova i tool di ottimizzazione esterni usati dal backend a riga di comando:
//! - Directory di tool bundled (`MEDIA_MINIFY_TOOLS_DIR`)
//! - Tool installati nel PATH di sistema

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a directory of bundled tools
pub const TOOLS_DIR_ENV: &str = "MEDIA_MINIFY_TOOLS_DIR";

/// Tool path resolver for bundled and system-installed tools
#[derive(Debug, Clone, Default)]
pub struct ToolResolver {
    /// Base directory where tools are bundled
    tools_dir: Option<PathBuf>,
}

impl ToolResolver {
    /// Create a resolver, picking up the bundled tools directory from the environment
    pub fn new() -> Self {
        let tools_dir = env::var_os(TOOLS_DIR_ENV)
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());

        if let Some(ref dir) = tools_dir {
            debug!("Found tools directory via {}: {:?}", TOOLS_DIR_ENV, dir);
        }

        Self { tools_dir }
    }

    /// Create a resolver that looks in `tools_dir` before the system PATH
    pub fn with_tools_dir(tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: Some(tools_dir.into()),
        }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = Self::find_bundled(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        let system = Self::find_in_system_path(tool_name);
        if system.is_none() {
            debug!("Tool not found: {}", tool_name);
        }
        system
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }

    /// Get all available tools among `candidates`
    pub fn available_tools(&self, candidates: &[&str]) -> Vec<String> {
        candidates
            .iter()
            .filter(|tool| self.is_tool_available(tool))
            .map(|tool| tool.to_string())
            .collect()
    }

    fn executable_name(tool_name: &str) -> String {
        format!("{}{}", tool_name, env::consts::EXE_SUFFIX)
    }

    /// Bundled layouts: `tools/{os}/{tool}` or directly `tools/{tool}`
    fn find_bundled(tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let executable = Self::executable_name(tool_name);
        [
            tools_dir.join(env::consts::OS).join(&executable),
            tools_dir.join(&executable),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    /// Find tool in system PATH
    fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
        let executable = Self::executable_name(tool_name);
        env::split_paths(&env::var_os("PATH")?)
            .map(|dir| dir.join(&executable))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_tool_is_preferred() {
        let temp_dir = TempDir::new().unwrap();
        let tool = temp_dir.path().join(ToolResolver::executable_name("oxipng-test-tool"));
        std::fs::write(&tool, b"").unwrap();

        let resolver = ToolResolver::with_tools_dir(temp_dir.path());
        assert_eq!(resolver.resolve_tool("oxipng-test-tool"), Some(tool));
    }

    #[test]
    fn test_platform_subdirectory_layout() {
        let temp_dir = TempDir::new().unwrap();
        let platform_dir = temp_dir.path().join(env::consts::OS);
        std::fs::create_dir_all(&platform_dir).unwrap();
        let tool = platform_dir.join(ToolResolver::executable_name("jpegtran-test-tool"));
        std::fs::write(&tool, b"").unwrap();

        let resolver = ToolResolver::with_tools_dir(temp_dir.path());
        assert!(resolver.is_tool_available("jpegtran-test-tool"));
    }

    #[test]
    fn test_missing_tool() {
        let resolver = ToolResolver::with_tools_dir("/definitely/not/here");
        assert!(resolver.resolve_tool("no-such-minify-tool-xyz").is_none());
        assert!(resolver.available_tools(&["no-such-minify-tool-xyz"]).is_empty());
    }
}
