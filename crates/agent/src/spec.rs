//! Loading of the subsidy-search tool definition.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::AgentError;
use crate::runtime::ToolDescriptor;

/// Reads and parses an OpenAPI document from disk.
///
/// A missing or malformed file is a deployment defect: callers outside the
/// AI-content path let these errors propagate.
pub fn load_openapi_spec(path: &Path) -> Result<Value, AgentError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| AgentError::SpecNotFound { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw)
        .map_err(|source| AgentError::SpecParse { path: path.to_path_buf(), source })
}

/// Builds the subsidy-search tool from its OpenAPI document.
pub fn subsidies_tool(path: &Path) -> Result<ToolDescriptor, AgentError> {
    Ok(ToolDescriptor::SubsidySearch { spec: load_openapi_spec(path)? })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{load_openapi_spec, subsidies_tool};
    use crate::error::AgentError;
    use crate::runtime::ToolDescriptor;

    #[test]
    fn missing_spec_file_is_reported_with_its_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.json");

        let error = load_openapi_spec(&path).expect_err("error");
        assert!(matches!(error, AgentError::SpecNotFound { path: ref reported, .. } if *reported == path));
    }

    #[test]
    fn malformed_spec_file_is_a_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("subsidies.json");
        fs::write(&path, "not json at all").expect("write");

        let error = load_openapi_spec(&path).expect_err("error");
        assert!(matches!(error, AgentError::SpecParse { .. }));
    }

    #[test]
    fn valid_spec_becomes_a_subsidy_search_tool() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("subsidies.json");
        fs::write(
            &path,
            r#"{"openapi": "3.0.0", "info": {"title": "Subsidies API", "version": "1.0.0"}, "paths": {}}"#,
        )
        .expect("write");

        let tool = subsidies_tool(&path).expect("tool");
        let ToolDescriptor::SubsidySearch { spec } = tool else {
            panic!("expected subsidy-search tool");
        };
        assert_eq!(spec["info"]["title"], "Subsidies API");

        let definition = ToolDescriptor::SubsidySearch { spec }.definition();
        assert_eq!(definition["type"], "openapi");
        assert_eq!(definition["openapi"]["name"], "get_subsidies");
        assert_eq!(definition["openapi"]["auth"]["type"], "anonymous");
    }
}
