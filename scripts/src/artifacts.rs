//! Resolution and parsing of Solidity compilation artifacts.
//!
//! Both the Hardhat layout (`artifacts/contracts/X.sol/X.json`, bytecode as a
//! hex string) and the Foundry layout (`out/X.sol/X.json`, bytecode as an
//! object with compiler metadata alongside) are understood. When a proxy contract
//! is not among the compiled artifacts, the creation code bundled with the crate
//! is used instead.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi},
    primitives::{hex, Bytes},
};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::SolidityConfig,
    constants::{
        ARTIFACT_EXTENSION, BUILD_INFO_DIR, DEBUG_ARTIFACT_SUFFIX, ERC1967_PROXY_ARTIFACT,
        ERC1967_PROXY_BYTECODE, TRANSPARENT_PROXY_ARTIFACT, TRANSPARENT_PROXY_BYTECODE,
    },
    errors::ScriptError,
    types::ProxyKind,
};

/// The bytecode field of an artifact
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat: a bare hex string
    Hex(String),
    /// Foundry: an object carrying its own link references
    Object {
        /// The hex-encoded bytecode
        object: String,
        /// Unresolved library references
        #[serde(default, rename = "linkReferences")]
        link_references: BTreeMap<String, Value>,
    },
}

/// An artifact as it appears on disk
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: RawBytecode,
    /// Hardhat's top-level library references
    #[serde(default)]
    link_references: BTreeMap<String, Value>,
    /// Hardhat's source file of the contract
    #[serde(default)]
    source_name: Option<String>,
    /// Foundry's solc metadata
    #[serde(default)]
    metadata: Option<Value>,
}

/// A compiled contract ready for deployment
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The file the artifact was read from
    pub path: PathBuf,
    /// The source file the contract was compiled from, when the artifact records it
    pub source: Option<String>,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode
    pub bytecode: Bytes,
    /// The compiler version and optimizer settings, when the artifact records them
    pub compiler: Option<CompilerMetadata>,
    /// The solc metadata, when the artifact carries it
    pub metadata: Option<Value>,
}

/// The compiler settings an artifact was built with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerMetadata {
    /// The full compiler version, e.g. `0.8.26+commit.8a97fa7a`
    pub version: String,
    /// Whether the optimizer was enabled
    pub optimizer_enabled: bool,
    /// The number of optimizer runs
    pub optimizer_runs: u64,
}

/// The input of an explorer source verification request
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationInput {
    /// The solc standard JSON input the contract was compiled from
    pub standard_json: Value,
    /// The fully qualified contract name, `path/File.sol:Name`
    pub contract_name: String,
    /// The full compiler version, e.g. `0.8.26+commit.8a97fa7a`
    pub compiler_version: String,
}

/// A Hardhat debug file, pointing at the build info of its artifact
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    /// The build info path, relative to the debug file
    build_info: PathBuf,
}

/// A Hardhat build info file
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    /// The full compiler version
    solc_long_version: String,
    /// The standard JSON input of the compilation
    input: Value,
}

/// The contract part of a possibly fully qualified contract name
pub fn contract_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, contract)| contract)
}

/// Find and parse the artifact of the named contract under the artifacts directory.
///
/// The name may be fully qualified (`contracts/Factory.sol:Factory`) to pick one
/// of several contracts sharing a name. The source path is matched against the
/// source the artifact records, so both `contracts/X.sol:X` against Hardhat's
/// `contracts/X.sol/X.json` and `src/X.sol:X` against Foundry's `out/X.sol/X.json`
/// resolve.
pub fn resolve_artifact(artifacts_dir: &Path, name: &str) -> Result<ContractArtifact, ScriptError> {
    let source = name.rsplit_once(':').map(|(source, _)| Path::new(source));
    let contract = contract_name(name);

    if !artifacts_dir.is_dir() {
        return Err(ScriptError::ArtifactNotFound(format!(
            "artifacts directory {} does not exist, compile the contracts first",
            artifacts_dir.display()
        )));
    }

    let file_name = format!("{contract}.{ARTIFACT_EXTENSION}");
    let mut candidates = Vec::new();
    collect_candidates(artifacts_dir, &file_name, &mut candidates)?;
    if let Some(source) = source {
        // Both layouts name the artifact directory after the source file
        candidates.retain(|path| {
            let dir = path.parent().and_then(Path::file_name);
            dir.is_some() && dir == source.file_name()
        });
    }

    let mut artifacts = candidates
        .iter()
        .map(|path| parse_artifact_file(path, contract))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(source) = source {
        artifacts.retain(|artifact| match &artifact.source {
            Some(recorded) => Path::new(recorded).ends_with(source),
            None => artifact.path.parent().is_some_and(|dir| dir.ends_with(source)),
        });
    }

    // Identical copies of one contract (e.g. a proxy compiled twice) are not ambiguous
    let distinct = artifacts.iter().map(|artifact| &artifact.bytecode).unique().count();
    if distinct > 1 {
        return Err(ScriptError::ArtifactParsing(format!(
            "`{name}` is ambiguous, found {}; use a fully qualified name",
            artifacts.iter().map(|artifact| artifact.path.display().to_string()).join(", ")
        )));
    }

    match artifacts.into_iter().next() {
        None => Err(ScriptError::ArtifactNotFound(format!(
            "no artifact for `{name}` under {}",
            artifacts_dir.display()
        ))),
        Some(artifact) => {
            debug!(contract = name, path = %artifact.path.display(), "resolved artifact");
            Ok(artifact)
        }
    }
}

/// The creation code of the proxy for the given pattern.
///
/// A compiled proxy artifact in the artifacts directory is preferred; without one
/// the bundled creation code is used.
pub fn proxy_creation_code(artifacts_dir: &Path, kind: ProxyKind) -> Result<Bytes, ScriptError> {
    let (name, bundled) = match kind {
        ProxyKind::Transparent => (TRANSPARENT_PROXY_ARTIFACT, TRANSPARENT_PROXY_BYTECODE),
        ProxyKind::Uups => (ERC1967_PROXY_ARTIFACT, ERC1967_PROXY_BYTECODE),
    };

    match resolve_artifact(artifacts_dir, name) {
        Ok(artifact) => {
            debug!(proxy = name, path = %artifact.path.display(), "using compiled proxy");
            Ok(artifact.bytecode)
        }
        Err(ScriptError::ArtifactNotFound(_)) => {
            debug!(proxy = name, "using bundled proxy");
            hex::decode(bundled.trim())
                .map(Bytes::from)
                .map_err(|e| ScriptError::ArtifactParsing(format!("bundled `{name}`: {e}")))
        }
        Err(e) => Err(e),
    }
}

/// Recursively collect files with the given name, skipping build info and debug files
fn collect_candidates(
    dir: &Path,
    file_name: &str,
    out: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
    for entry in entries {
        let path = entry.map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?.path();
        if path.is_dir() {
            if !path.ends_with(BUILD_INFO_DIR) {
                collect_candidates(&path, file_name, out)?;
            }
            continue;
        }

        let matches = path.file_name().is_some_and(|name| name == file_name);
        let is_debug = path.to_string_lossy().ends_with(DEBUG_ARTIFACT_SUFFIX);
        if matches && !is_debug {
            out.push(path);
        }
    }

    Ok(())
}

/// Parse a single artifact file
pub fn parse_artifact_file(path: &Path, name: &str) -> Result<ContractArtifact, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;
    let raw: RawArtifact = serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

    let (object, mut link_references) = match raw.bytecode {
        RawBytecode::Hex(object) => (object, BTreeMap::new()),
        RawBytecode::Object { object, link_references } => (object, link_references),
    };
    link_references.extend(raw.link_references);
    if !link_references.is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "`{name}` needs library linking ({}), which is not supported",
            link_references.keys().join(", ")
        )));
    }

    let bytecode = hex::decode(object.trim())
        .map_err(|e| ScriptError::ArtifactParsing(format!("`{name}` bytecode: {e}")))?;
    if bytecode.is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "`{name}` has no bytecode, it is abstract or an interface"
        )));
    }

    let source = raw.source_name.or_else(|| {
        let targets = raw.metadata.as_ref()?.pointer("/settings/compilationTarget")?.as_object()?;
        targets.iter().find(|(_, target)| target.as_str() == Some(name)).map(|(src, _)| src.clone())
    });

    Ok(ContractArtifact {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
        abi: raw.abi,
        bytecode: bytecode.into(),
        compiler: raw.metadata.as_ref().and_then(compiler_metadata),
        metadata: raw.metadata,
    })
}

/// Extract the compiler settings from solc metadata
fn compiler_metadata(metadata: &Value) -> Option<CompilerMetadata> {
    let version = metadata.pointer("/compiler/version")?.as_str()?.to_string();
    let optimizer = metadata.pointer("/settings/optimizer")?;

    Some(CompilerMetadata {
        version,
        optimizer_enabled: optimizer.get("enabled")?.as_bool()?,
        optimizer_runs: optimizer.get("runs")?.as_u64()?,
    })
}

impl ContractArtifact {
    /// Check the recorded compiler settings, if any, against the configured ones
    pub fn check_compiler(&self, expected: &SolidityConfig) -> Result<(), ScriptError> {
        let Some(compiler) = &self.compiler else {
            return Ok(());
        };

        let version_matches = compiler
            .version
            .strip_prefix(expected.version.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('+'));
        if !version_matches {
            return Err(ScriptError::CompilerMismatch(format!(
                "`{}` built with solc {}, expected {}",
                self.name, compiler.version, expected.version
            )));
        }

        let optimizer = &expected.optimizer;
        let runs_match = !optimizer.enabled || compiler.optimizer_runs == optimizer.runs;
        if compiler.optimizer_enabled != optimizer.enabled || !runs_match {
            return Err(ScriptError::CompilerMismatch(format!(
                "`{}` built with optimizer enabled={} runs={}, expected enabled={} runs={}",
                self.name,
                compiler.optimizer_enabled,
                compiler.optimizer_runs,
                optimizer.enabled,
                optimizer.runs
            )));
        }

        Ok(())
    }

    /// The proxy pattern the implementation supports.
    ///
    /// UUPS implementations carry their own upgrade entrypoint.
    pub fn proxy_kind(&self) -> ProxyKind {
        if self.abi.function("upgradeToAndCall").is_some()
            && self.abi.function("proxiableUUID").is_some()
        {
            ProxyKind::Uups
        } else {
            ProxyKind::Transparent
        }
    }

    /// Encode a call to the initializer run through the proxy on deployment.
    ///
    /// With no explicit initializer, a contract without an `initialize` function
    /// and no arguments gets empty calldata.
    pub fn initializer_calldata(
        &self,
        initializer: Option<&str>,
        default: &str,
        args: &[String],
    ) -> Result<Bytes, ScriptError> {
        match initializer {
            Some(name) => self.encode_call(name, args),
            None if args.is_empty() && self.abi.function(default).is_none() => Ok(Bytes::new()),
            None => self.encode_call(default, args),
        }
    }

    /// The input of a source verification request for this contract.
    ///
    /// Hardhat artifacts lead to their build info through the debug file next to
    /// them. Foundry artifacts carry solc metadata, from which the input is rebuilt
    /// with the sources read from the project root, the parent of the artifacts
    /// directory.
    pub fn verification_input(
        &self,
        artifacts_dir: &Path,
    ) -> Result<VerificationInput, ScriptError> {
        let source = self.source.as_deref().ok_or_else(|| {
            ScriptError::ArtifactParsing(format!("`{}` records no source file", self.name))
        })?;
        let contract_name = format!("{source}:{}", self.name);

        let debug_path = self.path.with_extension(DEBUG_ARTIFACT_SUFFIX.trim_start_matches('.'));
        if debug_path.is_file() {
            let debug: DebugFile = read_json(&debug_path)?;
            let debug_dir = debug_path.parent().unwrap_or(artifacts_dir);
            let build_info: BuildInfo = read_json(&debug_dir.join(debug.build_info))?;
            return Ok(VerificationInput {
                standard_json: build_info.input,
                contract_name,
                compiler_version: build_info.solc_long_version,
            });
        }

        let (Some(metadata), Some(compiler)) = (&self.metadata, &self.compiler) else {
            return Err(ScriptError::ArtifactNotFound(format!(
                "no build info or metadata for `{}` at {}",
                self.name,
                self.path.display()
            )));
        };

        let project_root = artifacts_dir.parent().unwrap_or(Path::new(""));
        let standard_json = standard_json_from_metadata(metadata, project_root)?;
        Ok(VerificationInput {
            standard_json,
            contract_name,
            compiler_version: compiler.version.clone(),
        })
    }

    /// Encode a call to the named function, coercing each argument from its string form
    pub fn encode_call(&self, name: &str, args: &[String]) -> Result<Bytes, ScriptError> {
        let overloads = self.abi.function(name).ok_or_else(|| {
            ScriptError::CalldataConstruction(format!("`{}` has no function `{name}`", self.name))
        })?;
        let function = overloads.iter().find(|f| f.inputs.len() == args.len()).ok_or_else(|| {
            ScriptError::CalldataConstruction(format!(
                "`{}.{name}` takes {} argument(s), {} given",
                self.name,
                overloads.iter().map(|f| f.inputs.len()).join(" or "),
                args.len()
            ))
        })?;

        encode_function(function, args)
    }
}

/// Read and deserialize a JSON file
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ArtifactNotFound(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))
}

/// Rebuild the solc standard JSON input from a contract's metadata
fn standard_json_from_metadata(
    metadata: &Value,
    project_root: &Path,
) -> Result<Value, ScriptError> {
    let sources = metadata
        .get("sources")
        .and_then(Value::as_object)
        .ok_or_else(|| ScriptError::ArtifactParsing("metadata lists no sources".to_string()))?;

    let mut contents = serde_json::Map::new();
    for source in sources.keys() {
        let path = project_root.join(source);
        let content = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactNotFound(format!("{}: {e}", path.display())))?;
        contents.insert(source.clone(), serde_json::json!({ "content": content }));
    }

    let mut settings = metadata.get("settings").cloned().unwrap_or_else(|| serde_json::json!({}));
    if let Some(settings) = settings.as_object_mut() {
        settings.remove("compilationTarget");
    }

    Ok(serde_json::json!({
        "language": metadata.get("language").and_then(Value::as_str).unwrap_or("Solidity"),
        "sources": contents,
        "settings": settings,
    }))
}

/// Encode a call to a resolved function
fn encode_function(function: &Function, args: &[String]) -> Result<Bytes, ScriptError> {
    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
            ty.coerce_str(arg).map_err(|e| {
                ScriptError::CalldataConstruction(format!("argument `{}`: {e}", param.name))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    function
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        config::OptimizerConfig,
        constants::{IMPLEMENTATION_STORAGE_SLOT, PROXY_ADMIN_STORAGE_SLOT},
    };

    /// A factory ABI with a single-argument initializer
    const FACTORY_ABI: &str = r#"[
        {
            "type": "function",
            "name": "initialize",
            "inputs": [{ "name": "owner", "type": "address", "internalType": "address" }],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "walletCount",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }],
            "stateMutability": "view"
        }
    ]"#;

    /// The UUPS entrypoints
    const UUPS_ABI: &str = r#"[
        {
            "type": "function",
            "name": "upgradeToAndCall",
            "inputs": [
                { "name": "newImplementation", "type": "address", "internalType": "address" },
                { "name": "data", "type": "bytes", "internalType": "bytes" }
            ],
            "outputs": [],
            "stateMutability": "payable"
        },
        {
            "type": "function",
            "name": "proxiableUUID",
            "inputs": [],
            "outputs": [{ "name": "", "type": "bytes32", "internalType": "bytes32" }],
            "stateMutability": "view"
        }
    ]"#;

    /// Write a Hardhat-style artifact
    fn write_hardhat(root: &Path, source: &str, name: &str, abi: &str, bytecode: &str) {
        let dir = root.join("contracts").join(source);
        fs::create_dir_all(&dir).unwrap();
        let artifact = format!(
            r#"{{
                "_format": "hh-sol-artifact-1",
                "contractName": "{name}",
                "sourceName": "contracts/{source}",
                "abi": {abi},
                "bytecode": "{bytecode}",
                "deployedBytecode": "0x00",
                "linkReferences": {{}},
                "deployedLinkReferences": {{}}
            }}"#
        );
        fs::write(dir.join(format!("{name}.json")), artifact).unwrap();
        fs::write(dir.join(format!("{name}.dbg.json")), r#"{ "buildInfo": "x" }"#).unwrap();
    }

    /// Write a Foundry-style artifact with compiler metadata
    fn write_foundry(root: &Path, name: &str, version: &str, runs: u64) {
        let dir = root.join(format!("{name}.sol"));
        fs::create_dir_all(&dir).unwrap();
        let artifact = format!(
            r#"{{
                "abi": {FACTORY_ABI},
                "bytecode": {{ "object": "0x6080604052", "linkReferences": {{}} }},
                "deployedBytecode": {{ "object": "0x6080", "linkReferences": {{}} }},
                "metadata": {{
                    "compiler": {{ "version": "{version}" }},
                    "language": "Solidity",
                    "sources": {{ "src/{name}.sol": {{ "keccak256": "0x00", "urls": [] }} }},
                    "settings": {{
                        "compilationTarget": {{ "src/{name}.sol": "{name}" }},
                        "evmVersion": "paris",
                        "optimizer": {{ "enabled": true, "runs": {runs} }}
                    }}
                }}
            }}"#
        );
        fs::write(dir.join(format!("{name}.json")), artifact).unwrap();
    }

    /// The expected compiler settings
    fn solidity() -> SolidityConfig {
        SolidityConfig {
            version: "0.8.26".to_string(),
            optimizer: OptimizerConfig { enabled: true, runs: 200 },
        }
    }

    #[test]
    fn resolves_hardhat_artifact() {
        let dir = TempDir::new().unwrap();
        write_hardhat(
            dir.path(),
            "MultiSigWalletFactory.sol",
            "MultiSigWalletFactory",
            FACTORY_ABI,
            "0x6080604052",
        );
        fs::create_dir_all(dir.path().join("build-info")).unwrap();
        fs::write(dir.path().join("build-info").join("MultiSigWalletFactory.json"), "{}").unwrap();

        let artifact = resolve_artifact(dir.path(), "MultiSigWalletFactory").unwrap();
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(artifact.compiler.is_none());
        assert_eq!(artifact.proxy_kind(), ProxyKind::Transparent);
        artifact.check_compiler(&solidity()).unwrap();
    }

    #[test]
    fn missing_artifact_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = resolve_artifact(dir.path(), "MultiSigWalletFactory").unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactNotFound(_)));

        let err = resolve_artifact(&dir.path().join("missing"), "Anything").unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactNotFound(_)));
    }

    #[test]
    fn ambiguous_names_need_qualification() {
        let dir = TempDir::new().unwrap();
        write_hardhat(dir.path(), "A.sol", "Wallet", FACTORY_ABI, "0x6001");
        write_hardhat(dir.path(), "B.sol", "Wallet", FACTORY_ABI, "0x6002");

        let err = resolve_artifact(dir.path(), "Wallet").unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactParsing(_)));

        let artifact = resolve_artifact(dir.path(), "contracts/B.sol:Wallet").unwrap();
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x02]);
    }

    #[test]
    fn interfaces_and_unlinked_contracts_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_hardhat(dir.path(), "IWallet.sol", "IWallet", "[]", "0x");
        let err = resolve_artifact(dir.path(), "IWallet").unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactParsing(_)));

        let linked = dir.path().join("Linked.json");
        fs::write(
            &linked,
            r#"{
                "abi": [],
                "bytecode": { "object": "0x73__$abc$__", "linkReferences": { "lib/Math.sol": {} } }
            }"#,
        )
        .unwrap();
        let err = parse_artifact_file(&linked, "Linked").unwrap_err();
        assert!(err.to_string().contains("library linking"));
    }

    #[test]
    fn foundry_metadata_is_checked() {
        let dir = TempDir::new().unwrap();
        write_foundry(dir.path(), "MultiSigWalletFactory", "0.8.26+commit.8a97fa7a", 200);
        write_foundry(dir.path(), "OldFactory", "0.8.20+commit.a1b79de6", 200);
        write_foundry(dir.path(), "TunedFactory", "0.8.26+commit.8a97fa7a", 10_000);

        let artifact = resolve_artifact(dir.path(), "MultiSigWalletFactory").unwrap();
        artifact.check_compiler(&solidity()).unwrap();

        for name in ["OldFactory", "TunedFactory"] {
            let artifact = resolve_artifact(dir.path(), name).unwrap();
            let err = artifact.check_compiler(&solidity()).unwrap_err();
            assert!(matches!(err, ScriptError::CompilerMismatch(_)));
        }
    }

    #[test]
    fn initializer_calldata_is_encoded() {
        let dir = TempDir::new().unwrap();
        write_hardhat(dir.path(), "F.sol", "Factory", FACTORY_ABI, "0x6001");
        let artifact = resolve_artifact(dir.path(), "Factory").unwrap();

        let owner = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string();
        let data = artifact.initializer_calldata(None, "initialize", &[owner]).unwrap();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], &[0xc4, 0xd6, 0x6d, 0xe8]);
        assert_eq!(data[35], 0x66);

        let err = artifact.initializer_calldata(None, "initialize", &[]).unwrap_err();
        assert!(matches!(err, ScriptError::CalldataConstruction(_)));

        let err = artifact
            .initializer_calldata(None, "initialize", &["not-an-address".to_string()])
            .unwrap_err();
        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
    }

    #[test]
    fn missing_default_initializer_means_no_calldata() {
        let dir = TempDir::new().unwrap();
        write_hardhat(dir.path(), "U.sol", "Upgradeable", UUPS_ABI, "0x6001");
        let artifact = resolve_artifact(dir.path(), "Upgradeable").unwrap();

        assert_eq!(artifact.proxy_kind(), ProxyKind::Uups);
        assert!(artifact.initializer_calldata(None, "initialize", &[]).unwrap().is_empty());
        assert!(artifact.initializer_calldata(Some("initialize"), "initialize", &[]).is_err());
    }

    #[test]
    fn foundry_qualified_names_resolve() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        write_foundry(&out, "MultiSigWalletFactory", "0.8.26+commit.8a97fa7a", 200);

        for name in [
            "src/MultiSigWalletFactory.sol:MultiSigWalletFactory",
            "MultiSigWalletFactory.sol:MultiSigWalletFactory",
        ] {
            let artifact = resolve_artifact(&out, name).unwrap();
            assert_eq!(artifact.name, "MultiSigWalletFactory");
            assert_eq!(artifact.source.as_deref(), Some("src/MultiSigWalletFactory.sol"));
        }

        let err = resolve_artifact(&out, "lib/MultiSigWalletFactory.sol:MultiSigWalletFactory")
            .unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactNotFound(_)));
    }

    #[test]
    fn qualified_names_share_the_contract_name() {
        assert_eq!(contract_name("contracts/F.sol:Factory"), "Factory");
        assert_eq!(contract_name("Factory"), "Factory");

        let dir = TempDir::new().unwrap();
        write_hardhat(dir.path(), "F.sol", "Factory", FACTORY_ABI, "0x6001");
        let artifact = resolve_artifact(dir.path(), "contracts/F.sol:Factory").unwrap();
        assert_eq!(artifact.name, "Factory");
        assert_eq!(artifact.source.as_deref(), Some("contracts/F.sol"));
    }

    /// Whether the code holds the given byte string
    fn contains(code: &[u8], needle: &[u8]) -> bool {
        code.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn bundled_proxies_are_used_without_artifacts() {
        let dir = TempDir::new().unwrap();
        write_hardhat(dir.path(), "F.sol", "Factory", FACTORY_ABI, "0x6001");

        let upgrade_to_and_call = [0x4f, 0x1e, 0xf2, 0x86];
        let upgrade_and_call = [0x96, 0x23, 0x60, 0x9d];

        for kind in [ProxyKind::Transparent, ProxyKind::Uups] {
            let code = proxy_creation_code(dir.path(), kind).unwrap();
            // The constructor copies its arguments from the end of the creation code
            assert_eq!(code[0], 0x61);
            assert_eq!(u16::from_be_bytes([code[1], code[2]]) as usize, code.len());
            assert!(contains(&code, IMPLEMENTATION_STORAGE_SLOT.as_slice()));
        }

        let transparent = proxy_creation_code(dir.path(), ProxyKind::Transparent).unwrap();
        assert!(contains(&transparent, PROXY_ADMIN_STORAGE_SLOT.as_slice()));
        assert!(contains(&transparent, &upgrade_to_and_call));
        assert!(contains(&transparent, &upgrade_and_call));

        let erc1967 = proxy_creation_code(&dir.path().join("missing"), ProxyKind::Uups).unwrap();
        assert!(!contains(&erc1967, PROXY_ADMIN_STORAGE_SLOT.as_slice()));
    }

    #[test]
    fn compiled_proxies_take_precedence() {
        let dir = TempDir::new().unwrap();
        write_hardhat(
            dir.path(),
            "TransparentUpgradeableProxy.sol",
            TRANSPARENT_PROXY_ARTIFACT,
            "[]",
            "0x6001",
        );

        let transparent = proxy_creation_code(dir.path(), ProxyKind::Transparent).unwrap();
        assert_eq!(transparent.as_ref(), &[0x60, 0x01]);

        let erc1967 = proxy_creation_code(dir.path(), ProxyKind::Uups).unwrap();
        assert!(erc1967.len() > 2);
    }

    #[test]
    fn hardhat_verification_input_follows_build_info() {
        let dir = TempDir::new().unwrap();
        write_hardhat(dir.path(), "F.sol", "Factory", FACTORY_ABI, "0x6001");
        let artifact = resolve_artifact(dir.path(), "Factory").unwrap();

        // The placeholder debug file points nowhere
        let err = artifact.verification_input(dir.path()).unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactNotFound(_)));

        let debug = dir.path().join("contracts").join("F.sol").join("Factory.dbg.json");
        fs::write(
            debug,
            r#"{ "_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/abc.json" }"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("build-info")).unwrap();
        fs::write(
            dir.path().join("build-info").join("abc.json"),
            r#"{
                "_format": "hh-sol-build-info-1",
                "solcVersion": "0.8.26",
                "solcLongVersion": "0.8.26+commit.8a97fa7a",
                "input": {
                    "language": "Solidity",
                    "sources": { "contracts/F.sol": { "content": "contract Factory {}" } },
                    "settings": { "optimizer": { "enabled": true, "runs": 200 } }
                },
                "output": {}
            }"#,
        )
        .unwrap();

        let input = artifact.verification_input(dir.path()).unwrap();
        assert_eq!(input.contract_name, "contracts/F.sol:Factory");
        assert_eq!(input.compiler_version, "0.8.26+commit.8a97fa7a");
        assert_eq!(
            input.standard_json.pointer("/sources/contracts~1F.sol/content"),
            Some(&Value::from("contract Factory {}"))
        );
    }

    #[test]
    fn foundry_verification_input_reads_sources() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        write_foundry(&out, "MultiSigWalletFactory", "0.8.26+commit.8a97fa7a", 200);
        let artifact = resolve_artifact(&out, "MultiSigWalletFactory").unwrap();

        let err = artifact.verification_input(&out).unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactNotFound(_)));

        fs::create_dir_all(dir.path().join("src")).unwrap();
        let source = "contract MultiSigWalletFactory {}";
        fs::write(dir.path().join("src").join("MultiSigWalletFactory.sol"), source).unwrap();

        let input = artifact.verification_input(&out).unwrap();
        assert_eq!(input.contract_name, "src/MultiSigWalletFactory.sol:MultiSigWalletFactory");
        assert_eq!(input.compiler_version, "0.8.26+commit.8a97fa7a");

        let json = &input.standard_json;
        assert_eq!(json["language"], "Solidity");
        assert_eq!(json["sources"]["src/MultiSigWalletFactory.sol"]["content"], source);
        assert_eq!(json["settings"]["optimizer"]["runs"], 200);
        assert!(json["settings"].get("compilationTarget").is_none());
    }
}
