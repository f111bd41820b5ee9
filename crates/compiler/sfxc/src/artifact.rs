use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sfxir::serialize::{DecodeError, EncodeError};
use sfxir::{binding_table_file_name, BindingTable, SHADER_FOLDER};
use thiserror::Error;
use tracing::{debug, info};

use crate::compiler::CompileOutput;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("failed to load `{}`: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The directory under `resources` that holds the artifacts of every backend.
pub fn shader_dir(resources: &Path) -> PathBuf {
    resources.join(SHADER_FOLDER)
}

/// The path of the binding table file of `backend` under `resources`.
pub fn binding_table_path(resources: &Path, backend: &str) -> PathBuf {
    shader_dir(resources).join(binding_table_file_name(backend))
}

/// Loads a previously written binding table, if the file exists.
pub fn load_binding_table(path: &Path) -> Result<Option<BindingTable>, ArtifactError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(path)(err)),
    };

    let table = BindingTable::from_bytes(&bytes).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(table))
}

/// Writes the binding table and the debug artifacts of `output` to the shader directory.
///
/// Returns the path of the binding table file.
pub fn write_artifacts(
    resources: &Path,
    backend: &str,
    output: &CompileOutput,
) -> Result<PathBuf, ArtifactError> {
    let dir = shader_dir(resources);

    fs::create_dir_all(&dir).map_err(io_error(&dir))?;

    for artifact in &output.debug_artifacts {
        let path = dir.join(&artifact.file_name);

        debug!(path = %path.display(), "writing debug artifact");

        fs::write(&path, &artifact.text).map_err(io_error(&path))?;
    }

    let path = binding_table_path(resources, backend);
    let bytes = output.table.to_bytes()?;

    fs::write(&path, &bytes).map_err(io_error(&path))?;

    info!(path = %path.display(), bytes = bytes.len(), "wrote binding table");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DebugArtifact;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sfxc-{}-{}", name, std::process::id()));

        let _ = fs::remove_dir_all(&dir);

        dir
    }

    #[test]
    fn test_write_then_load() {
        let resources = scratch_dir("write-then-load");
        let mut table = BindingTable::new();

        table.bind_program("text_Main.vs-0", b"code".to_vec());

        let output = CompileOutput {
            table: table.clone(),
            debug_artifacts: vec![DebugArtifact {
                file_name: "text_Main-0.txt".to_string(),
                text: "source".to_string(),
            }],
        };

        let path = write_artifacts(&resources, "text", &output).unwrap();

        assert_eq!(path, resources.join("shaders").join("text_bindingTable.bin"));
        assert_eq!(load_binding_table(&path).unwrap(), Some(table));
        assert_eq!(
            fs::read_to_string(resources.join("shaders").join("text_Main-0.txt")).unwrap(),
            "source"
        );

        fs::remove_dir_all(&resources).unwrap();
    }

    #[test]
    fn test_load_missing_table() {
        let resources = scratch_dir("missing");

        assert_eq!(
            load_binding_table(&binding_table_path(&resources, "text")).unwrap(),
            None
        );
    }
}
