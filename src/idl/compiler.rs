use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{GenError, Result};

/// Command-line arguments for one compiler invocation.
pub fn compiler_args(
    include_paths: &[PathBuf],
    plugins: &[String],
    out_dir: &Path,
    idl_file: &Path,
) -> Vec<OsString> {
    let mut args = Vec::with_capacity(include_paths.len() + plugins.len() + 1);
    for inc in include_paths {
        let mut arg = OsString::from("--proto_path=");
        arg.push(inc);
        args.push(arg);
    }
    for plugin in plugins {
        let mut arg = OsString::from(format!("--{plugin}_out="));
        arg.push(out_dir);
        args.push(arg);
    }
    args.push(idl_file.as_os_str().to_os_string());
    args
}

/// Run the external IDL compiler over `idl_file`, writing bindings into
/// `out_dir`.
///
/// The call blocks until the compiler exits. Stdout and stderr are captured
/// and returned inside [`GenError::CompilerFailed`] on a non-zero exit.
pub fn compile(
    compiler: &Path,
    include_paths: &[PathBuf],
    plugins: &[String],
    idl_file: &Path,
    out_dir: &Path,
) -> Result<()> {
    let args = compiler_args(include_paths, plugins, out_dir, idl_file);
    debug!(compiler = %compiler.display(), ?args, "running IDL compiler");

    let output = Command::new(compiler)
        .args(&args)
        .output()
        .map_err(|source| match source.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => GenError::CompilerNotFound {
                program: compiler.display().to_string(),
                source,
            },
            _ => GenError::io("run IDL compiler", compiler, source),
        })?;

    if !output.status.success() {
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(GenError::CompilerFailed {
            program: compiler.display().to_string(),
            idl: idl_file.to_path_buf(),
            code: output.status.code(),
            output: text.trim_end().to_string(),
        });
    }
    info!(idl = %idl_file.display(), out = %out_dir.display(), "compiled IDL bindings");
    Ok(())
}
