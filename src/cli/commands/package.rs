//! cli::commands::package
//!
//! The `package` namespace and its `build` command.

use std::sync::Arc;

use crate::build::{build_package, BuildPackage};
use crate::compiler::CompilerAdapter;
use crate::engine::{CommandDescriptor, HandlerContext, OptionSpec};
use crate::fs::Fs;

const DEFAULT_OUT_DIR_NAME: &str = ".package";
const DEFAULT_TSCONFIG_FILE_NAME: &str = "tsconfig.json";

pub const OUT_DIR: &str = "out-dir";
pub const TSCONFIG: &str = "tsconfig";

/// `package`: groups package commands, does nothing on its own.
pub fn package_command(fs: Arc<dyn Fs>, compiler: Arc<dyn CompilerAdapter>) -> CommandDescriptor {
    let build = build_command(fs, compiler);
    CommandDescriptor::new("package")
        .description("Commands for working with NPM packages")
        .builder(move |ctx| ctx.descend.command(ctx.node, build.clone()))
}

/// `package build`: stage and compile the package in `work-dir`.
pub fn build_command(fs: Arc<dyn Fs>, compiler: Arc<dyn CompilerAdapter>) -> CommandDescriptor {
    CommandDescriptor::new("build")
        .description("Compiles and bundles source files into a distributable NPM package")
        .builder(|ctx| {
            ctx.node
                .option(
                    OptionSpec::path(OUT_DIR)
                        .short('o')
                        .description("The directory where the package will be built")
                        .default_value(DEFAULT_OUT_DIR_NAME)
                        .default_description(format!("<work-dir>/{}", DEFAULT_OUT_DIR_NAME)),
                )?
                .option(
                    OptionSpec::path(TSCONFIG)
                        .short('c')
                        .description("The path to the tsconfig.json file to use for compilation")
                        .default_value(DEFAULT_TSCONFIG_FILE_NAME)
                        .default_description(format!("<work-dir>/{}", DEFAULT_TSCONFIG_FILE_NAME)),
                )
        })
        .handler(move |ctx| build(ctx, Arc::clone(&fs), Arc::clone(&compiler)))
}

async fn build(
    ctx: HandlerContext,
    fs: Arc<dyn Fs>,
    compiler: Arc<dyn CompilerAdapter>,
) -> anyhow::Result<()> {
    let args = ctx.args;
    build_package(BuildPackage {
        work_dir: args.work_dir().to_path_buf(),
        out_dir: args.path(OUT_DIR)?.to_path_buf(),
        ts_config: args.path(TSCONFIG)?.to_path_buf(),
        log: ctx.services.log,
        fs,
        compiler,
    })
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::MockCompiler;
    use crate::fs::LocalFs;

    #[test]
    fn package_is_a_namespace() {
        let package = package_command(Arc::new(LocalFs::new()), Arc::new(MockCompiler::new()));
        assert_eq!(package.name(), "package");
        assert!(!package.has_handler());
    }

    #[test]
    fn build_has_a_handler() {
        let build = build_command(Arc::new(LocalFs::new()), Arc::new(MockCompiler::new()));
        assert_eq!(build.name(), "build");
        assert!(build.has_handler());
    }
}
