use std::error::Error;

use clap::Parser;
use lambda_pkg::{
    cli::{
        args::{CliArgs, Command},
        command_handlers,
    },
    config::LambdaPkgConfig,
    LambdaPkg,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = CliArgs::parse();
    let config = LambdaPkgConfig::load()?;

    let builder = LambdaPkg::builder()
        .target(&cli_args.target)
        .python(cli_args.python.or(config.python))
        .python_version(cli_args.python_version.or(config.python_version));

    match cli_args.cmd {
        Command::Install {
            requirements,
            requirement_files,
            exclude,
            include,
            no_default_excludes,
            replace_conflicting,
            index_url,
            find_links,
            offline,
            no_cache_dir,
            output_manifest,
        } => {
            let requirements =
                command_handlers::collect_requirements(&requirements, &requirement_files)?;
            let lambda_pkg = builder
                .excludes(command_handlers::build_excludes(
                    &exclude,
                    &include,
                    no_default_excludes,
                ))
                .index_url(index_url.or(config.index_url))
                .find_links(find_links)
                .offline(offline)
                .no_cache_dir(no_cache_dir)
                .try_build()?;
            command_handlers::do_install(
                &lambda_pkg,
                &requirements,
                replace_conflicting,
                output_manifest.as_deref(),
            )
        }
        Command::List => {
            let lambda_pkg = builder.try_build()?;
            command_handlers::do_list(&lambda_pkg)
        }
        Command::Excludes => {
            command_handlers::do_excludes();
            Ok(())
        }
    }
}
