mod cli;
mod config;
mod copy;
mod db;
mod sql;
mod tables;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Tables(args) => {
            db::init_logging(args.common.verbose);
            tables::run(args).await
        }
        cli::Command::Sql(args) => {
            db::init_logging(args.common.verbose);
            sql::run(args).await
        }
        cli::Command::Copy(args) => {
            db::init_logging(args.common.verbose);
            copy::run(args).await
        }
    }
}
