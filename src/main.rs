pub mod attributes;
pub mod cli;
pub mod config;
pub mod description;
pub mod emit;
pub mod error;
pub mod jq_exec;
pub mod model;
pub mod orchestrate;
pub mod path_de;
pub mod signature;
pub mod types;
pub mod walk;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();

    tracing_subscriber::fmt()
        .with_max_level(command_line_interface.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    command_line_interface.run()
}
