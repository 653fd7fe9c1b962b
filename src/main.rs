use anyhow::Result;
use panel_clean::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
