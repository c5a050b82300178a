use std::error::Error;

use clap::Parser;
use rnb_eval::{
    config::{Cli, OutputFormat},
    evaluation::Evaluator,
    labels::LabelIndex,
    logging,
};
use tracing::{debug, info};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    // Load the labels
    let label_index = LabelIndex::load(&cli.label_index)?;
    info!(labels = label_index.len(), path = %cli.label_index.display(), "loaded label index");

    // Loop over the results and fill the confusion matrix
    let mut evaluator = Evaluator::new(label_index, &cli.default_label, cli.key_label()?)?;
    evaluator.run_path(&cli.input)?;
    debug!("Classification results:\n{}", evaluator.analyzer());

    match cli.output_format {
        OutputFormat::Text => print!("{}", evaluator.analyzer()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&evaluator.finish())?),
    }

    Ok(())
}
