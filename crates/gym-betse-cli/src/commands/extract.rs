use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueHint};
use gym_betse_params::{ConfigDocument, Field, extract_path};

use crate::{print_info, print_warn};

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Configuration document to read.
    #[clap(value_hint = ValueHint::FilePath)]
    pub document: PathBuf,
    /// Path expressions, e.g. `config/variable settings/temperature`.
    #[clap(required = true, num_args = 1..)]
    pub paths: Vec<String>,
}

pub(crate) fn handle_command(args: ExtractArgs) -> anyhow::Result<()> {
    let document = ConfigDocument::load(&args.document)
        .with_context(|| format!("Failed to load {}", args.document.display()))?;

    for text in &args.paths {
        let field: Field = text.parse()?;
        match field {
            Field::SampleId => {
                print_info!("{text}: {}", document.sample_id().unwrap_or_default());
            }
            Field::Path(path) => match extract_path(&document, &path)? {
                Some(extracted) if !extracted.is_empty() => {
                    for (key, value) in extracted.iter() {
                        print_info!("{key}: {}", serde_json::to_string(value)?);
                    }
                }
                Some(_) => {
                    print_warn!("'{path}' not found");
                }
                None => {
                    print_warn!("No '{}' document for '{path}'", path.root_selector());
                }
            },
        }
    }
    Ok(())
}
