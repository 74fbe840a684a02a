//! `javamp translate`: rewrite each unit and emit the result.

use std::fs;
use std::path::Path;

use anyhow::Context;

use javamp_translate::{Config, Error, translate_unit};

use super::{display_path, printer};
use crate::cli::TranslateParams;

/// Returns whether every unit translated cleanly. Failed units are reported
/// and the remaining files still get processed.
pub fn run(params: TranslateParams) -> anyhow::Result<bool> {
    let config = Config {
        default_num_threads: params.threads,
    };
    let mut all_ok = true;
    for path in &params.files {
        if let Err(e) = translate_file(path, &config, params.out_dir.as_deref()) {
            all_ok = false;
            log::error!("{}: {e:#}", path.display());
        }
    }
    Ok(all_ok)
}

fn translate_file(path: &Path, config: &Config, out_dir: Option<&Path>) -> anyhow::Result<()> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let origin = display_path(path);
    match translate_unit(&source, config) {
        Ok((translation, diags)) => {
            if !diags.is_empty() {
                eprint!("{}", printer(&source, &origin).render(&diags));
            }
            match out_dir {
                Some(dir) => {
                    fs::create_dir_all(dir)
                        .with_context(|| format!("creating {}", dir.display()))?;
                    let target = dir.join(path.file_name().unwrap_or(path.as_os_str()));
                    fs::write(&target, &translation.text)
                        .with_context(|| format!("writing {}", target.display()))?;
                    log::info!("wrote {}", target.display());
                }
                None => print!("{}", translation.text),
            }
            Ok(())
        }
        Err(Error::Translate(diags)) => {
            eprint!("{}", printer(&source, &origin).render(&diags));
            anyhow::bail!("translation failed with {} errors", diags.error_count())
        }
        Err(e) => Err(e.into()),
    }
}
