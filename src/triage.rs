use crate::config::Config;
use crate::error::RecResult;
use crate::github::Client;

/// Apply the configured triage label to every open PR that has no labels.
pub fn run(cfg: &Config) -> RecResult<()> {
    let client = Client::new(cfg)?;
    let label = &cfg.recommend.triage_label;

    let open = client.open_pulls()?;
    info!("{} open PRs to triage", open.len());

    let mut labelled = 0;
    for pull in open {
        if !pull.labels.is_empty() {
            continue;
        }

        ok_or_continue!(client.add_label(pull.number, label),
                        why => error!("unable to label #{}: {:?}", pull.number, why));
        info!("labelled #{} with {}", pull.number, label);
        labelled += 1;
    }

    info!("applied {} to {} unlabelled PRs", label, labelled);
    Ok(())
}
