use crate::cli::RunArgs;
use crate::config::NetworkFile;
use crate::error::Result;
use chemsim::core::ids::ReactionId;
use chemsim::engine::config::RunLimit;
use chemsim::engine::network::ReactionNetwork;
use chemsim::workflows::simulate::{self, SimulationSummary};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let network_file = NetworkFile::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = network_file.merge_with_cli(&args)?;

    info!("Building reaction network from {:?}", &args.config);
    let mut network = network_file.build_network(&config.network)?;

    if args.print_events {
        let names = reaction_names(&network);
        network.subscribe_all(move |event| {
            let name = names.get(&event.reaction).map_or("?", String::as_str);
            println!("{:>14.6}  {}", event.time, name);
        });
    }

    println!(
        "Simulating {} with the {} scheduler...",
        args.config.display(),
        config.network.scheduler
    );
    let summary = simulate::run(&mut network, config.limit)?;
    print!("{}", SummaryReport(&summary));
    Ok(())
}

fn reaction_names(network: &ReactionNetwork) -> HashMap<ReactionId, String> {
    network
        .reactions()
        .map(|(id, reaction)| {
            let name = match reaction.label() {
                Some(label) => label.to_string(),
                None => network
                    .display_reaction(id)
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            };
            (id, name)
        })
        .collect()
}

struct SummaryReport<'a>(&'a SimulationSummary);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let limit = match summary.limit {
            RunLimit::Steps(steps) => format!("{} steps", steps),
            RunLimit::Until(until) => format!("t = {}", until),
        };
        let outcome = if summary.exhausted {
            "exhausted (no reaction can fire)"
        } else {
            "completed"
        };

        writeln!(f, "{:<18}{}", "Scheduler:", summary.scheduler)?;
        writeln!(f, "{:<18}{}", "Limit:", limit)?;
        writeln!(
            f,
            "{:<18}{:.6} -> {:.6}",
            "Simulated time:", summary.start_time, summary.end_time
        )?;
        writeln!(f, "{:<18}{}", "Reactions fired:", summary.steps)?;
        writeln!(f, "{:<18}{}", "Outcome:", outcome)?;

        let name_width = summary
            .species
            .iter()
            .map(|s| s.name.len())
            .chain(summary.reactions.iter().map(|r| r.description.len()))
            .max()
            .unwrap_or(0)
            .max(8)
            + 2;

        writeln!(f)?;
        writeln!(f, "{:<width$}{}", "Species", "Copy number", width = name_width)?;
        for species in &summary.species {
            writeln!(f, "{:<width$}{}", species.name, species.copy_number, width = name_width)?;
        }

        writeln!(f)?;
        writeln!(f, "{:<width$}{}", "Reaction", "Firings", width = name_width)?;
        for reaction in &summary.reactions {
            writeln!(f, "{:<width$}{}", reaction.description, reaction.firings, width = name_width)?;
        }
        Ok(())
    }
}
