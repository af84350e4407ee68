use crate::cli::InspectArgs;
use crate::config::NetworkFile;
use crate::error::Result;
use chemsim::engine::config::NetworkConfig;
use chemsim::engine::network::ReactionNetwork;
use std::fmt;
use tracing::info;

struct SpeciesRow {
    name: String,
    copy_number: u64,
    upper_limit: Option<u64>,
}

struct ReactionRow {
    index: usize,
    rendered: String,
    label: Option<String>,
    propensity: f64,
    dependents: Vec<usize>,
}

/// A printable snapshot of a network's structure and initial propensities.
struct NetworkOverview {
    species: Vec<SpeciesRow>,
    reactions: Vec<ReactionRow>,
}

impl NetworkOverview {
    fn collect(network: &mut ReactionNetwork) -> Result<Self> {
        let species = network
            .species()
            .map(|(_, s)| SpeciesRow {
                name: s.name.clone(),
                copy_number: s.copy_number(),
                upper_limit: s.upper_limit(),
            })
            .collect();

        let ids: Vec<_> = network.reactions().map(|(id, _)| id).collect();
        let mut reactions = Vec::with_capacity(ids.len());
        for (index, &id) in ids.iter().enumerate() {
            let mut dependents: Vec<usize> = network
                .dependents(id)?
                .into_iter()
                .filter_map(|dep| ids.iter().position(|&r| r == dep))
                .map(|i| i + 1)
                .collect();
            dependents.sort_unstable();
            reactions.push(ReactionRow {
                index: index + 1,
                rendered: network
                    .display_reaction(id)
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                label: network.reaction(id).and_then(|r| r.label()).map(str::to_string),
                propensity: network.propensity(id)?,
                dependents,
            });
        }

        Ok(Self { species, reactions })
    }
}

impl fmt::Display for NetworkOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Species ({}):", self.species.len())?;
        for species in &self.species {
            write!(f, "  {:<12} n = {}", species.name, species.copy_number)?;
            if let Some(limit) = species.upper_limit {
                write!(f, " (limit {})", limit)?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f, "Reactions ({}):", self.reactions.len())?;
        for reaction in &self.reactions {
            write!(f, "  #{:<3} {}", reaction.index, reaction.rendered)?;
            if let Some(label) = &reaction.label {
                write!(f, " \"{}\"", label)?;
            }
            writeln!(f)?;
            writeln!(f, "       propensity = {}", reaction.propensity)?;
            if reaction.dependents.is_empty() {
                writeln!(f, "       dependents: none")?;
            } else {
                let deps: Vec<String> = reaction
                    .dependents
                    .iter()
                    .map(|i| format!("#{}", i))
                    .collect();
                writeln!(f, "       dependents: {}", deps.join(", "))?;
            }
        }
        Ok(())
    }
}

pub fn run(args: InspectArgs) -> Result<()> {
    let network_file = NetworkFile::from_file(&args.config)?;
    info!("Building reaction network from {:?}", &args.config);
    let mut network = network_file.build_network(&NetworkConfig::default())?;

    let overview = NetworkOverview::collect(&mut network)?;
    print!("{}", overview);
    Ok(())
}
