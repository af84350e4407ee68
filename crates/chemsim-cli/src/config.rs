use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use chemsim::core::reaction::Reaction;
use chemsim::engine::config::{NetworkConfig, SimulationConfig, SimulationConfigBuilder};
use chemsim::engine::network::ReactionNetwork;
use chemsim::engine::scheduler::SchedulerKind;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const DEFAULT_SCHEDULER: SchedulerKind = SchedulerKind::NextReaction;
const DEFAULT_STEPS: u64 = 10_000;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSimulationConfig {
    scheduler: Option<SchedulerKind>,
    seed: Option<u64>,
    steps: Option<u64>,
    until: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSpecies {
    pub name: String,
    #[serde(default)]
    pub copy_number: u64,
    pub upper_limit: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileReaction {
    /// One entry per molecule: `["A", "A"]` is `2 A`.
    #[serde(default)]
    pub reactants: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    pub rate: f64,
    pub label: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

/// A reaction network as written in a TOML file.
///
/// ```toml
/// [simulation]
/// scheduler = "next-reaction"
/// seed = 42
/// steps = 1000
///
/// [[species]]
/// name = "A"
/// copy-number = 100
///
/// [[reactions]]
/// reactants = ["A", "A"]
/// products = ["B"]
/// rate = 0.5
/// ```
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NetworkFile {
    simulation: Option<PartialSimulationConfig>,
    #[serde(default)]
    pub species: Vec<FileSpecies>,
    #[serde(default)]
    pub reactions: Vec<FileReaction>,
}

impl NetworkFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading network description from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Combines the `[simulation]` table with command-line overrides.
    ///
    /// A step budget or horizon given on the command line replaces whichever
    /// limit the file sets.
    pub fn merge_with_cli(&self, args: &RunArgs) -> Result<SimulationConfig> {
        let file = self.simulation.clone().unwrap_or_default();

        let mut builder = SimulationConfigBuilder::new()
            .scheduler(args.scheduler.or(file.scheduler).unwrap_or(DEFAULT_SCHEDULER));
        if let Some(seed) = args.seed.or(file.seed) {
            builder = builder.seed(seed);
        }

        let (steps, until) = match (args.steps, args.until) {
            (None, None) => match (file.steps, file.until) {
                (None, None) => (Some(DEFAULT_STEPS), None),
                limits => limits,
            },
            cli => cli,
        };
        if let Some(steps) = steps {
            builder = builder.steps(steps);
        }
        if let Some(until) = until {
            builder = builder.until(until);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Builds a network with every species and reaction of the file registered.
    pub fn build_network(&self, config: &NetworkConfig) -> Result<ReactionNetwork> {
        if self.reactions.is_empty() {
            return Err(CliError::Config(
                "The network file defines no `[[reactions]]`.".to_string(),
            ));
        }

        let mut network = ReactionNetwork::new(config);
        let mut ids = HashMap::with_capacity(self.species.len());

        for species in &self.species {
            if ids.contains_key(species.name.as_str()) {
                return Err(CliError::Config(format!(
                    "Species '{}' is defined more than once.",
                    species.name
                )));
            }
            let id = match species.upper_limit {
                Some(limit) => network.add_species_with_limit(&species.name, species.copy_number, limit),
                None => network.add_species(&species.name, species.copy_number),
            };
            ids.insert(species.name.as_str(), id);
        }

        for (index, entry) in self.reactions.iter().enumerate() {
            let resolve = |names: &[String]| -> Result<Vec<_>> {
                names
                    .iter()
                    .map(|name| {
                        ids.get(name.as_str()).copied().ok_or_else(|| {
                            CliError::Config(format!(
                                "Reaction #{} refers to undefined species '{}'.",
                                index + 1,
                                name
                            ))
                        })
                    })
                    .collect()
            };
            let reactants = resolve(&entry.reactants)?;
            let products = resolve(&entry.products)?;

            let mut reaction = Reaction::new(&reactants, &products, entry.rate)
                .map_err(|e| CliError::Config(format!("Reaction #{}: {}", index + 1, e)))?;
            if let Some(label) = &entry.label {
                reaction = reaction.with_label(label.clone());
            }
            let id = network.add_reaction(reaction)?;
            if entry.disabled {
                network.passivate(id)?;
            }
        }

        debug!(
            species = self.species.len(),
            reactions = self.reactions.len(),
            "Network built from file"
        );
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemsim::engine::config::RunLimit;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const NETWORK: &str = r#"
[simulation]
scheduler = "direct"
seed = 3
until = 2.5

[[species]]
name = "A"
copy-number = 10

[[species]]
name = "B"
upper-limit = 4

[[reactions]]
reactants = ["A", "A"]
products = ["B"]
rate = 0.5
label = "dimerize"

[[reactions]]
reactants = ["B"]
rate = 1.0
disabled = true
"#;

    fn write_config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn run_args(config: PathBuf) -> RunArgs {
        RunArgs {
            config,
            scheduler: None,
            seed: None,
            steps: None,
            until: None,
            print_events: false,
        }
    }

    #[test]
    fn file_values_are_used_without_overrides() {
        let file = write_config_file(NETWORK);
        let network_file = NetworkFile::from_file(file.path()).unwrap();

        let config = network_file.merge_with_cli(&run_args(file.path().to_path_buf())).unwrap();

        assert_eq!(config.network.scheduler, SchedulerKind::Direct);
        assert_eq!(config.network.seed, Some(3));
        assert_eq!(config.limit, RunLimit::Until(2.5));
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let file = write_config_file(NETWORK);
        let network_file = NetworkFile::from_file(file.path()).unwrap();
        let mut args = run_args(file.path().to_path_buf());
        args.scheduler = Some(SchedulerKind::NextReaction);
        args.seed = Some(99);
        args.steps = Some(20);

        let config = network_file.merge_with_cli(&args).unwrap();

        assert_eq!(config.network.scheduler, SchedulerKind::NextReaction);
        assert_eq!(config.network.seed, Some(99));
        assert_eq!(config.limit, RunLimit::Steps(20));
    }

    #[test]
    fn defaults_apply_when_simulation_table_is_missing() {
        let network_file: NetworkFile = toml::from_str(
            r#"
[[species]]
name = "X"
copy-number = 1

[[reactions]]
reactants = ["X"]
rate = 1.0
"#,
        )
        .unwrap();

        let config = network_file.merge_with_cli(&run_args(PathBuf::from("unused.toml"))).unwrap();

        assert_eq!(config.network.scheduler, DEFAULT_SCHEDULER);
        assert_eq!(config.network.seed, None);
        assert_eq!(config.limit, RunLimit::Steps(DEFAULT_STEPS));
    }

    #[test]
    fn conflicting_file_limits_are_a_config_error() {
        let network_file: NetworkFile = toml::from_str(
            r#"
[simulation]
steps = 10
until = 1.0
"#,
        )
        .unwrap();

        let result = network_file.merge_with_cli(&run_args(PathBuf::from("unused.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn build_network_registers_species_and_reactions() {
        let network_file: NetworkFile = toml::from_str(NETWORK).unwrap();

        let network = network_file.build_network(&NetworkConfig::default()).unwrap();

        let a = network.find_species("A").unwrap();
        let b = network.find_species("B").unwrap();
        assert_eq!(network.copy_number(a).unwrap(), 10);
        assert_eq!(network.system().species(b).unwrap().upper_limit(), Some(4));

        let reactions: Vec<_> = network.reactions().collect();
        assert_eq!(reactions.len(), 2);
        assert_eq!(reactions[0].1.label(), Some("dimerize"));
        assert_eq!(reactions[0].1.num_reactants(), 2);
        assert!(reactions[1].1.is_disabled());
    }

    #[test]
    fn undefined_species_is_reported() {
        let network_file: NetworkFile = toml::from_str(
            r#"
[[species]]
name = "A"

[[reactions]]
reactants = ["A"]
products = ["Z"]
rate = 1.0
"#,
        )
        .unwrap();

        let result = network_file.build_network(&NetworkConfig::default());
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("'Z'")),
            other => panic!("expected a config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn duplicate_species_and_invalid_rates_are_rejected() {
        let duplicate: NetworkFile = toml::from_str(
            r#"
[[species]]
name = "A"

[[species]]
name = "A"

[[reactions]]
reactants = ["A"]
rate = 1.0
"#,
        )
        .unwrap();
        assert!(matches!(
            duplicate.build_network(&NetworkConfig::default()),
            Err(CliError::Config(_))
        ));

        let negative: NetworkFile = toml::from_str(
            r#"
[[species]]
name = "A"

[[reactions]]
reactants = ["A"]
rate = -1.0
"#,
        )
        .unwrap();
        assert!(matches!(
            negative.build_network(&NetworkConfig::default()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let file = write_config_file("[simulation]\nmethod = \"direct\"\n");
        let result = NetworkFile::from_file(file.path());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
