use clap::{value_parser, Arg, Command, ValueHint};
use rayon::ThreadPoolBuilder;
use strata_cli::input::Input;
use strata_cli::Runner;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("STRATA_LOG", "error,strata=info"))
        .init();

    let matches = Command::new("strata")
        .version(clap::crate_version!())
        .about("Tier-aware target/decoy FDR control for mass spectrometry identifications")
        .arg(
            Arg::new("parameters")
                .required(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to configuration parameters (JSON file)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("pep_dir")
                .short('p')
                .long("pep")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Directory containing the peptide identification files to process. \
                     Overrides the directory listed in the configuration file.",
                )
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("prot_path")
                .long("prot")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path to the protein group file accompanying the peptide identifications. \
                     Overrides the path specified in the configuration file.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_path")
                .short('o')
                .long("output")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Destination path for the merged, FDR-annotated identification file. \
                     Overrides the path specified in the configuration file.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("database")
                .short('f')
                .long("fasta")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path to the FASTA database used in the search. Required when tiered \
                     FDR is enabled. Overrides the database specified in the configuration file.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("tiered-fdr")
                .long("tiered-fdr")
                .action(clap::ArgAction::SetTrue)
                .help(
                    "Compute FDRs separately for each database tier indicated by the \
                     PE= annotation in the FASTA headers",
                ),
        )
        .arg(
            Arg::new("no-protein-group-fdr")
                .long("no-protein-group-fdr")
                .action(clap::ArgAction::SetTrue)
                .help("Skip protein-group-level FDR computation"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_parser(value_parser!(u16).range(1..))
                .help("Number of worker threads (default = # of CPUs)")
                .value_hint(ValueHint::Other),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    let threads = matches
        .get_one::<u16>("threads")
        .copied()
        .unwrap_or_else(|| num_cpus::get() as u16) as usize;
    ThreadPoolBuilder::new().num_threads(threads).build_global()?;

    let input = Input::from_arguments(matches)?;
    let runner = input.build().and_then(Runner::new)?;
    runner.run()?;

    Ok(())
}
