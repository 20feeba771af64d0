use super::*;

use asinpix_core::InputError;

use crate::download::resolve_storefronts;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["asinpix"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_storefronts_command() {
    let cli = Cli::try_parse_from(["asinpix", "storefronts"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Storefronts)));
}

#[test]
fn parses_download_with_repeated_storefronts() {
    let cli = Cli::try_parse_from([
        "asinpix",
        "download",
        "--input",
        "asins.txt",
        "--output",
        "out",
        "--storefront",
        "com",
        "-s",
        "co.uk",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Download {
            input,
            output,
            storefronts,
            all_storefronts,
            concurrency,
            extractor,
            json,
        }) => {
            assert_eq!(input, PathBuf::from("asins.txt"));
            assert_eq!(output, PathBuf::from("out"));
            assert_eq!(storefronts, vec!["com", "co.uk"]);
            assert!(!all_storefronts);
            assert_eq!(concurrency, None);
            assert_eq!(extractor, ExtractorKind::Regex);
            assert!(!json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_download_options() {
    let cli = Cli::try_parse_from([
        "asinpix",
        "download",
        "-i",
        "asins.txt",
        "-o",
        "out",
        "--all-storefronts",
        "--concurrency",
        "5",
        "--extractor",
        "json",
        "--json",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Download {
            all_storefronts: true,
            concurrency: Some(5),
            extractor: ExtractorKind::Json,
            json: true,
            ..
        })
    ));
}

#[test]
fn download_requires_input_and_output() {
    assert!(Cli::try_parse_from(["asinpix", "download", "--output", "out"]).is_err());
    assert!(Cli::try_parse_from(["asinpix", "download", "--input", "asins.txt"]).is_err());
}

#[test]
fn zero_concurrency_is_rejected() {
    let result = Cli::try_parse_from([
        "asinpix",
        "download",
        "-i",
        "asins.txt",
        "-o",
        "out",
        "-s",
        "com",
        "--concurrency",
        "0",
    ]);
    assert!(result.is_err());
}

#[test]
fn all_storefronts_conflicts_with_explicit_selection() {
    let result = Cli::try_parse_from([
        "asinpix",
        "download",
        "-i",
        "asins.txt",
        "-o",
        "out",
        "-s",
        "com",
        "--all-storefronts",
    ]);
    assert!(result.is_err());
}

#[test]
fn resolve_all_storefronts_returns_catalog() {
    let all = resolve_storefronts(&[], true).unwrap();
    assert_eq!(all.len(), asinpix_core::CATALOG.len());
}

#[test]
fn resolve_without_selection_is_an_input_error() {
    let result = resolve_storefronts(&[], false);
    assert!(matches!(result, Err(InputError::NoStorefronts)));
}

#[test]
fn resolve_rejects_unknown_storefront() {
    let result = resolve_storefronts(&["com".to_string(), "moon".to_string()], false);
    assert!(matches!(result, Err(InputError::UnknownStorefront(ref k)) if k == "moon"));
}
