//! `tessera light` — Build a light DID from a seed phrase.

use clap::Args;
use tessera_crypto::{derive_key_set, SeedPhrase};
use tessera_identity::{LightDocumentBuilder, NewKey, ServiceEndpoint};

#[derive(Args, Debug)]
pub struct LightArgs {
    /// The seed phrase, quoted.
    pub phrase: String,

    /// Leave the key-agreement key out of the identifier.
    #[arg(long)]
    pub no_key_agreement: bool,

    /// Service endpoint as `ID,TYPE,URL`. Repeatable.
    #[arg(long = "service", value_parser = parse_service)]
    pub services: Vec<ServiceEndpoint>,

    /// Print only the identifier.
    #[arg(long)]
    pub uri_only: bool,
}

fn parse_service(value: &str) -> Result<ServiceEndpoint, String> {
    let parts: Vec<&str> = value.splitn(3, ',').collect();
    match parts.as_slice() {
        [id, service_type, url] => ServiceEndpoint::new(
            id.trim(),
            vec![service_type.trim().to_string()],
            vec![url.trim().to_string()],
        )
        .map_err(|e| e.to_string()),
        _ => Err(format!("expected ID,TYPE,URL, got '{}'", value)),
    }
}

pub fn run(args: &LightArgs) -> anyhow::Result<()> {
    let seed = SeedPhrase::parse(args.phrase.trim())?;
    let keys = derive_key_set(&seed)?;
    let key_agreement = (!args.no_key_agreement).then(|| NewKey::from(&keys.key_agreement));

    let document = LightDocumentBuilder::build(
        Some(NewKey::from(&keys.authentication)),
        key_agreement,
        args.services.clone(),
    )?;

    if args.uri_only {
        println!("{}", document.identifier());
    } else {
        println!("{}", serde_json::to_string_pretty(&document.to_json()?)?);
    }
    Ok(())
}
