//! `tessera mnemonic` — Generate a new seed phrase.

use clap::Args;
use tessera_crypto::SeedPhrase;

#[derive(Args, Debug)]
pub struct MnemonicArgs {
    /// Number of words (12, 15, 18, 21 or 24).
    #[arg(short, long, default_value_t = 12)]
    pub words: usize,
}

pub fn run(args: &MnemonicArgs) -> anyhow::Result<()> {
    let seed = SeedPhrase::generate(args.words)?;
    println!("{}", seed.phrase());
    eprintln!();
    eprintln!("Store this phrase offline. Anyone holding it controls every derived key.");
    Ok(())
}
